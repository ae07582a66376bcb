//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and are
//! never exposed to the domain. They exist solely to satisfy Diesel's type
//! requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::schema::{investments, listings, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub name: Option<&'a str>,
    pub password_hash: &'a str,
    pub is_active: bool,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

/// Row struct for reading from the listings table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = listings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ListingRow {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub asset_value: Decimal,
    pub seller_retain_percent: Decimal,
    pub target_amount: Decimal,
    pub min_investment: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new listing records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = listings)]
pub(crate) struct NewListingRow<'a> {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub category: Option<&'a str>,
    pub asset_value: Decimal,
    pub seller_retain_percent: Decimal,
    pub target_amount: Decimal,
    pub min_investment: Decimal,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset struct rewriting the mutable columns of a listing.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = listings)]
pub(crate) struct ListingChangeset<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub category: Option<&'a str>,
    pub asset_value: Decimal,
    pub seller_retain_percent: Decimal,
    pub target_amount: Decimal,
    pub min_investment: Decimal,
    pub status: &'a str,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading from the investments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = investments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct InvestmentRow {
    pub id: Uuid,
    pub investor_id: Uuid,
    pub listing_id: Uuid,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new investment records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = investments)]
pub(crate) struct NewInvestmentRow {
    pub id: Uuid,
    pub investor_id: Uuid,
    pub listing_id: Uuid,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}
