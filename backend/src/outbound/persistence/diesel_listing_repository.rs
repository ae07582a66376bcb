//! PostgreSQL-backed `ListingRepository` implementation using Diesel.
//!
//! Reads join the seller row for identity fields and aggregate the invested
//! total in a follow-up grouped query, keeping the main select simple.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::sum;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::ports::{ListingPersistenceError, ListingRepository};
use crate::domain::{Listing, ListingFilter, ListingWithSeller, UserId};

use super::diesel_helpers::{diesel_error_message, is_connection_error, pool_error_message};
use super::models::{ListingChangeset, ListingRow, NewListingRow};
use super::pool::{DbPool, PoolError};
use super::schema::{investments, listings, users};

/// Diesel-backed implementation of the `ListingRepository` port.
#[derive(Clone)]
pub struct DieselListingRepository {
    pool: DbPool,
}

impl DieselListingRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ListingPersistenceError {
    ListingPersistenceError::connection(pool_error_message(error))
}

fn map_diesel_error(error: &diesel::result::Error, operation: &str) -> ListingPersistenceError {
    let message = diesel_error_message(error, operation);
    if is_connection_error(error) {
        ListingPersistenceError::connection(message)
    } else {
        ListingPersistenceError::query(message)
    }
}

/// Convert a database row to a domain listing.
pub(crate) fn row_to_listing(row: ListingRow) -> Result<Listing, String> {
    let status = row
        .status
        .parse()
        .map_err(|()| format!("unknown listing status in store: {}", row.status))?;
    Ok(Listing {
        id: row.id,
        seller_id: UserId::from_uuid(row.seller_id),
        title: row.title,
        description: row.description,
        category: row.category,
        asset_value: row.asset_value,
        seller_retain_percent: row.seller_retain_percent,
        target_amount: row.target_amount,
        min_investment: row.min_investment,
        status,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

type JoinedRow = (ListingRow, Option<String>, String);

fn assemble(
    row: JoinedRow,
    totals: &HashMap<Uuid, Decimal>,
) -> Result<ListingWithSeller, ListingPersistenceError> {
    let (listing_row, seller_name, seller_email) = row;
    let total_invested = totals
        .get(&listing_row.id)
        .copied()
        .unwrap_or(Decimal::ZERO);
    let listing = row_to_listing(listing_row).map_err(ListingPersistenceError::query)?;
    Ok(ListingWithSeller {
        listing,
        seller_name,
        seller_email,
        total_invested,
    })
}

/// Load invested totals for the given listings in one grouped query.
async fn load_totals(
    conn: &mut AsyncPgConnection,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, Decimal>, diesel::result::Error> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, Option<Decimal>)> = investments::table
        .filter(investments::listing_id.eq_any(ids))
        .group_by(investments::listing_id)
        .select((investments::listing_id, sum(investments::amount)))
        .load(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(id, total)| (id, total.unwrap_or(Decimal::ZERO)))
        .collect())
}

#[async_trait]
impl ListingRepository for DieselListingRepository {
    async fn insert(&self, listing: &Listing) -> Result<(), ListingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewListingRow {
            id: listing.id,
            seller_id: *listing.seller_id.as_uuid(),
            title: listing.title.as_str(),
            description: listing.description.as_str(),
            category: listing.category.as_deref(),
            asset_value: listing.asset_value,
            seller_retain_percent: listing.seller_retain_percent,
            target_amount: listing.target_amount,
            min_investment: listing.min_investment,
            status: listing.status.as_str(),
            created_at: listing.created_at,
            updated_at: listing.updated_at,
        };
        diesel::insert_into(listings::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err, "insert listing"))?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<ListingWithSeller>, ListingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<JoinedRow> = listings::table
            .inner_join(users::table)
            .filter(listings::id.eq(*id))
            .select((ListingRow::as_select(), users::name, users::email))
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(&err, "find listing"))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let totals = load_totals(&mut conn, std::slice::from_ref(id))
            .await
            .map_err(|err| map_diesel_error(&err, "sum investments"))?;
        assemble(row, &totals).map(Some)
    }

    async fn list(
        &self,
        filter: &ListingFilter,
    ) -> Result<Vec<ListingWithSeller>, ListingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // Compose the typed filter onto the boxed query; no stringly-keyed
        // dispatch.
        let mut query = listings::table
            .inner_join(users::table)
            .select((ListingRow::as_select(), users::name, users::email))
            .order_by(listings::created_at.desc())
            .into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(listings::status.eq(status.as_str()));
        }
        if let Some(seller) = filter.seller {
            query = query.filter(listings::seller_id.eq(*seller.as_uuid()));
        }

        let rows: Vec<JoinedRow> = query
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err, "list listings"))?;

        let ids: Vec<Uuid> = rows.iter().map(|(row, _, _)| row.id).collect();
        let totals = load_totals(&mut conn, &ids)
            .await
            .map_err(|err| map_diesel_error(&err, "sum investments"))?;
        rows.into_iter().map(|row| assemble(row, &totals)).collect()
    }

    async fn update(&self, listing: &Listing) -> Result<(), ListingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changeset = ListingChangeset {
            title: listing.title.as_str(),
            description: listing.description.as_str(),
            category: listing.category.as_deref(),
            asset_value: listing.asset_value,
            seller_retain_percent: listing.seller_retain_percent,
            target_amount: listing.target_amount,
            min_investment: listing.min_investment,
            status: listing.status.as_str(),
            updated_at: listing.updated_at,
        };
        diesel::update(listings::table.find(listing.id))
            .set(&changeset)
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err, "update listing"))?;
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, ListingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(listings::table.find(*id))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err, "delete listing"))?;
        Ok(deleted > 0)
    }
}
