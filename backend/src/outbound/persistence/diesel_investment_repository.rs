//! PostgreSQL-backed `InvestmentRepository` implementation using Diesel.
//!
//! Creation fulfils the port's admission contract with a `SELECT ... FOR
//! UPDATE` on the listing row inside one transaction: the capacity read, the
//! admission decision, and the insert all happen under the lock, so two
//! commitments that each fit the remaining capacity can never land together
//! and overshoot the target.

use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::sum;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::ports::{
    CreateInvestmentError, InvestmentPersistenceError, InvestmentRepository,
};
use crate::domain::{admit, Investment, InvestmentDraft, InvestmentWithListing, UserId};

use super::diesel_helpers::{diesel_error_message, is_connection_error, pool_error_message};
use super::diesel_listing_repository::row_to_listing;
use super::models::{InvestmentRow, ListingRow, NewInvestmentRow};
use super::pool::{DbPool, PoolError};
use super::schema::{investments, listings};

/// Diesel-backed implementation of the `InvestmentRepository` port.
#[derive(Clone)]
pub struct DieselInvestmentRepository {
    pool: DbPool,
}

impl DieselInvestmentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> InvestmentPersistenceError {
    InvestmentPersistenceError::connection(pool_error_message(error))
}

fn map_diesel_error(
    error: &diesel::result::Error,
    operation: &str,
) -> InvestmentPersistenceError {
    let message = diesel_error_message(error, operation);
    if is_connection_error(error) {
        InvestmentPersistenceError::connection(message)
    } else {
        InvestmentPersistenceError::query(message)
    }
}

fn row_to_investment(row: InvestmentRow) -> Investment {
    Investment {
        id: row.id,
        investor_id: UserId::from_uuid(row.investor_id),
        listing_id: row.listing_id,
        amount: row.amount,
        created_at: row.created_at,
    }
}

type JoinedRow = (InvestmentRow, String, Decimal, Decimal);

fn join_row(row: JoinedRow) -> InvestmentWithListing {
    let (investment_row, listing_title, listing_asset_value, listing_target_amount) = row;
    InvestmentWithListing {
        investment: row_to_investment(investment_row),
        listing_title,
        listing_asset_value,
        listing_target_amount,
    }
}

/// Transaction-internal failure carrier separating business aborts from
/// database errors, so `?` keeps working on Diesel calls inside the closure.
enum TxError {
    Abort(Box<CreateInvestmentError>),
    Db(diesel::result::Error),
}

impl From<diesel::result::Error> for TxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Db(error)
    }
}

fn abort(error: CreateInvestmentError) -> TxError {
    TxError::Abort(Box::new(error))
}

#[async_trait]
impl InvestmentRepository for DieselInvestmentRepository {
    async fn create_admitted(
        &self,
        draft: InvestmentDraft,
    ) -> Result<InvestmentWithListing, CreateInvestmentError> {
        let mut conn = self.pool.get().await.map_err(|err| {
            CreateInvestmentError::Persistence(map_pool_error(err))
        })?;

        let result = conn
            .transaction::<InvestmentWithListing, TxError, _>(|conn| {
                async move {
                    // Lock the listing row for the duration of the check and
                    // insert; concurrent admissions serialize here.
                    let listing_row: Option<ListingRow> = listings::table
                        .find(draft.listing_id)
                        .for_update()
                        .select(ListingRow::as_select())
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(listing_row) = listing_row else {
                        return Err(abort(CreateInvestmentError::ListingNotFound));
                    };
                    let listing = row_to_listing(listing_row).map_err(|message| {
                        abort(CreateInvestmentError::Persistence(
                            InvestmentPersistenceError::query(message),
                        ))
                    })?;

                    let already: Option<Decimal> = investments::table
                        .filter(investments::listing_id.eq(draft.listing_id))
                        .select(sum(investments::amount))
                        .first(conn)
                        .await?;
                    let already = already.unwrap_or(Decimal::ZERO);

                    admit(&listing, already, draft.amount)
                        .map_err(|refusal| abort(CreateInvestmentError::Rejected(refusal)))?;

                    let investment = draft.into_investment(Utc::now());
                    let row = NewInvestmentRow {
                        id: investment.id,
                        investor_id: *investment.investor_id.as_uuid(),
                        listing_id: investment.listing_id,
                        amount: investment.amount,
                        created_at: investment.created_at,
                    };
                    diesel::insert_into(investments::table)
                        .values(&row)
                        .execute(conn)
                        .await?;

                    Ok(InvestmentWithListing {
                        investment,
                        listing_title: listing.title,
                        listing_asset_value: listing.asset_value,
                        listing_target_amount: listing.target_amount,
                    })
                }
                .scope_boxed()
            })
            .await;

        result.map_err(|err| match err {
            TxError::Abort(inner) => *inner,
            TxError::Db(db) => CreateInvestmentError::Persistence(map_diesel_error(
                &db,
                "create investment",
            )),
        })
    }

    async fn list_for_investor(
        &self,
        investor: &UserId,
    ) -> Result<Vec<InvestmentWithListing>, InvestmentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<JoinedRow> = investments::table
            .inner_join(listings::table)
            .filter(investments::investor_id.eq(*investor.as_uuid()))
            .order_by(investments::created_at.desc())
            .select((
                InvestmentRow::as_select(),
                listings::title,
                listings::asset_value,
                listings::target_amount,
            ))
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err, "list investments"))?;
        Ok(rows.into_iter().map(join_row).collect())
    }

    async fn find_for_investor(
        &self,
        id: &Uuid,
        investor: &UserId,
    ) -> Result<Option<InvestmentWithListing>, InvestmentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<JoinedRow> = investments::table
            .inner_join(listings::table)
            .filter(investments::id.eq(*id))
            .filter(investments::investor_id.eq(*investor.as_uuid()))
            .select((
                InvestmentRow::as_select(),
                listings::title,
                listings::asset_value,
                listings::target_amount,
            ))
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(&err, "find investment"))?;
        Ok(row.map(join_row))
    }

    async fn delete_for_investor(
        &self,
        id: &Uuid,
        investor: &UserId,
    ) -> Result<bool, InvestmentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            investments::table
                .filter(investments::id.eq(*id))
                .filter(investments::investor_id.eq(*investor.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(|err| map_diesel_error(&err, "delete investment"))?;
        Ok(deleted > 0)
    }
}
