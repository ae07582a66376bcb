//! Investment use-cases: admitted creation and ownership-scoped reads.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::domain::ports::{
    CreateInvestmentError, InvestmentPersistenceError, InvestmentRepository,
};
use crate::domain::{Error, InvestmentDraft, InvestmentWithListing, UserId};

/// Investment service over the investment repository port.
#[derive(Clone)]
pub struct InvestmentService {
    investments: Arc<dyn InvestmentRepository>,
}

fn map_persistence_error(error: InvestmentPersistenceError) -> Error {
    match error {
        InvestmentPersistenceError::Connection { message } => Error::service_unavailable(message),
        InvestmentPersistenceError::Query { message } => Error::internal(message),
    }
}

fn map_create_error(error: CreateInvestmentError) -> Error {
    match error {
        CreateInvestmentError::ListingNotFound => Error::invalid_request("Listing not found.")
            .with_details(json!({ "field": "listing", "code": "not_found" })),
        CreateInvestmentError::Rejected(admission) => {
            Error::invalid_request(admission.to_string())
                .with_details(json!({ "code": admission.code() }))
        }
        CreateInvestmentError::Persistence(persistence) => map_persistence_error(persistence),
    }
}

fn not_found() -> Error {
    Error::not_found("Investment not found.")
}

impl InvestmentService {
    /// Create the service over a repository port.
    pub fn new(investments: Arc<dyn InvestmentRepository>) -> Self {
        Self { investments }
    }

    /// Commit `amount` against a listing on behalf of `investor`.
    ///
    /// Admission (lifecycle, positivity, floor, capacity) runs inside the
    /// repository's atomic unit, so concurrent commitments can reach the
    /// target but never exceed it.
    pub async fn create(
        &self,
        investor: UserId,
        listing_id: Uuid,
        amount: Decimal,
    ) -> Result<InvestmentWithListing, Error> {
        let draft = InvestmentDraft {
            investor_id: investor,
            listing_id,
            amount: crate::domain::money2(amount),
        };
        self.investments
            .create_admitted(draft)
            .await
            .map_err(map_create_error)
    }

    /// The investor's own commitments, newest-first.
    pub async fn list(&self, investor: &UserId) -> Result<Vec<InvestmentWithListing>, Error> {
        self.investments
            .list_for_investor(investor)
            .await
            .map_err(map_persistence_error)
    }

    /// One owned commitment; other users see a 404, never a 403.
    pub async fn get(&self, investor: &UserId, id: &Uuid) -> Result<InvestmentWithListing, Error> {
        self.investments
            .find_for_investor(id, investor)
            .await
            .map_err(map_persistence_error)?
            .ok_or_else(not_found)
    }

    /// Withdraw an owned commitment.
    pub async fn delete(&self, investor: &UserId, id: &Uuid) -> Result<(), Error> {
        let existed = self
            .investments
            .delete_for_investor(id, investor)
            .await
            .map_err(map_persistence_error)?;
        if !existed {
            return Err(not_found());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdmissionError, ErrorCode};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    struct RefusingRepository(CreateInvestmentError);

    #[async_trait]
    impl InvestmentRepository for RefusingRepository {
        async fn create_admitted(
            &self,
            _draft: InvestmentDraft,
        ) -> Result<InvestmentWithListing, CreateInvestmentError> {
            Err(self.0.clone())
        }

        async fn list_for_investor(
            &self,
            _investor: &UserId,
        ) -> Result<Vec<InvestmentWithListing>, InvestmentPersistenceError> {
            Ok(Vec::new())
        }

        async fn find_for_investor(
            &self,
            _id: &Uuid,
            _investor: &UserId,
        ) -> Result<Option<InvestmentWithListing>, InvestmentPersistenceError> {
            Ok(None)
        }

        async fn delete_for_investor(
            &self,
            _id: &Uuid,
            _investor: &UserId,
        ) -> Result<bool, InvestmentPersistenceError> {
            Ok(false)
        }
    }

    fn service(error: CreateInvestmentError) -> InvestmentService {
        InvestmentService::new(Arc::new(RefusingRepository(error)))
    }

    async fn create_error(error: CreateInvestmentError) -> Error {
        service(error)
            .create(UserId::random(), Uuid::new_v4(), dec!(100))
            .await
            .expect_err("refused")
    }

    #[tokio::test]
    async fn admission_refusals_surface_their_message() {
        let err = create_error(CreateInvestmentError::Rejected(
            AdmissionError::ExceedsRemaining { remaining: dec!(100) },
        ))
        .await;
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.message(), "Only 100 remaining in this offering.");
        assert_eq!(
            err.details().and_then(|d| d["code"].as_str()),
            Some("exceeds_remaining")
        );
    }

    #[tokio::test]
    async fn unknown_listing_is_a_field_error() {
        let err = create_error(CreateInvestmentError::ListingNotFound).await;
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            err.details().and_then(|d| d["field"].as_str()),
            Some("listing")
        );
    }

    #[tokio::test]
    async fn persistence_failures_keep_their_category() {
        let err = create_error(CreateInvestmentError::Persistence(
            InvestmentPersistenceError::connection("pool exhausted"),
        ))
        .await;
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }

    #[tokio::test]
    async fn missing_commitments_are_not_found() {
        let svc = service(CreateInvestmentError::ListingNotFound);
        let investor = UserId::random();
        let id = Uuid::new_v4();
        assert_eq!(
            svc.get(&investor, &id).await.expect_err("missing").code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            svc.delete(&investor, &id)
                .await
                .expect_err("missing")
                .code(),
            ErrorCode::NotFound
        );
    }
}
