//! Listing use-cases: creation, reads, the edit-lock rule, and deletion.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::domain::auth::can_modify_listing;
use crate::domain::ports::{ListingPersistenceError, ListingRepository};
use crate::domain::{
    edit_permitted, Error, ListingDraft, ListingFilter, ListingPatch, ListingStatus,
    ListingValidationError, ListingWithSeller, UserId,
};

/// Listing service over the listing repository port.
#[derive(Clone)]
pub struct ListingService {
    listings: Arc<dyn ListingRepository>,
}

fn map_persistence_error(error: ListingPersistenceError) -> Error {
    match error {
        ListingPersistenceError::Connection { message } => Error::service_unavailable(message),
        ListingPersistenceError::Query { message } => Error::internal(message),
    }
}

fn map_validation_error(error: &ListingValidationError) -> Error {
    let field = match error {
        ListingValidationError::EmptyTitle => "title",
        ListingValidationError::EmptyDescription => "description",
        ListingValidationError::NonPositiveAssetValue => "assetValue",
        ListingValidationError::RetainOutOfRange => "sellerRetainPercent",
        ListingValidationError::NonPositiveMinInvestment => "minInvestment",
    };
    Error::invalid_request(error.to_string()).with_details(json!({ "field": field }))
}

fn not_found() -> Error {
    Error::not_found("Listing not found.")
}

fn not_seller() -> Error {
    Error::forbidden("Only the seller may modify this listing.")
}

impl ListingService {
    /// Create the service over a repository port.
    pub fn new(listings: Arc<dyn ListingRepository>) -> Self {
        Self { listings }
    }

    /// Validate and persist a new listing for `seller`, returning the read
    /// model.
    pub async fn create(
        &self,
        seller: UserId,
        mut draft: ListingDraft,
    ) -> Result<ListingWithSeller, Error> {
        // The seller always comes from the session, never the payload.
        draft.seller_id = seller;
        let listing = draft
            .into_listing(Utc::now())
            .map_err(|err| map_validation_error(&err))?;
        let id = listing.id;
        self.listings
            .insert(&listing)
            .await
            .map_err(map_persistence_error)?;
        self.reload(&id).await
    }

    /// Listings newest-first, narrowed by the typed filter.
    pub async fn list(&self, filter: &ListingFilter) -> Result<Vec<ListingWithSeller>, Error> {
        self.listings
            .list(filter)
            .await
            .map_err(map_persistence_error)
    }

    /// Public read of one listing.
    pub async fn get(&self, id: &Uuid) -> Result<ListingWithSeller, Error> {
        self.listings
            .find_by_id(id)
            .await
            .map_err(map_persistence_error)?
            .ok_or_else(not_found)
    }

    /// Apply a patch under the seller-only and edit-lock rules.
    ///
    /// A status-only patch is a lifecycle transition and is allowed from any
    /// state; touching anything else requires the listing to still be a
    /// draft.
    pub async fn update(
        &self,
        actor: &UserId,
        id: &Uuid,
        patch: ListingPatch,
    ) -> Result<ListingWithSeller, Error> {
        let current = self.get(id).await?;
        let mut listing = current.listing;
        if !can_modify_listing(actor, &listing) {
            return Err(not_seller());
        }
        if !edit_permitted(listing.status, &patch) {
            return Err(Error::forbidden("Only draft listings can be edited."));
        }
        patch
            .apply(&mut listing, Utc::now())
            .map_err(|err| map_validation_error(&err))?;
        self.listings
            .update(&listing)
            .await
            .map_err(map_persistence_error)?;
        self.reload(id).await
    }

    /// Delete a draft listing owned by `actor`.
    pub async fn delete(&self, actor: &UserId, id: &Uuid) -> Result<(), Error> {
        let current = self.get(id).await?;
        if !can_modify_listing(actor, &current.listing) {
            return Err(not_seller());
        }
        if current.listing.status != ListingStatus::Draft {
            return Err(Error::forbidden("Only draft listings can be deleted."));
        }
        let existed = self
            .listings
            .delete(id)
            .await
            .map_err(map_persistence_error)?;
        if !existed {
            return Err(not_found());
        }
        Ok(())
    }

    async fn reload(&self, id: &Uuid) -> Result<ListingWithSeller, Error> {
        self.listings
            .find_by_id(id)
            .await
            .map_err(map_persistence_error)?
            .ok_or_else(|| Error::internal("listing vanished during write"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, Listing};
    use async_trait::async_trait;
    use rstest::rstest;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubListingRepository {
        rows: Mutex<Vec<Listing>>,
    }

    impl StubListingRepository {
        fn with(listing: Listing) -> Arc<Self> {
            Arc::new(Self {
                rows: Mutex::new(vec![listing]),
            })
        }
    }

    #[async_trait]
    impl ListingRepository for StubListingRepository {
        async fn insert(&self, listing: &Listing) -> Result<(), ListingPersistenceError> {
            self.rows.lock().expect("lock").push(listing.clone());
            Ok(())
        }

        async fn find_by_id(
            &self,
            id: &Uuid,
        ) -> Result<Option<ListingWithSeller>, ListingPersistenceError> {
            Ok(self
                .rows
                .lock()
                .expect("lock")
                .iter()
                .find(|listing| listing.id == *id)
                .map(|listing| ListingWithSeller {
                    listing: listing.clone(),
                    seller_name: Some("Stub Seller".to_owned()),
                    seller_email: "seller@example.com".to_owned(),
                    total_invested: Decimal::ZERO,
                }))
        }

        async fn list(
            &self,
            filter: &ListingFilter,
        ) -> Result<Vec<ListingWithSeller>, ListingPersistenceError> {
            let rows = self.rows.lock().expect("lock");
            Ok(rows
                .iter()
                .filter(|listing| {
                    filter.status.is_none_or(|status| listing.status == status)
                        && filter.seller.is_none_or(|seller| listing.seller_id == seller)
                })
                .map(|listing| ListingWithSeller {
                    listing: listing.clone(),
                    seller_name: None,
                    seller_email: "seller@example.com".to_owned(),
                    total_invested: Decimal::ZERO,
                })
                .collect())
        }

        async fn update(&self, listing: &Listing) -> Result<(), ListingPersistenceError> {
            let mut rows = self.rows.lock().expect("lock");
            if let Some(slot) = rows.iter_mut().find(|row| row.id == listing.id) {
                *slot = listing.clone();
            }
            Ok(())
        }

        async fn delete(&self, id: &Uuid) -> Result<bool, ListingPersistenceError> {
            let mut rows = self.rows.lock().expect("lock");
            let before = rows.len();
            rows.retain(|listing| listing.id != *id);
            Ok(rows.len() < before)
        }
    }

    fn draft(seller: UserId, status: ListingStatus) -> ListingDraft {
        ListingDraft {
            seller_id: seller,
            title: "Canal house".to_owned(),
            description: "Three floors, needs a roof".to_owned(),
            category: None,
            asset_value: dec!(200000),
            seller_retain_percent: dec!(25),
            min_investment: None,
            status: Some(status),
        }
    }

    fn seeded(status: ListingStatus) -> (UserId, Uuid, ListingService) {
        let seller = UserId::random();
        let listing = draft(seller, status)
            .into_listing(Utc::now())
            .expect("valid draft");
        let id = listing.id;
        let service = ListingService::new(StubListingRepository::with(listing));
        (seller, id, service)
    }

    fn status_patch(status: ListingStatus) -> ListingPatch {
        ListingPatch {
            status: Some(status),
            ..ListingPatch::default()
        }
    }

    fn title_patch() -> ListingPatch {
        ListingPatch {
            title: Some("Renamed".to_owned()),
            ..ListingPatch::default()
        }
    }

    #[tokio::test]
    async fn create_derives_target_and_forces_seller() {
        let seller = UserId::random();
        let service = ListingService::new(Arc::new(StubListingRepository::default()));
        let mut input = draft(UserId::random(), ListingStatus::Draft);
        input.seller_id = UserId::random();
        let created = service.create(seller, input).await.expect("created");
        assert_eq!(created.listing.seller_id, seller);
        assert_eq!(created.listing.target_amount, dec!(150000.00));
    }

    #[rstest]
    #[case(ListingStatus::Live)]
    #[case(ListingStatus::Funded)]
    #[case(ListingStatus::Cancelled)]
    #[tokio::test]
    async fn status_only_update_is_allowed_from_any_state(#[case] status: ListingStatus) {
        let (seller, id, service) = seeded(status);
        let updated = service
            .update(&seller, &id, status_patch(ListingStatus::Live))
            .await
            .expect("status transition allowed");
        assert_eq!(updated.listing.status, ListingStatus::Live);
    }

    #[tokio::test]
    async fn non_status_update_requires_draft() {
        let (seller, id, service) = seeded(ListingStatus::Live);
        let err = service
            .update(&seller, &id, title_patch())
            .await
            .expect_err("edit-locked");
        assert_eq!(err.code(), ErrorCode::Forbidden);
        assert_eq!(err.message(), "Only draft listings can be edited.");
    }

    #[tokio::test]
    async fn draft_accepts_mixed_updates() {
        let (seller, id, service) = seeded(ListingStatus::Draft);
        let patch = ListingPatch {
            title: Some("Renamed".to_owned()),
            status: Some(ListingStatus::Live),
            ..ListingPatch::default()
        };
        let updated = service.update(&seller, &id, patch).await.expect("allowed");
        assert_eq!(updated.listing.title, "Renamed");
        assert_eq!(updated.listing.status, ListingStatus::Live);
    }

    #[tokio::test]
    async fn non_seller_updates_are_forbidden() {
        let (_, id, service) = seeded(ListingStatus::Draft);
        let err = service
            .update(&UserId::random(), &id, status_patch(ListingStatus::Live))
            .await
            .expect_err("not the seller");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn delete_requires_draft_status() {
        let (seller, id, service) = seeded(ListingStatus::Live);
        let err = service.delete(&seller, &id).await.expect_err("locked");
        assert_eq!(err.code(), ErrorCode::Forbidden);

        let (seller, id, service) = seeded(ListingStatus::Draft);
        service.delete(&seller, &id).await.expect("draft deletable");
        let err = service.get(&id).await.expect_err("gone");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn unknown_listing_is_not_found() {
        let (_, _, service) = seeded(ListingStatus::Draft);
        let err = service.get(&Uuid::new_v4()).await.expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn list_applies_typed_filter() {
        let seller = UserId::random();
        let repo = Arc::new(StubListingRepository::default());
        let service = ListingService::new(repo);
        service
            .create(seller, draft(seller, ListingStatus::Live))
            .await
            .expect("created");
        service
            .create(seller, draft(seller, ListingStatus::Draft))
            .await
            .expect("created");

        let live = service
            .list(&ListingFilter {
                status: Some(ListingStatus::Live),
                seller: None,
            })
            .await
            .expect("listed");
        assert_eq!(live.len(), 1);

        let mine = service
            .list(&ListingFilter {
                status: None,
                seller: Some(seller),
            })
            .await
            .expect("listed");
        assert_eq!(mine.len(), 2);
    }
}
