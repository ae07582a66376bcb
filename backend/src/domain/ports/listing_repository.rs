//! Port abstraction for listing persistence adapters.
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Listing, ListingFilter, ListingWithSeller};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by listing repository adapters.
    pub enum ListingPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "listing repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "listing repository query failed: {message}",
    }
}

#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Persist a freshly created listing.
    async fn insert(&self, listing: &Listing) -> Result<(), ListingPersistenceError>;

    /// Fetch one listing with seller identity and invested total.
    async fn find_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<ListingWithSeller>, ListingPersistenceError>;

    /// List listings newest-first, composing the typed filter onto the query.
    async fn list(
        &self,
        filter: &ListingFilter,
    ) -> Result<Vec<ListingWithSeller>, ListingPersistenceError>;

    /// Rewrite the mutable columns of an existing listing.
    async fn update(&self, listing: &Listing) -> Result<(), ListingPersistenceError>;

    /// Delete a listing. Returns whether a row existed.
    async fn delete(&self, id: &Uuid) -> Result<bool, ListingPersistenceError>;
}
