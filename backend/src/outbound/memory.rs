//! In-memory adapters for the repository ports.
//!
//! Test doubles that mirror the PostgreSQL adapters' behaviour, including
//! the admission atomicity contract: one store-wide mutex plays the role of
//! the listing row lock, so the concurrency property (reach the target,
//! never overshoot) holds here too and is testable in-process.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::ports::{
    CreateInvestmentError, InvestmentPersistenceError, InvestmentRepository,
    ListingPersistenceError, ListingRepository, UserPersistenceError, UserRepository,
};
use crate::domain::{
    admit, EmailAddress, Investment, InvestmentDraft, InvestmentWithListing, Listing,
    ListingFilter, ListingWithSeller, User, UserId,
};

#[derive(Default)]
struct StoreInner {
    users: Vec<User>,
    listings: Vec<(u64, Listing)>,
    investments: Vec<(u64, Investment)>,
    sequence: u64,
}

impl StoreInner {
    fn next_seq(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    fn total_invested(&self, listing_id: &Uuid) -> Decimal {
        self.investments
            .iter()
            .filter(|(_, investment)| investment.listing_id == *listing_id)
            .map(|(_, investment)| investment.amount)
            .sum()
    }

    fn enrich(&self, listing: &Listing) -> ListingWithSeller {
        let seller = self
            .users
            .iter()
            .find(|user| user.id == listing.seller_id);
        ListingWithSeller {
            listing: listing.clone(),
            seller_name: seller.and_then(|user| user.name.clone()),
            seller_email: seller
                .map(|user| user.email.to_string())
                .unwrap_or_default(),
            total_invested: self.total_invested(&listing.id),
        }
    }

    fn join(&self, investment: &Investment) -> Option<InvestmentWithListing> {
        let listing = self
            .listings
            .iter()
            .find(|(_, listing)| listing.id == investment.listing_id)
            .map(|(_, listing)| listing)?;
        Some(InvestmentWithListing {
            investment: investment.clone(),
            listing_title: listing.title.clone(),
            listing_asset_value: listing.asset_value,
            listing_target_amount: listing.target_amount,
        })
    }
}

/// Shared in-memory store backing the adapter trio.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryStore {
    /// Fresh empty store behind an `Arc` for sharing across adapters.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// In-memory [`UserRepository`].
#[derive(Clone)]
pub struct InMemoryUserRepository(Arc<InMemoryStore>);

impl InMemoryUserRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self(store)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut inner = self.0.lock();
        if inner.users.iter().any(|existing| existing.email == user.email) {
            return Err(UserPersistenceError::duplicate_email());
        }
        inner.users.push(user.clone());
        Ok(())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .0
            .lock()
            .users
            .iter()
            .find(|user| user.email == *email)
            .cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .0
            .lock()
            .users
            .iter()
            .find(|user| user.id == *id)
            .cloned())
    }
}

/// In-memory [`ListingRepository`].
#[derive(Clone)]
pub struct InMemoryListingRepository(Arc<InMemoryStore>);

impl InMemoryListingRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self(store)
    }
}

#[async_trait]
impl ListingRepository for InMemoryListingRepository {
    async fn insert(&self, listing: &Listing) -> Result<(), ListingPersistenceError> {
        let mut inner = self.0.lock();
        let seq = inner.next_seq();
        inner.listings.push((seq, listing.clone()));
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<ListingWithSeller>, ListingPersistenceError> {
        let inner = self.0.lock();
        Ok(inner
            .listings
            .iter()
            .find(|(_, listing)| listing.id == *id)
            .map(|(_, listing)| inner.enrich(listing)))
    }

    async fn list(
        &self,
        filter: &ListingFilter,
    ) -> Result<Vec<ListingWithSeller>, ListingPersistenceError> {
        let inner = self.0.lock();
        let mut rows: Vec<_> = inner
            .listings
            .iter()
            .filter(|(_, listing)| {
                filter.status.is_none_or(|status| listing.status == status)
                    && filter
                        .seller
                        .is_none_or(|seller| listing.seller_id == seller)
            })
            .collect();
        rows.sort_by(|(seq_a, a), (seq_b, b)| {
            (b.created_at, seq_b).cmp(&(a.created_at, seq_a))
        });
        Ok(rows
            .into_iter()
            .map(|(_, listing)| inner.enrich(listing))
            .collect())
    }

    async fn update(&self, listing: &Listing) -> Result<(), ListingPersistenceError> {
        let mut inner = self.0.lock();
        if let Some((_, slot)) = inner
            .listings
            .iter_mut()
            .find(|(_, row)| row.id == listing.id)
        {
            *slot = listing.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, ListingPersistenceError> {
        let mut inner = self.0.lock();
        let before = inner.listings.len();
        inner.listings.retain(|(_, listing)| listing.id != *id);
        Ok(inner.listings.len() < before)
    }
}

/// In-memory [`InvestmentRepository`].
#[derive(Clone)]
pub struct InMemoryInvestmentRepository(Arc<InMemoryStore>);

impl InMemoryInvestmentRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self(store)
    }
}

#[async_trait]
impl InvestmentRepository for InMemoryInvestmentRepository {
    async fn create_admitted(
        &self,
        draft: InvestmentDraft,
    ) -> Result<InvestmentWithListing, CreateInvestmentError> {
        // Holding the store lock across check and insert is this adapter's
        // equivalent of the SQL row lock.
        let mut inner = self.0.lock();
        let listing = inner
            .listings
            .iter()
            .find(|(_, listing)| listing.id == draft.listing_id)
            .map(|(_, listing)| listing.clone())
            .ok_or(CreateInvestmentError::ListingNotFound)?;
        let already = inner.total_invested(&draft.listing_id);
        admit(&listing, already, draft.amount)?;

        let investment = draft.into_investment(Utc::now());
        let joined = InvestmentWithListing {
            investment: investment.clone(),
            listing_title: listing.title,
            listing_asset_value: listing.asset_value,
            listing_target_amount: listing.target_amount,
        };
        let seq = inner.next_seq();
        inner.investments.push((seq, investment));
        Ok(joined)
    }

    async fn list_for_investor(
        &self,
        investor: &UserId,
    ) -> Result<Vec<InvestmentWithListing>, InvestmentPersistenceError> {
        let inner = self.0.lock();
        let mut rows: Vec<_> = inner
            .investments
            .iter()
            .filter(|(_, investment)| investment.investor_id == *investor)
            .collect();
        rows.sort_by(|(seq_a, a), (seq_b, b)| {
            (b.created_at, seq_b).cmp(&(a.created_at, seq_a))
        });
        Ok(rows
            .into_iter()
            .filter_map(|(_, investment)| inner.join(investment))
            .collect())
    }

    async fn find_for_investor(
        &self,
        id: &Uuid,
        investor: &UserId,
    ) -> Result<Option<InvestmentWithListing>, InvestmentPersistenceError> {
        let inner = self.0.lock();
        Ok(inner
            .investments
            .iter()
            .find(|(_, investment)| {
                investment.id == *id && investment.investor_id == *investor
            })
            .and_then(|(_, investment)| inner.join(investment)))
    }

    async fn delete_for_investor(
        &self,
        id: &Uuid,
        investor: &UserId,
    ) -> Result<bool, InvestmentPersistenceError> {
        let mut inner = self.0.lock();
        let before = inner.investments.len();
        inner.investments.retain(|(_, investment)| {
            !(investment.id == *id && investment.investor_id == *investor)
        });
        Ok(inner.investments.len() < before)
    }
}
