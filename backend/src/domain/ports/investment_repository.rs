//! Port abstraction for investment persistence adapters.
//!
//! Creation carries the admission contract: implementations must evaluate
//! [`crate::domain::investment::admit`] and insert the row within one atomic
//! unit that excludes concurrent writers against the same listing (a row
//! lock, or a single mutex for in-memory adapters). That closes the
//! check-then-act race between reading the invested total and inserting.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{AdmissionError, InvestmentDraft, InvestmentWithListing, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by investment repository adapters.
    pub enum InvestmentPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "investment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "investment repository query failed: {message}",
    }
}

/// Failure modes of admitted creation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CreateInvestmentError {
    /// The referenced listing does not exist.
    #[error("listing not found")]
    ListingNotFound,
    /// Admission refused the commitment.
    #[error(transparent)]
    Rejected(#[from] AdmissionError),
    /// The storage layer failed.
    #[error(transparent)]
    Persistence(InvestmentPersistenceError),
}

#[async_trait]
pub trait InvestmentRepository: Send + Sync {
    /// Admit and persist a commitment atomically (see module docs).
    async fn create_admitted(
        &self,
        draft: InvestmentDraft,
    ) -> Result<InvestmentWithListing, CreateInvestmentError>;

    /// The investor's own commitments, newest-first, joined with listing
    /// summary fields.
    async fn list_for_investor(
        &self,
        investor: &UserId,
    ) -> Result<Vec<InvestmentWithListing>, InvestmentPersistenceError>;

    /// One commitment, visible only to its owning investor.
    async fn find_for_investor(
        &self,
        id: &Uuid,
        investor: &UserId,
    ) -> Result<Option<InvestmentWithListing>, InvestmentPersistenceError>;

    /// Delete an owned commitment. Returns whether a row existed.
    async fn delete_for_investor(
        &self,
        id: &Uuid,
        investor: &UserId,
    ) -> Result<bool, InvestmentPersistenceError>;
}
