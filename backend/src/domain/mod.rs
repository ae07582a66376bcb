//! Domain entities, business rules, and ports.
//!
//! Everything here is transport agnostic: entities carry invariants in their
//! constructors, lifecycle and admission rules are pure functions, and the
//! services speak to storage exclusively through the traits in [`ports`].

pub mod auth;
pub mod error;
pub mod identity_service;
pub mod investment;
pub mod investment_service;
pub mod listing;
pub mod listing_service;
pub mod ports;
pub mod user;

pub use self::error::{Error, ErrorCode, TRACE_ID_HEADER};
pub use self::identity_service::{IdentityService, RegisterRequest, PASSWORD_MIN_LEN};
pub use self::investment::{
    admit, ownership_percent, AdmissionError, Investment, InvestmentDraft, InvestmentWithListing,
};
pub use self::investment_service::InvestmentService;
pub use self::listing::{
    derive_target_amount, edit_permitted, money2, Listing, ListingDraft, ListingFilter,
    ListingPatch, ListingStatus, ListingValidationError, ListingWithSeller,
    DEFAULT_MIN_INVESTMENT,
};
pub use self::listing_service::ListingService;
pub use self::user::{EmailAddress, User, UserId, UserValidationError};
