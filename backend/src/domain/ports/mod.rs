//! Domain ports for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod investment_repository;
mod listing_repository;
mod user_repository;

pub use investment_repository::{
    CreateInvestmentError, InvestmentPersistenceError, InvestmentRepository,
};
pub use listing_repository::{ListingPersistenceError, ListingRepository};
pub use user_repository::{UserPersistenceError, UserRepository};
