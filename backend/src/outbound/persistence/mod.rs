//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL via Diesel with async support through `diesel-async` and `bb8`
//! connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types; the one business rule evaluated here (investment
//!   admission) is a domain function the adapter calls under its row lock.
//! - **Internal models**: row structs (`models.rs`) and schema definitions
//!   (`schema.rs`) never leak to the domain layer.
//! - **Strongly typed errors**: database failures map onto the port error
//!   enums.

pub(crate) mod diesel_helpers;
mod diesel_investment_repository;
mod diesel_listing_repository;
mod diesel_user_repository;
mod models;
mod pool;
mod schema;

pub use diesel_investment_repository::DieselInvestmentRepository;
pub use diesel_listing_repository::DieselListingRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
