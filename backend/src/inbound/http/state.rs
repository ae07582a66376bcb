//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they depend only
//! on the domain services and stay testable without I/O.

use std::sync::Arc;

use crate::domain::{IdentityService, InvestmentService, ListingService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub identity: Arc<IdentityService>,
    pub listings: Arc<ListingService>,
    pub investments: Arc<InvestmentService>,
}

impl HttpState {
    /// Bundle the three services behind one `web::Data` payload.
    pub fn new(
        identity: IdentityService,
        listings: ListingService,
        investments: InvestmentService,
    ) -> Self {
        Self {
            identity: Arc::new(identity),
            listings: Arc::new(listings),
            investments: Arc::new(investments),
        }
    }
}
