//! Marketplace backend library modules.
//!
//! Hexagonal layout: `domain` holds transport-agnostic entities, rules, and
//! ports; `inbound` adapts HTTP onto the domain; `outbound` adapts the domain
//! onto PostgreSQL; `server` assembles the Actix application.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
/// Request-tracing middleware re-exported for app assembly.
pub use middleware::trace::Trace;
