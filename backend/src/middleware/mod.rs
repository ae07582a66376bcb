//! Actix middleware: request tracing and the anti-forgery guard.

pub mod csrf;
pub mod trace;

pub use csrf::CsrfGuard;
pub use trace::Trace;
