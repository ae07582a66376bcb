//! Anti-forgery guard using the double-submit cookie pattern.
//!
//! The handshake endpoint issues a `csrftoken` cookie readable by the
//! client; every state-changing request must echo that value back in the
//! `x-csrf-token` header. Because a cross-site attacker can make the browser
//! send the cookie but cannot read it to fill the header, a mismatch or an
//! absent pair rejects the request with 403 before it reaches a handler.

use std::task::{Context, Poll};

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::Method;
use actix_web::{Error, HttpMessage};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use tracing::debug;

use crate::domain::Error as ApiError;

/// Cookie issued by the handshake endpoint. Deliberately not HTTP-only so
/// browser clients can copy it into the request header.
pub const CSRF_COOKIE: &str = "csrftoken";
/// Header that must echo the cookie on state-changing requests.
pub const CSRF_HEADER: &str = "x-csrf-token";

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn token_matches(req: &ServiceRequest) -> bool {
    let Some(cookie) = req.cookie(CSRF_COOKIE) else {
        return false;
    };
    let Some(header) = req.headers().get(CSRF_HEADER).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    !header.is_empty() && header == cookie.value()
}

/// Middleware enforcing the cookie/header pair on unsafe methods.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use backend::middleware::csrf::CsrfGuard;
///
/// let app = App::new().wrap(CsrfGuard);
/// ```
#[derive(Clone)]
pub struct CsrfGuard;

impl<S, B> Transform<S, ServiceRequest> for CsrfGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = CsrfGuardMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CsrfGuardMiddleware { service }))
    }
}

/// Service wrapper produced by [`CsrfGuard`]. Not used directly.
pub struct CsrfGuardMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for CsrfGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !is_safe(req.method()) && !token_matches(&req) {
            debug!(method = %req.method(), path = %req.path(), "rejecting request without CSRF pair");
            return Box::pin(ready(Err(
                ApiError::forbidden("CSRF token missing or incorrect.").into()
            )));
        }
        let fut = self.service.call(req);
        Box::pin(fut)
    }
}
