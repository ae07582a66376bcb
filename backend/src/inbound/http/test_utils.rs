//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{test, web, App, Error};
use serde_json::{json, Value};

use crate::domain::{IdentityService, InvestmentService, ListingService};
use crate::inbound::http::state::HttpState;
use crate::outbound::memory::{
    InMemoryInvestmentRepository, InMemoryListingRepository, InMemoryStore,
    InMemoryUserRepository,
};

/// Password used by [`register_and_login`].
pub const REGISTERED_PASSWORD: &str = "correct horse battery";

/// Full [`HttpState`] over one shared in-memory store.
pub fn in_memory_state() -> HttpState {
    let store = InMemoryStore::shared();
    HttpState::new(
        IdentityService::new(Arc::new(InMemoryUserRepository::new(store.clone()))),
        ListingService::new(Arc::new(InMemoryListingRepository::new(store.clone()))),
        InvestmentService::new(Arc::new(InMemoryInvestmentRepository::new(store))),
    )
}

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Full API app over in-memory adapters, without the CSRF guard so handler
/// tests stay focused; the guard has its own coverage.
pub fn test_app() -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = Error,
        InitError = (),
    >,
> {
    test_app_with_state(in_memory_state())
}

/// Same as [`test_app`] but over caller-provided state.
pub fn test_app_with_state(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = Error,
        InitError = (),
    >,
> {
    App::new().app_data(web::Data::new(state)).service(
        web::scope("/api/v1")
            .wrap(test_session_middleware())
            .service(super::auth::csrf_handshake)
            .service(super::auth::register)
            .service(super::auth::login)
            .service(super::auth::logout)
            .service(super::auth::current_user)
            .service(super::listings::list_listings)
            .service(super::listings::create_listing)
            .service(super::listings::get_listing)
            .service(super::listings::update_listing)
            .service(super::listings::delete_listing)
            .service(super::investments::list_investments)
            .service(super::investments::create_investment)
            .service(super::investments::get_investment)
            .service(super::investments::delete_investment),
    )
}

/// Register an account for `email` and log in, returning the session cookie.
pub async fn register_and_login<S, B>(app: &S, email: &str) -> Cookie<'static>
where
    S: actix_web::dev::Service<actix_http::Request, Response = ServiceResponse<B>, Error = Error>,
    B: actix_web::body::MessageBody,
{
    let register = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "email": email,
            "name": "Test User",
            "password": REGISTERED_PASSWORD,
        }))
        .to_request();
    let res = test::call_service(app, register).await;
    assert!(res.status().is_success(), "registration failed: {}", res.status());

    let login = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": email, "password": REGISTERED_PASSWORD }))
        .to_request();
    let res = test::call_service(app, login).await;
    assert!(res.status().is_success(), "login failed: {}", res.status());
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}

/// Create a listing as the session user and return the response body.
pub async fn create_listing_as<S, B>(
    app: &S,
    session: &Cookie<'static>,
    status: &str,
    min_investment: &str,
) -> Value
where
    S: actix_web::dev::Service<actix_http::Request, Response = ServiceResponse<B>, Error = Error>,
    B: actix_web::body::MessageBody + Unpin,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/listings")
        .cookie(session.clone())
        .set_json(json!({
            "title": "Harbour flat",
            "description": "Two rooms over the marina",
            "category": "residential",
            "assetValue": "1000.00",
            "sellerRetainPercent": "0",
            "minInvestment": min_investment,
            "status": status,
        }))
        .to_request();
    let res = test::call_service(app, req).await;
    assert!(
        res.status().is_success(),
        "listing creation failed: {}",
        res.status()
    );
    test::read_body_json(res).await
}
