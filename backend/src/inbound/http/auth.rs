//! Authentication and account HTTP handlers.
//!
//! ```text
//! GET  /api/v1/auth/csrf
//! POST /api/v1/auth/register {"email":"ada@example.com","password":"..."}
//! POST /api/v1/auth/login    {"email":"ada@example.com","password":"..."}
//! POST /api/v1/auth/logout
//! GET  /api/v1/auth/me
//! ```

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Error, RegisterRequest, User};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;
use crate::middleware::csrf::CSRF_COOKIE;

/// Registration request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    pub email: String,
    pub name: Option<String>,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

/// Public projection of an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserBody {
    #[schema(format = "uuid")]
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

impl From<User> for UserBody {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.to_string(),
            name: user.name,
        }
    }
}

/// Simple human-readable acknowledgement payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DetailBody {
    pub detail: String,
}

impl DetailBody {
    fn new(detail: &str) -> Self {
        Self {
            detail: detail.to_owned(),
        }
    }
}

/// Issue the anti-forgery cookie consumed by state-changing calls.
#[utoipa::path(
    get,
    path = "/api/v1/auth/csrf",
    responses(
        (status = 200, description = "CSRF cookie set", body = DetailBody,
         headers(("Set-Cookie" = String, description = "csrftoken cookie"))),
    ),
    tags = ["auth"],
    operation_id = "csrfHandshake",
    security([])
)]
#[get("/auth/csrf")]
pub async fn csrf_handshake() -> HttpResponse {
    let token = Uuid::new_v4().simple().to_string();
    // Readable by the client on purpose; see the CsrfGuard module docs.
    let cookie = Cookie::build(CSRF_COOKIE, token)
        .path("/")
        .http_only(false)
        .same_site(SameSite::Lax)
        .finish();
    HttpResponse::Ok()
        .cookie(cookie)
        .json(DetailBody::new("CSRF cookie set"))
}

/// Create a new account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterBody,
    responses(
        (status = 201, description = "Account created", body = UserBody),
        (status = 400, description = "Invalid registration", body = Error),
        (status = 403, description = "Missing CSRF token", body = Error),
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterBody>,
) -> ApiResult<HttpResponse> {
    let RegisterBody {
        email,
        name,
        password,
    } = payload.into_inner();
    let user = state
        .identity
        .register(RegisterRequest {
            email,
            name,
            password,
        })
        .await?;
    Ok(HttpResponse::Created().json(UserBody::from(user)))
}

/// Check credentials and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginBody,
    responses(
        (status = 200, description = "Login success", body = UserBody,
         headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid credentials", body = Error),
        (status = 403, description = "Missing CSRF token", body = Error),
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginBody>,
) -> ApiResult<web::Json<UserBody>> {
    let LoginBody { email, password } = payload.into_inner();
    let user = state.identity.login(&email, &password).await?;
    session.persist_user(&user.id)?;
    Ok(web::Json(UserBody::from(user)))
}

/// Terminate the current session. Safe to call without one.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Session terminated", body = DetailBody),
        (status = 403, description = "Missing CSRF token", body = Error),
    ),
    tags = ["auth"],
    operation_id = "logout",
    security([])
)]
#[post("/auth/logout")]
pub async fn logout(session: SessionContext) -> web::Json<DetailBody> {
    session.clear();
    web::Json(DetailBody::new("Logged out"))
}

/// Return the authenticated account's public projection.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current account", body = UserBody),
        (status = 401, description = "No active session", body = Error),
    ),
    tags = ["auth"],
    operation_id = "currentUser",
    security(("SessionCookie" = []))
)]
#[get("/auth/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserBody>> {
    let user_id = session.require_user_id()?;
    let user = state.identity.current_user(&user_id).await?;
    Ok(web::Json(UserBody::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{register_and_login, test_app, REGISTERED_PASSWORD};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use serde_json::Value;

    #[actix_web::test]
    async fn csrf_handshake_sets_the_cookie() {
        let app = actix_test::init_service(test_app()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/auth/csrf")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == CSRF_COOKIE)
            .expect("csrftoken cookie");
        assert!(!cookie.value().is_empty());
    }

    #[actix_web::test]
    async fn register_returns_the_projection() {
        let app = actix_test::init_service(test_app()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(RegisterBody {
                    email: "Ada@Example.com".to_owned(),
                    name: Some("Ada".to_owned()),
                    password: "long enough".to_owned(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["email"], "ada@example.com");
        assert_eq!(body["name"], "Ada");
        assert!(body.get("passwordHash").is_none());
    }

    #[actix_web::test]
    async fn register_rejects_short_passwords_with_field_details() {
        let app = actix_test::init_service(test_app()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(RegisterBody {
                    email: "ada@example.com".to_owned(),
                    name: None,
                    password: "short".to_owned(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["details"]["field"], "password");
    }

    #[actix_web::test]
    async fn me_requires_a_session_then_reflects_the_login() {
        let app = actix_test::init_service(test_app()).await;

        let before = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/auth/me")
                .to_request(),
        )
        .await;
        assert_eq!(before.status(), StatusCode::UNAUTHORIZED);

        let session = register_and_login(&app, "ada@example.com").await;
        let after = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/auth/me")
                .cookie(session)
                .to_request(),
        )
        .await;
        assert_eq!(after.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(after).await;
        assert_eq!(body["email"], "ada@example.com");
    }

    #[actix_web::test]
    async fn login_with_wrong_password_is_a_400() {
        let app = actix_test::init_service(test_app()).await;
        register_and_login(&app, "ada@example.com").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(LoginBody {
                    email: "ada@example.com".to_owned(),
                    password: "not the password".to_owned(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["message"], "Invalid credentials");
    }

    #[actix_web::test]
    async fn login_normalizes_the_email() {
        let app = actix_test::init_service(test_app()).await;
        register_and_login(&app, "ada@example.com").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(LoginBody {
                    email: "  ADA@Example.COM ".to_owned(),
                    password: REGISTERED_PASSWORD.to_owned(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn logout_is_idempotent() {
        let app = actix_test::init_service(test_app()).await;
        for _ in 0..2 {
            let res = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri("/api/v1/auth/logout")
                    .to_request(),
            )
            .await;
            assert_eq!(res.status(), StatusCode::OK);
            let body: Value = actix_test::read_body_json(res).await;
            assert_eq!(body["detail"], "Logged out");
        }
    }
}
