//! OpenAPI document assembled from the handler annotations.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the session-cookie security scheme referenced by handlers.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "SessionCookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("session"))),
            );
        }
    }
}

/// Public OpenAPI surface served by Swagger UI in debug builds.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::inbound::http::auth::csrf_handshake,
        crate::inbound::http::auth::register,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::current_user,
        crate::inbound::http::listings::list_listings,
        crate::inbound::http::listings::create_listing,
        crate::inbound::http::listings::get_listing,
        crate::inbound::http::listings::update_listing,
        crate::inbound::http::listings::delete_listing,
        crate::inbound::http::investments::list_investments,
        crate::inbound::http::investments::create_investment,
        crate::inbound::http::investments::get_investment,
        crate::inbound::http::investments::delete_investment,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        crate::domain::Error,
        crate::domain::ErrorCode,
        crate::inbound::http::auth::RegisterBody,
        crate::inbound::http::auth::LoginBody,
        crate::inbound::http::auth::UserBody,
        crate::inbound::http::auth::DetailBody,
        crate::inbound::http::listings::CreateListingBody,
        crate::inbound::http::listings::UpdateListingBody,
        crate::inbound::http::listings::ListingBody,
        crate::inbound::http::investments::CreateInvestmentBody,
        crate::inbound::http::investments::InvestmentBody,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Session authentication"),
        (name = "listings", description = "Sellable offerings and their lifecycle"),
        (name = "investments", description = "Commitments against live listings"),
        (name = "health", description = "Orchestration probes"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_includes_every_route() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        for expected in [
            "/api/v1/auth/csrf",
            "/api/v1/auth/register",
            "/api/v1/auth/login",
            "/api/v1/auth/logout",
            "/api/v1/auth/me",
            "/api/v1/listings",
            "/api/v1/listings/{id}",
            "/api/v1/investments",
            "/api/v1/investments/{id}",
            "/health/ready",
            "/health/live",
        ] {
            assert!(paths.contains_key(expected), "missing path: {expected}");
        }
    }
}
