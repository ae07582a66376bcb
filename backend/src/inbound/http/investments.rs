//! Investment HTTP handlers.
//!
//! ```text
//! GET    /api/v1/investments
//! POST   /api/v1/investments {"listing":"<uuid>","amount":"250.00"}
//! GET    /api/v1/investments/{id}
//! DELETE /api/v1/investments/{id}
//! ```
//!
//! Commitments are immutable: there is no update route, so an accepted
//! amount can never be edited out from under the capacity invariant.

use actix_web::{delete, get, post, web, HttpResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Error, InvestmentWithListing};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_uuid, FieldName};
use crate::inbound::http::ApiResult;

/// Request payload for committing funds against a listing.
///
/// Any client-supplied investor field is ignored; the investor is always the
/// session user.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvestmentBody {
    #[schema(format = "uuid")]
    pub listing: String,
    #[schema(value_type = String, example = "250.00")]
    pub amount: Decimal,
}

/// Investment read model joined with listing summary fields.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub listing: String,
    pub listing_title: String,
    #[schema(value_type = String)]
    pub listing_asset_value: Decimal,
    #[schema(value_type = String)]
    pub listing_target_amount: Decimal,
    #[schema(value_type = String)]
    pub amount: Decimal,
    #[schema(value_type = String, example = "25.00")]
    pub ownership_percent: Decimal,
    #[schema(format = "date-time")]
    pub created_at: String,
}

impl From<InvestmentWithListing> for InvestmentBody {
    fn from(read: InvestmentWithListing) -> Self {
        let ownership_percent = read.ownership_percent();
        let InvestmentWithListing {
            investment,
            listing_title,
            listing_asset_value,
            listing_target_amount,
        } = read;
        Self {
            id: investment.id.to_string(),
            listing: investment.listing_id.to_string(),
            listing_title,
            listing_asset_value,
            listing_target_amount,
            amount: investment.amount,
            ownership_percent,
            created_at: investment.created_at.to_rfc3339(),
        }
    }
}

/// List the session user's commitments newest-first.
///
/// Anonymous callers receive an empty list rather than an error, mirroring
/// the public-read posture of the rest of the API.
#[utoipa::path(
    get,
    path = "/api/v1/investments",
    responses(
        (status = 200, description = "Own investments", body = [InvestmentBody]),
    ),
    tags = ["investments"],
    operation_id = "listInvestments",
    security(("SessionCookie" = []))
)]
#[get("/investments")]
pub async fn list_investments(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<InvestmentBody>>> {
    let Some(investor) = session.user_id()? else {
        return Ok(web::Json(Vec::new()));
    };
    let investments = state.investments.list(&investor).await?;
    Ok(web::Json(
        investments.into_iter().map(InvestmentBody::from).collect(),
    ))
}

/// Commit funds against a live listing.
#[utoipa::path(
    post,
    path = "/api/v1/investments",
    request_body = CreateInvestmentBody,
    responses(
        (status = 201, description = "Investment created", body = InvestmentBody),
        (status = 400, description = "Refused by admission rules", body = Error),
        (status = 401, description = "No active session", body = Error),
    ),
    tags = ["investments"],
    operation_id = "createInvestment",
    security(("SessionCookie" = []))
)]
#[post("/investments")]
pub async fn create_investment(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateInvestmentBody>,
) -> ApiResult<HttpResponse> {
    let investor = session.require_user_id()?;
    let body = payload.into_inner();
    let listing_id = parse_uuid(&body.listing, FieldName::new("listing"))?;
    let created = state
        .investments
        .create(investor, listing_id, body.amount)
        .await?;
    Ok(HttpResponse::Created().json(InvestmentBody::from(created)))
}

/// Fetch one owned commitment.
#[utoipa::path(
    get,
    path = "/api/v1/investments/{id}",
    params(("id" = Uuid, Path, description = "Investment id")),
    responses(
        (status = 200, description = "Investment", body = InvestmentBody),
        (status = 401, description = "No active session", body = Error),
        (status = 404, description = "Unknown or not owned", body = Error),
    ),
    tags = ["investments"],
    operation_id = "getInvestment",
    security(("SessionCookie" = []))
)]
#[get("/investments/{id}")]
pub async fn get_investment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<InvestmentBody>> {
    let investor = session.require_user_id()?;
    let investment = state
        .investments
        .get(&investor, &path.into_inner())
        .await?;
    Ok(web::Json(InvestmentBody::from(investment)))
}

/// Withdraw an owned commitment.
#[utoipa::path(
    delete,
    path = "/api/v1/investments/{id}",
    params(("id" = Uuid, Path, description = "Investment id")),
    responses(
        (status = 204, description = "Investment deleted"),
        (status = 401, description = "No active session", body = Error),
        (status = 404, description = "Unknown or not owned", body = Error),
    ),
    tags = ["investments"],
    operation_id = "deleteInvestment",
    security(("SessionCookie" = []))
)]
#[delete("/investments/{id}")]
pub async fn delete_investment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let investor = session.require_user_id()?;
    state
        .investments
        .delete(&investor, &path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "investments_tests.rs"]
mod tests;
