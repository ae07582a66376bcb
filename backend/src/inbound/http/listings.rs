//! Listing HTTP handlers.
//!
//! ```text
//! GET    /api/v1/listings?status=live&mine=1
//! POST   /api/v1/listings
//! GET    /api/v1/listings/{id}
//! PATCH  /api/v1/listings/{id}
//! DELETE /api/v1/listings/{id}
//! ```

use actix_web::{delete, get, post, route, web, HttpResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{Error, ListingDraft, ListingFilter, ListingPatch, ListingWithSeller, UserId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_mine_flag, parse_status, FieldName};
use crate::inbound::http::ApiResult;

/// Request payload for creating a listing.
///
/// The funding target is derived server-side and cannot be supplied.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingBody {
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    #[schema(value_type = String, example = "500000.00")]
    pub asset_value: Decimal,
    #[schema(value_type = String, example = "40")]
    pub seller_retain_percent: Decimal,
    #[schema(value_type = Option<String>)]
    pub min_investment: Option<Decimal>,
    pub status: Option<String>,
}

/// Request payload for updating a listing. Absent fields are untouched.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[schema(value_type = Option<String>)]
    pub asset_value: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub seller_retain_percent: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub min_investment: Option<Decimal>,
    pub status: Option<String>,
}

/// Listing read model.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub seller_id: String,
    pub seller_name: Option<String>,
    pub seller_email: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    #[schema(value_type = String)]
    pub asset_value: Decimal,
    #[schema(value_type = String)]
    pub seller_retain_percent: Decimal,
    #[schema(value_type = String)]
    pub target_amount: Decimal,
    #[schema(value_type = String)]
    pub min_investment: Decimal,
    pub status: String,
    #[schema(value_type = String)]
    pub total_invested: Decimal,
    #[schema(value_type = String)]
    pub percent_funded: Decimal,
    #[schema(format = "date-time")]
    pub created_at: String,
    #[schema(format = "date-time")]
    pub updated_at: String,
}

impl From<ListingWithSeller> for ListingBody {
    fn from(read: ListingWithSeller) -> Self {
        let percent_funded = read.percent_funded();
        let ListingWithSeller {
            listing,
            seller_name,
            seller_email,
            total_invested,
        } = read;
        Self {
            id: listing.id.to_string(),
            seller_id: listing.seller_id.to_string(),
            seller_name,
            seller_email,
            title: listing.title,
            description: listing.description,
            category: listing.category,
            asset_value: listing.asset_value,
            seller_retain_percent: listing.seller_retain_percent,
            target_amount: listing.target_amount,
            min_investment: listing.min_investment,
            status: listing.status.to_string(),
            total_invested,
            percent_funded,
            created_at: listing.created_at.to_rfc3339(),
            updated_at: listing.updated_at.to_rfc3339(),
        }
    }
}

/// Query filters for the listing index.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListingsQuery {
    /// Exact lifecycle state to match.
    pub status: Option<String>,
    /// `1`/`true` restricts results to the session user's own listings.
    pub mine: Option<String>,
}

enum ResolvedFilter {
    Query(ListingFilter),
    /// `mine` requested without a session: the result set is empty by
    /// definition, no query needed.
    Empty,
}

fn resolve_filter(
    query: &ListingsQuery,
    current_user: Option<UserId>,
) -> Result<ResolvedFilter, Error> {
    let status = query
        .status
        .as_deref()
        .map(|raw| parse_status(raw, FieldName::new("status")))
        .transpose()?;
    if parse_mine_flag(query.mine.as_deref()) {
        let Some(seller) = current_user else {
            return Ok(ResolvedFilter::Empty);
        };
        return Ok(ResolvedFilter::Query(ListingFilter {
            status,
            seller: Some(seller),
        }));
    }
    Ok(ResolvedFilter::Query(ListingFilter {
        status,
        seller: None,
    }))
}

/// List listings newest-first; public, optionally narrowed.
#[utoipa::path(
    get,
    path = "/api/v1/listings",
    params(ListingsQuery),
    responses(
        (status = 200, description = "Listings", body = [ListingBody]),
        (status = 400, description = "Invalid filter", body = Error),
    ),
    tags = ["listings"],
    operation_id = "listListings",
    security([])
)]
#[get("/listings")]
pub async fn list_listings(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ListingsQuery>,
) -> ApiResult<web::Json<Vec<ListingBody>>> {
    let filter = match resolve_filter(&query, session.user_id()?)? {
        ResolvedFilter::Query(filter) => filter,
        ResolvedFilter::Empty => return Ok(web::Json(Vec::new())),
    };
    let listings = state.listings.list(&filter).await?;
    Ok(web::Json(listings.into_iter().map(ListingBody::from).collect()))
}

/// Create a listing owned by the session user.
#[utoipa::path(
    post,
    path = "/api/v1/listings",
    request_body = CreateListingBody,
    responses(
        (status = 201, description = "Listing created", body = ListingBody),
        (status = 400, description = "Invalid listing", body = Error),
        (status = 401, description = "No active session", body = Error),
    ),
    tags = ["listings"],
    operation_id = "createListing",
    security(("SessionCookie" = []))
)]
#[post("/listings")]
pub async fn create_listing(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateListingBody>,
) -> ApiResult<HttpResponse> {
    let seller = session.require_user_id()?;
    let body = payload.into_inner();
    let status = body
        .status
        .as_deref()
        .map(|raw| parse_status(raw, FieldName::new("status")))
        .transpose()?;
    let draft = ListingDraft {
        seller_id: seller,
        title: body.title,
        description: body.description,
        category: body.category,
        asset_value: body.asset_value,
        seller_retain_percent: body.seller_retain_percent,
        min_investment: body.min_investment,
        status,
    };
    let created = state.listings.create(seller, draft).await?;
    Ok(HttpResponse::Created().json(ListingBody::from(created)))
}

/// Fetch one listing; public.
#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing", body = ListingBody),
        (status = 404, description = "Unknown listing", body = Error),
    ),
    tags = ["listings"],
    operation_id = "getListing",
    security([])
)]
#[get("/listings/{id}")]
pub async fn get_listing(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<ListingBody>> {
    let listing = state.listings.get(&path.into_inner()).await?;
    Ok(web::Json(ListingBody::from(listing)))
}

fn patch_from_body(body: UpdateListingBody, status_field: FieldName) -> Result<ListingPatch, Error> {
    let status = body
        .status
        .as_deref()
        .map(|raw| parse_status(raw, status_field))
        .transpose()?;
    Ok(ListingPatch {
        title: body.title,
        description: body.description,
        category: body.category,
        asset_value: body.asset_value,
        seller_retain_percent: body.seller_retain_percent,
        min_investment: body.min_investment,
        status,
    })
}

/// Update a listing under the seller-only and edit-lock rules.
///
/// A status-only body performs a lifecycle transition from any state; any
/// other field requires the listing to still be a draft.
#[utoipa::path(
    patch,
    path = "/api/v1/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing id")),
    request_body = UpdateListingBody,
    responses(
        (status = 200, description = "Listing updated", body = ListingBody),
        (status = 400, description = "Invalid patch", body = Error),
        (status = 401, description = "No active session", body = Error),
        (status = 403, description = "Not the seller, or edit-locked", body = Error),
        (status = 404, description = "Unknown listing", body = Error),
    ),
    tags = ["listings"],
    operation_id = "updateListing",
    security(("SessionCookie" = []))
)]
#[route("/listings/{id}", method = "PUT", method = "PATCH")]
pub async fn update_listing(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateListingBody>,
) -> ApiResult<web::Json<ListingBody>> {
    let actor = session.require_user_id()?;
    let patch = patch_from_body(payload.into_inner(), FieldName::new("status"))?;
    let updated = state
        .listings
        .update(&actor, &path.into_inner(), patch)
        .await?;
    Ok(web::Json(ListingBody::from(updated)))
}

/// Delete a draft listing owned by the session user.
#[utoipa::path(
    delete,
    path = "/api/v1/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 401, description = "No active session", body = Error),
        (status = 403, description = "Not the seller, or not a draft", body = Error),
        (status = 404, description = "Unknown listing", body = Error),
    ),
    tags = ["listings"],
    operation_id = "deleteListing",
    security(("SessionCookie" = []))
)]
#[delete("/listings/{id}")]
pub async fn delete_listing(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    state.listings.delete(&actor, &path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "listings_tests.rs"]
mod tests;
