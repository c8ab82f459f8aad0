//! Equipment listing endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::listing::{CreateListing, Listing, ListingQuery, ListingStatus, ModerationDecision},
    services::catalog::FeaturedSelection,
    AppState,
};

use super::{AuthenticatedUser, CurrentViewer};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ModerationRequest {
    pub decision: ModerationDecision,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FeaturedRequest {
    pub featured: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    /// pending, approved or rejected
    pub status: Option<ListingStatus>,
}

/// Browse approved listings.
///
/// Without an explicit `pincode` the viewer's active pincode filters the results.
#[utoipa::path(
    get,
    path = "/listings",
    tag = "listings",
    params(ListingQuery),
    responses(
        (status = 200, description = "Approved listings, newest first", body = Vec<Listing>),
        (status = 400, description = "Invalid pincode filter")
    )
)]
pub async fn list_listings(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Query(mut query): Query<ListingQuery>,
) -> AppResult<Json<Vec<Listing>>> {
    if query.pincode.is_none() {
        let current = state.services.pincode.load(&viewer).await?;
        query.pincode = current.get().map(|p| p.as_str().to_string());
    }
    let listings = state.services.catalog.search(&query).await?;
    Ok(Json(listings))
}

/// Home page featured strip for the viewer's active pincode
#[utoipa::path(
    get,
    path = "/listings/featured",
    tag = "listings",
    responses(
        (status = 200, description = "Featured selection", body = FeaturedSelection)
    )
)]
pub async fn featured_listings(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> AppResult<Json<FeaturedSelection>> {
    let current = state.services.pincode.load(&viewer).await?;
    let selection = state.services.catalog.featured(current.get()).await?;
    Ok(Json(selection))
}

/// Get listing by ID
#[utoipa::path(
    get,
    path = "/listings/{id}",
    tag = "listings",
    params(("id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Listing details", body = Listing),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn get_listing(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Listing>> {
    let listing = state.services.catalog.get(id, viewer.claims.as_ref()).await?;
    Ok(Json(listing))
}

/// Submit a listing for review (seller)
#[utoipa::path(
    post,
    path = "/listings",
    tag = "listings",
    security(("bearer_auth" = [])),
    request_body = CreateListing,
    responses(
        (status = 201, description = "Listing created, pending review", body = Listing)
    )
)]
pub async fn create_listing(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateListing>,
) -> AppResult<(StatusCode, Json<Listing>)> {
    let listing = state.services.catalog.create(&claims, data).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// Delete a listing (owner)
#[utoipa::path(
    delete,
    path = "/listings/{id}",
    tag = "listings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 204, description = "Listing deleted")
    )
)]
pub async fn delete_listing(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete(&claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's own listings, any status
#[utoipa::path(
    get,
    path = "/seller/listings",
    tag = "listings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Seller listings", body = Vec<Listing>)
    )
)]
pub async fn seller_listings(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Listing>>> {
    let listings = state.services.catalog.seller_listings(&claims).await?;
    Ok(Json(listings))
}

/// All listings for moderation (admin)
#[utoipa::path(
    get,
    path = "/admin/listings",
    tag = "listings",
    security(("bearer_auth" = [])),
    params(StatusQuery),
    responses(
        (status = 200, description = "Listings", body = Vec<Listing>)
    )
)]
pub async fn admin_listings(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<StatusQuery>,
) -> AppResult<Json<Vec<Listing>>> {
    let listings = state
        .services
        .catalog
        .admin_listings(&claims, query.status)
        .await?;
    Ok(Json(listings))
}

/// Approve or reject a listing (admin)
#[utoipa::path(
    put,
    path = "/listings/{id}/moderation",
    tag = "listings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Listing ID")),
    request_body = ModerationRequest,
    responses(
        (status = 200, description = "Listing moderated", body = Listing)
    )
)]
pub async fn moderate_listing(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ModerationRequest>,
) -> AppResult<Json<Listing>> {
    let listing = state
        .services
        .catalog
        .moderate(&claims, id, request.decision)
        .await?;
    Ok(Json(listing))
}

/// Feature or unfeature a listing (admin)
#[utoipa::path(
    put,
    path = "/listings/{id}/featured",
    tag = "listings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Listing ID")),
    request_body = FeaturedRequest,
    responses(
        (status = 200, description = "Listing updated", body = Listing)
    )
)]
pub async fn set_featured(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<FeaturedRequest>,
) -> AppResult<Json<Listing>> {
    let listing = state
        .services
        .catalog
        .set_featured(&claims, id, request.featured)
        .await?;
    Ok(Json(listing))
}
