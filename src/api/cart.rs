//! Cart endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::cart::{AddToCart, Cart},
    services::cart::{CartView, LocationResolution, ResolutionOutcome},
    AppState,
};

use super::CurrentViewer;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveMixedRequest {
    /// The pincode group to keep
    #[schema(example = "500001")]
    pub pincode: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveLocationRequest {
    pub action: LocationResolution,
}

/// Cart with its location classification, recomputed on every call
#[utoipa::path(
    get,
    path = "/cart",
    tag = "cart",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Cart", body = CartView),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn get_cart(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> AppResult<Json<CartView>> {
    let view = state.services.cart.load(&viewer).await?;
    Ok(Json(view))
}

/// Add a listing or replace its rental terms
#[utoipa::path(
    post,
    path = "/cart/items",
    tag = "cart",
    security(("bearer_auth" = [])),
    request_body = AddToCart,
    responses(
        (status = 200, description = "Updated cart", body = Cart),
        (status = 409, description = "Listing is from a different pincode than the cart"),
        (status = 422, description = "Listing cannot be ordered or pickup slot missing")
    )
)]
pub async fn add_item(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Json(request): Json<AddToCart>,
) -> AppResult<Json<Cart>> {
    let cart = state.services.cart.add_item(&viewer, request).await?;
    Ok(Json(cart))
}

/// Remove a listing from the cart
#[utoipa::path(
    delete,
    path = "/cart/items/{listing_id}",
    tag = "cart",
    security(("bearer_auth" = [])),
    params(("listing_id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Updated cart", body = Cart)
    )
)]
pub async fn remove_item(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(listing_id): Path<Uuid>,
) -> AppResult<Json<Cart>> {
    let cart = state.services.cart.remove_item(&viewer, listing_id).await?;
    Ok(Json(cart))
}

/// Empty the cart
#[utoipa::path(
    delete,
    path = "/cart",
    tag = "cart",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Cart cleared")
    )
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> AppResult<StatusCode> {
    state.services.cart.clear(&viewer).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Keep one pincode group of a mixed cart and make it the active location
#[utoipa::path(
    post,
    path = "/cart/resolve-mixed",
    tag = "cart",
    security(("bearer_auth" = [])),
    request_body = ResolveMixedRequest,
    responses(
        (status = 200, description = "Cart reduced to the selected pincode", body = ResolutionOutcome)
    )
)]
pub async fn resolve_mixed(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Json(request): Json<ResolveMixedRequest>,
) -> AppResult<Json<ResolutionOutcome>> {
    let outcome = state
        .services
        .cart
        .resolve_mixed(&viewer, &request.pincode)
        .await?;
    Ok(Json(outcome))
}

/// Adopt the cart's pincode or discard the cart
#[utoipa::path(
    post,
    path = "/cart/resolve-location",
    tag = "cart",
    security(("bearer_auth" = [])),
    request_body = ResolveLocationRequest,
    responses(
        (status = 200, description = "Conflict resolved", body = ResolutionOutcome),
        (status = 422, description = "Cart has no location conflict")
    )
)]
pub async fn resolve_location(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Json(request): Json<ResolveLocationRequest>,
) -> AppResult<Json<ResolutionOutcome>> {
    let outcome = state
        .services
        .cart
        .resolve_location(&viewer, request.action)
        .await?;
    Ok(Json(outcome))
}
