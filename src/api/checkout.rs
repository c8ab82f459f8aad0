//! Checkout endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::order::Order,
    services::checkout::{CheckoutSummary, PlaceOrderRequest},
    AppState,
};

use super::CurrentViewer;

/// Run the checkout gate and return the payable amount
#[utoipa::path(
    get,
    path = "/checkout",
    tag = "checkout",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Checkout summary", body = CheckoutSummary),
        (status = 401, description = "Not logged in"),
        (status = 409, description = "Cart conflicts with the active pincode"),
        (status = 422, description = "Empty cart or missing pickup slot"),
        (status = 428, description = "No active pincode")
    )
)]
pub async fn get_checkout(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> AppResult<Json<CheckoutSummary>> {
    let summary = state.services.checkout.summary(&viewer).await?;
    Ok(Json(summary))
}

/// Pay and place the order
#[utoipa::path(
    post,
    path = "/checkout/orders",
    tag = "checkout",
    security(("bearer_auth" = [])),
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = Order),
        (status = 402, description = "Payment failed; cart unchanged"),
        (status = 500, description = "Order could not be saved; cart unchanged")
    )
)]
pub async fn place_order(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Json(request): Json<PlaceOrderRequest>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let order = state.services.checkout.place_order(&viewer, request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
