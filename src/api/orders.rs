//! Order endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::order::{Order, OrderStatus, UpdateOrderStatus},
    AppState,
};

use super::AuthenticatedUser;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderStatusQuery {
    pub status: Option<OrderStatus>,
}

/// Orders placed by the caller
#[utoipa::path(
    get,
    path = "/orders",
    tag = "orders",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Customer orders, newest first", body = Vec<Order>)
    )
)]
pub async fn my_orders(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state.services.orders.customer_orders(&claims).await?;
    Ok(Json(orders))
}

/// Get order by ID
#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order details", body = Order)
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let order = state.services.orders.get(&claims, id).await?;
    Ok(Json(order))
}

/// Orders containing the caller's listings (seller)
#[utoipa::path(
    get,
    path = "/seller/orders",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(OrderStatusQuery),
    responses(
        (status = 200, description = "Seller orders", body = Vec<Order>)
    )
)]
pub async fn seller_orders(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<OrderStatusQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state
        .services
        .orders
        .seller_orders(&claims, query.status)
        .await?;
    Ok(Json(orders))
}

/// All orders (admin)
#[utoipa::path(
    get,
    path = "/admin/orders",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(OrderStatusQuery),
    responses(
        (status = 200, description = "All orders", body = Vec<Order>)
    )
)]
pub async fn admin_orders(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<OrderStatusQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state.services.orders.all_orders(&claims, query.status).await?;
    Ok(Json(orders))
}

/// Change an order's status
#[utoipa::path(
    put,
    path = "/orders/{id}/status",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatus,
    responses(
        (status = 200, description = "Order updated", body = Order),
        (status = 422, description = "Transition not allowed")
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateOrderStatus>,
) -> AppResult<Json<Order>> {
    let order = state
        .services
        .orders
        .update_status(&claims, id, request.status)
        .await?;
    Ok(Json(order))
}
