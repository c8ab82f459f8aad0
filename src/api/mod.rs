//! API handlers for AgriRent REST endpoints

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod listings;
pub mod openapi;
pub mod orders;
pub mod pincode;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::AppError,
    models::user::{UserClaims, Viewer},
    AppState,
};

/// Header carrying the anonymous session that remembers a visitor's pincode
pub const SESSION_HEADER: &str = "x-session-id";

/// Decode the bearer token, if any
fn bearer_claims(headers: &HeaderMap, secret: &str) -> Result<Option<UserClaims>, AppError> {
    let Some(auth_header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let auth_header = auth_header
        .to_str()
        .map_err(|_| AppError::Authentication("Invalid authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

    UserClaims::from_token(token, secret)
        .map(Some)
        .map_err(|e| AppError::Authentication(e.to_string()))
}

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        bearer_claims(&parts.headers, &state.config.auth.jwt_secret)?
            .map(AuthenticatedUser)
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))
    }
}

/// Extractor for anyone: optional JWT identity plus optional session id.
///
/// A malformed or expired token is rejected rather than treated as anonymous.
pub struct CurrentViewer(pub Viewer);

#[async_trait]
impl FromRequestParts<AppState> for CurrentViewer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(&parts.headers, &state.config.auth.jwt_secret)?;
        let session_id = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(CurrentViewer(Viewer { claims, session_id }))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Location
        .route("/pincode", get(pincode::get_pincode))
        .route("/pincode", put(pincode::set_pincode))
        .route("/pincode", delete(pincode::clear_pincode))
        .route("/pincode/compatibility", post(pincode::check_compatibility))
        .route("/pincode/:pincode/localities", get(pincode::get_localities))
        // Catalog
        .route("/listings", get(listings::list_listings))
        .route("/listings", post(listings::create_listing))
        .route("/listings/featured", get(listings::featured_listings))
        .route("/listings/:id", get(listings::get_listing))
        .route("/listings/:id", delete(listings::delete_listing))
        .route("/listings/:id/moderation", put(listings::moderate_listing))
        .route("/listings/:id/featured", put(listings::set_featured))
        .route("/seller/listings", get(listings::seller_listings))
        .route("/admin/listings", get(listings::admin_listings))
        // Cart
        .route("/cart", get(cart::get_cart))
        .route("/cart", delete(cart::clear_cart))
        .route("/cart/items", post(cart::add_item))
        .route("/cart/items/:listing_id", delete(cart::remove_item))
        .route("/cart/resolve-mixed", post(cart::resolve_mixed))
        .route("/cart/resolve-location", post(cart::resolve_location))
        // Checkout
        .route("/checkout", get(checkout::get_checkout))
        .route("/checkout/orders", post(checkout::place_order))
        // Orders
        .route("/orders", get(orders::my_orders))
        .route("/orders/:id", get(orders::get_order))
        .route("/orders/:id/status", put(orders::update_status))
        .route("/seller/orders", get(orders::seller_orders))
        .route("/admin/orders", get(orders::admin_orders))
        // Profile
        .route("/me", get(users::get_me))
        .route("/me", put(users::update_me))
        // Administration
        .route("/admin/stats", get(admin::get_stats))
        .route("/admin/settings", get(admin::get_settings))
        .route("/admin/settings", put(admin::update_settings))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
