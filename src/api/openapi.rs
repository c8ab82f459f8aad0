//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admin, cart, checkout, health, listings, orders, pincode, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AgriRent API",
        version = "0.4.0",
        description = "Pincode-scoped farm equipment rental marketplace"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Pincode
        pincode::get_pincode,
        pincode::set_pincode,
        pincode::clear_pincode,
        pincode::check_compatibility,
        pincode::get_localities,
        // Listings
        listings::list_listings,
        listings::featured_listings,
        listings::get_listing,
        listings::create_listing,
        listings::delete_listing,
        listings::seller_listings,
        listings::admin_listings,
        listings::moderate_listing,
        listings::set_featured,
        // Cart
        cart::get_cart,
        cart::add_item,
        cart::remove_item,
        cart::clear_cart,
        cart::resolve_mixed,
        cart::resolve_location,
        // Checkout
        checkout::get_checkout,
        checkout::place_order,
        // Orders
        orders::my_orders,
        orders::get_order,
        orders::seller_orders,
        orders::admin_orders,
        orders::update_status,
        // Users
        users::get_me,
        users::update_me,
        // Admin
        admin::get_stats,
        admin::get_settings,
        admin::update_settings,
    ),
    components(
        schemas(
            crate::models::pincode::Pincode,
            crate::models::location::Locality,
            crate::models::listing::Listing,
            crate::models::listing::ListingStatus,
            crate::models::listing::RentalMode,
            crate::models::listing::CreateListing,
            crate::models::listing::ModerationDecision,
            crate::models::cart::Cart,
            crate::models::cart::CartLineItem,
            crate::models::cart::AddToCart,
            crate::models::cart::PincodeGroup,
            crate::models::cart::CartClassification,
            crate::models::order::Order,
            crate::models::order::OrderStatus,
            crate::models::order::PaymentStatus,
            crate::models::order::PaymentMethod,
            crate::models::order::CustomerContact,
            crate::models::order::UpdateOrderStatus,
            crate::models::user::User,
            crate::models::user::Role,
            crate::models::user::UpdateProfile,
            crate::models::settings::PlatformSettings,
            crate::models::settings::UpdateSettings,
            crate::services::pincode::PincodeChange,
            crate::services::pincode::CompatibilityResult,
            crate::services::catalog::FeaturedSelection,
            crate::services::cart::CartView,
            crate::services::cart::LocationResolution,
            crate::services::cart::ResolutionOutcome,
            crate::services::checkout::CheckoutSummary,
            crate::services::checkout::PlaceOrderRequest,
            crate::services::orders::OrderTotals,
            crate::services::stats::StatsResponse,
            pincode::PincodeResponse,
            pincode::SetPincodeRequest,
            pincode::SetPincodeResponse,
            listings::ModerationRequest,
            listings::FeaturedRequest,
            cart::ResolveMixedRequest,
            cart::ResolveLocationRequest,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "pincode", description = "Active location"),
        (name = "listings", description = "Equipment catalog"),
        (name = "cart", description = "Cart and location conflicts"),
        (name = "checkout", description = "Checkout and payment"),
        (name = "orders", description = "Rental orders"),
        (name = "users", description = "Profile"),
        (name = "admin", description = "Statistics and settings")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
