//! Error types for AgriRent server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::{cart::CartClassification, pincode::Pincode};

/// Stable numeric error codes returned to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchData = 4,
    BadValue = 5,
    InvalidPincodeFormat = 6,
    LocationLookupFailed = 7,
    LocationMismatch = 8,
    MixedLocations = 9,
    LocationRequired = 10,
    CartDataError = 11,
    MissingPickupSlot = 12,
    EmptyCart = 13,
    ListingNotOrderable = 14,
    PaymentFailed = 15,
    PlacementFailed = 16,
    ServiceUnavailable = 17,
    NotAuthenticated = 18,
    ListingLocationMismatch = 19,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid pincode '{0}': a pincode is exactly 6 digits")]
    InvalidPincodeFormat(String),

    #[error("Location lookup failed: {0}")]
    LocationLookupFailed(String),

    #[error("Please set your location before checking out")]
    PincodeRequired,

    #[error("{}", .0.message())]
    CartConflict(CartClassification),

    #[error(
        "Your cart has equipment from pincode {cart_pincode} but this listing is in pincode \
         {listing_pincode}; remove the cart items or choose equipment from {cart_pincode}"
    )]
    ListingLocationMismatch {
        cart_pincode: Pincode,
        listing_pincode: Pincode,
    },

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Pickup date and time are required for: {}", .0.join(", "))]
    MissingPickupSlot(Vec<String>),

    #[error("Listing cannot be ordered: {0}")]
    ListingNotOrderable(String),

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("Order placement failed: {0}")]
    PlacementFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    /// Structured context, e.g. the pincode groups of a mixed cart
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthenticated),
            AppError::Authorization(_) => (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchData),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue),
            AppError::InvalidPincodeFormat(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidPincodeFormat)
            }
            AppError::LocationLookupFailed(_) => {
                (StatusCode::BAD_GATEWAY, ErrorCode::LocationLookupFailed)
            }
            AppError::PincodeRequired => {
                (StatusCode::PRECONDITION_REQUIRED, ErrorCode::LocationRequired)
            }
            AppError::CartConflict(classification) => {
                let code = match classification {
                    CartClassification::MixedLocations { .. } => ErrorCode::MixedLocations,
                    CartClassification::LocationMismatch { .. } => ErrorCode::LocationMismatch,
                    CartClassification::LocationRequired { .. } => ErrorCode::LocationRequired,
                    CartClassification::DataError { .. } => ErrorCode::CartDataError,
                    CartClassification::Empty | CartClassification::Compatible { .. } => {
                        ErrorCode::Failure
                    }
                };
                (StatusCode::CONFLICT, code)
            }
            AppError::ListingLocationMismatch { .. } => {
                (StatusCode::CONFLICT, ErrorCode::ListingLocationMismatch)
            }
            AppError::EmptyCart => (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::EmptyCart),
            AppError::MissingPickupSlot(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::MissingPickupSlot)
            }
            AppError::ListingNotOrderable(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::ListingNotOrderable)
            }
            AppError::PaymentFailed(_) => (StatusCode::PAYMENT_REQUIRED, ErrorCode::PaymentFailed),
            AppError::PlacementFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::PlacementFailed)
            }
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DbFailure),
            AppError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::ServiceUnavailable)
            }
            AppError::BusinessRule(_) => (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::Failure),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Failure),
        }
    }

    /// Numeric code for this error
    pub fn code(&self) -> ErrorCode {
        self.status_and_code().1
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::PlacementFailed(msg) => {
                tracing::error!("Order placement failed: {}", msg);
                "Your order could not be placed and your cart was kept. Please retry or contact support."
                    .to_string()
            }
            other => other.to_string(),
        };

        let details = match &self {
            AppError::CartConflict(classification) => serde_json::to_value(classification).ok(),
            AppError::ListingLocationMismatch {
                cart_pincode,
                listing_pincode,
            } => Some(serde_json::json!({
                "cart_pincode": cart_pincode,
                "listing_pincode": listing_pincode,
            })),
            AppError::MissingPickupSlot(names) => serde_json::to_value(names).ok(),
            _ => None,
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cart_conflicts_map_to_specific_codes() {
        let pin = Pincode::parse("500001").unwrap();
        let err = AppError::CartConflict(CartClassification::LocationRequired { cart_pincode: pin });
        assert_eq!(err.code(), ErrorCode::LocationRequired);
        assert_eq!(err.status_and_code().0, StatusCode::CONFLICT);
    }

    #[test]
    fn listing_mismatch_names_both_pincodes() {
        let err = AppError::ListingLocationMismatch {
            cart_pincode: Pincode::parse("500001").unwrap(),
            listing_pincode: Pincode::parse("500002").unwrap(),
        };
        assert_eq!(err.code(), ErrorCode::ListingLocationMismatch);
        assert_eq!(err.status_and_code().0, StatusCode::CONFLICT);
        let message = err.to_string();
        assert!(message.contains("pincode 500001"));
        assert!(message.contains("listing is in pincode 500002"));
    }

    #[test]
    fn missing_pickup_slot_names_items() {
        let err = AppError::MissingPickupSlot(vec!["Tractor".into(), "Seeder".into()]);
        assert_eq!(
            err.to_string(),
            "Pickup date and time are required for: Tractor, Seeder"
        );
    }
}
