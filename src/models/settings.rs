//! Platform configuration record

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Marketplace-wide settings editable by administrators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlatformSettings {
    /// Fraction of the rental subtotal charged as platform fee (0.05 = 5%)
    pub platform_fee_rate: Decimal,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            platform_fee_rate: Decimal::new(5, 2),
        }
    }
}

/// Settings update request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateSettings {
    pub platform_fee_rate: Decimal,
}
