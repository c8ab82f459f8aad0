//! Equipment listing model

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::pincode::Pincode;

/// Moderation status of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Pending,
    Approved,
    Rejected,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Pending => "pending",
            ListingStatus::Approved => "approved",
            ListingStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ListingStatus::Pending),
            "approved" => Ok(ListingStatus::Approved),
            "rejected" => Ok(ListingStatus::Rejected),
            _ => Err(format!("Invalid listing status: {}", s)),
        }
    }
}

/// How a rental is priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RentalMode {
    /// Priced per acre worked
    Area,
    /// Priced per hour of use
    Time,
}

impl RentalMode {
    pub fn unit(&self) -> &'static str {
        match self {
            RentalMode::Area => "acre",
            RentalMode::Time => "hour",
        }
    }
}

/// Equipment listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Listing {
    pub id: Uuid,
    pub seller_id: Uuid,
    /// Seller display name or business name
    pub seller_name: Option<String>,
    /// Pickup address shown to customers
    pub seller_address: Option<String>,
    pub name: String,
    pub category: String,
    pub price_per_acre: Decimal,
    pub price_per_hour: Decimal,
    pub description: Option<String>,
    /// Free-text location (village, taluk)
    pub location: Option<String>,
    /// Required for the listing to be orderable
    pub pincode: Option<Pincode>,
    pub quantity: i32,
    pub status: ListingStatus,
    pub featured: bool,
    pub images: Vec<String>,
    pub specifications: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Listing {
    pub fn is_orderable(&self) -> bool {
        self.status == ListingStatus::Approved && self.pincode.is_some()
    }

    pub fn rate_for(&self, mode: RentalMode) -> Decimal {
        match mode {
            RentalMode::Area => self.price_per_acre,
            RentalMode::Time => self.price_per_hour,
        }
    }
}

/// Create listing request (seller)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateListing {
    #[validate(length(min = 2, max = 120, message = "Name must be 2-120 characters"))]
    pub name: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    pub price_per_acre: Decimal,
    pub price_per_hour: Decimal,
    pub description: Option<String>,
    pub location: Option<String>,
    pub pincode: Pincode,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
}

/// Listing search query
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListingQuery {
    /// Exact pincode filter
    pub pincode: Option<String>,
    pub category: Option<String>,
}

/// Admin moderation decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ModerationDecision {
    Approve,
    Reject,
}

impl From<ModerationDecision> for ListingStatus {
    fn from(d: ModerationDecision) -> Self {
        match d {
            ModerationDecision::Approve => ListingStatus::Approved,
            ModerationDecision::Reject => ListingStatus::Rejected,
        }
    }
}
