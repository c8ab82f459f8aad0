//! Rental order model and status lifecycle

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::cart::CartLineItem;
use super::pincode::Pincode;

/// Transaction id recorded for orders paid in cash at pickup
pub const PAY_ON_PICKUP_TRANSACTION: &str = "PAY_ON_PICKUP";

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Awaiting seller confirmation
    Pending,
    /// Confirmed by the seller, rental in progress
    Active,
    Completed,
    Cancelled,
    /// Declined by the seller
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Active => "active",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }

    /// Whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Active)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Active, Completed)
                | (Active, Cancelled)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "active" => Ok(OrderStatus::Active),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "rejected" => Ok(OrderStatus::Rejected),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }
}

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Pending,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Pending => "pending",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(PaymentStatus::Paid),
            "pending" => Ok(PaymentStatus::Pending),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// Payment method chosen at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Charged through the payment gateway
    Online,
    /// Paid in cash when the equipment is picked up
    PayOnPickup,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Online => "online",
            PaymentMethod::PayOnPickup => "pay_on_pickup",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(PaymentMethod::Online),
            "pay_on_pickup" => Ok(PaymentMethod::PayOnPickup),
            _ => Err(format!("Invalid payment method: {}", s)),
        }
    }
}

/// Customer contact details captured at checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct CustomerContact {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(length(min = 10, max = 15, message = "Phone must be 10-15 characters"))]
    pub phone: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub address: Option<String>,
}

/// How an order was (or will be) paid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecord {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: String,
}

impl PaymentRecord {
    pub fn pay_on_pickup() -> Self {
        Self {
            method: PaymentMethod::PayOnPickup,
            status: PaymentStatus::Pending,
            transaction_id: PAY_ON_PICKUP_TRANSACTION.to_string(),
        }
    }

    pub fn online(transaction_id: String) -> Self {
        Self {
            method: PaymentMethod::Online,
            status: PaymentStatus::Paid,
            transaction_id,
        }
    }
}

/// Rental order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer: CustomerContact,
    pub items: Vec<CartLineItem>,
    /// Comma-joined listing names
    pub equipment_names: String,
    /// Distinct sellers, in cart order
    pub seller_ids: Vec<Uuid>,
    /// Comma-joined distinct seller names
    pub seller_names: String,
    pub subtotal: Decimal,
    pub platform_fee: Decimal,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub transaction_id: String,
    pub pickup_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub pickup_time: Option<NaiveTime>,
    pub order_pincode: Pincode,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn involves_seller(&self, seller_id: Uuid) -> bool {
        self.seller_ids.contains(&seller_id)
    }
}

/// Status change request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateOrderStatus {
    pub status: OrderStatus,
}
