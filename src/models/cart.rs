//! Cart model and the cart/location classification

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::listing::RentalMode;
use super::pincode::Pincode;

/// One listing plus its rental terms inside a cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLineItem {
    pub listing_id: Uuid,
    pub listing_name: String,
    pub seller_id: Uuid,
    pub seller_name: Option<String>,
    pub rental_mode: RentalMode,
    pub rental_quantity: u32,
    /// Rate per unit at add time
    pub rate: Decimal,
    /// rate × rental_quantity
    pub price: Decimal,
    /// Copied from the listing at add time
    pub pincode: Option<Pincode>,
    pub pickup_date: Option<NaiveDate>,
    /// HH:MM[:SS]
    #[schema(value_type = Option<String>, example = "09:30:00")]
    pub pickup_time: Option<NaiveTime>,
    pub seller_address: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl CartLineItem {
    pub fn has_pickup_slot(&self) -> bool {
        self.pickup_date.is_some() && self.pickup_time.is_some()
    }
}

/// Per-user cart document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub owner_id: Uuid,
    pub items: Vec<CartLineItem>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Cart {
    pub fn empty(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            items: Vec::new(),
            updated_at: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(|i| i.price).sum()
    }

    /// Items grouped by their (present) pincode, ordered by pincode
    pub fn pincode_groups(&self) -> Vec<PincodeGroup> {
        let mut groups: BTreeMap<&Pincode, PincodeGroup> = BTreeMap::new();
        for item in &self.items {
            if let Some(pincode) = &item.pincode {
                let group = groups.entry(pincode).or_insert_with(|| PincodeGroup {
                    pincode: pincode.clone(),
                    item_count: 0,
                    item_names: Vec::new(),
                });
                group.item_count += 1;
                group.item_names.push(item.listing_name.clone());
            }
        }
        groups.into_values().collect()
    }

    /// The single pincode shared by every item, if there is exactly one and no
    /// item is missing its pincode
    pub fn shared_pincode(&self) -> Option<&Pincode> {
        let first = self.items.first()?.pincode.as_ref()?;
        self.items
            .iter()
            .all(|i| i.pincode.as_ref() == Some(first))
            .then_some(first)
    }

    /// Insert a line, replacing any existing line for the same listing
    pub fn upsert(&mut self, item: CartLineItem) {
        match self.items.iter_mut().find(|i| i.listing_id == item.listing_id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    /// Remove the line for a listing; returns whether one was removed
    pub fn remove(&mut self, listing_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.listing_id != listing_id);
        self.items.len() != before
    }

    /// Keep only the items located in `pincode`; returns how many were discarded
    pub fn retain_pincode(&mut self, pincode: &Pincode) -> usize {
        let before = self.items.len();
        self.items.retain(|i| i.pincode.as_ref() == Some(pincode));
        before - self.items.len()
    }

    pub fn items_missing_pickup_slot(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|i| !i.has_pickup_slot())
            .map(|i| i.listing_name.clone())
            .collect()
    }
}

/// Add-to-cart request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddToCart {
    pub listing_id: Uuid,
    pub rental_mode: RentalMode,
    pub rental_quantity: u32,
    pub pickup_date: Option<NaiveDate>,
    /// HH:MM[:SS]
    #[schema(value_type = Option<String>, example = "09:30:00")]
    pub pickup_time: Option<NaiveTime>,
}

/// Items of a cart that share one pincode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PincodeGroup {
    pub pincode: Pincode,
    pub item_count: usize,
    pub item_names: Vec<String>,
}

/// Result of comparing cart contents against the active location.
///
/// Exactly one classification applies to any cart and pincode state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartClassification {
    /// Nothing in the cart
    Empty,
    /// Items come from two or more pincodes; one must be kept
    MixedLocations { groups: Vec<PincodeGroup> },
    /// Cart pincode differs from the active location
    LocationMismatch {
        cart_pincode: Pincode,
        current_pincode: Pincode,
    },
    /// Active location is not set
    LocationRequired { cart_pincode: Pincode },
    /// Some items carry no pincode and must be re-added
    DataError { listing_ids: Vec<Uuid> },
    /// Checkout may proceed
    Compatible { pincode: Pincode },
}

impl CartClassification {
    pub fn is_compatible(&self) -> bool {
        matches!(self, CartClassification::Compatible { .. })
    }

    /// User-facing explanation
    pub fn message(&self) -> String {
        match self {
            CartClassification::Empty => "Your cart is empty".to_string(),
            CartClassification::MixedLocations { groups } => format!(
                "Your cart has equipment from {} different locations; choose one pincode to keep",
                groups.len()
            ),
            CartClassification::LocationMismatch {
                cart_pincode,
                current_pincode,
            } => format!(
                "Your cart has equipment from pincode {} but your location is set to {}",
                cart_pincode, current_pincode
            ),
            CartClassification::LocationRequired { cart_pincode } => format!(
                "Set your location to {} to check out this cart",
                cart_pincode
            ),
            CartClassification::DataError { listing_ids } => format!(
                "{} item(s) in your cart have no location; remove and add them again",
                listing_ids.len()
            ),
            CartClassification::Compatible { pincode } => {
                format!("All items are available in pincode {}", pincode)
            }
        }
    }
}
