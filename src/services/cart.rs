//! Cart operations and the cart/location consistency check
//!
//! A cart holds equipment from a single pincode. Insertion refuses items from a
//! different pincode, but a cart can still become mixed through another session,
//! so [`classify`] runs again on every load.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        cart::{AddToCart, Cart, CartClassification, CartLineItem},
        pincode::Pincode,
        user::Viewer,
    },
    repository::Repository,
    services::pincode::{CompatibilityResult, PincodeChange, PincodeService},
};

/// Classify a cart against the active pincode.
///
/// Evaluated in priority order: empty, mixed locations, missing item pincode,
/// then the comparison of the single shared pincode with `current`.
pub fn classify(cart: &Cart, current: Option<&Pincode>) -> CartClassification {
    if cart.is_empty() {
        return CartClassification::Empty;
    }

    let groups = cart.pincode_groups();
    if groups.len() >= 2 {
        return CartClassification::MixedLocations { groups };
    }

    let unlocated: Vec<Uuid> = cart
        .items
        .iter()
        .filter(|i| i.pincode.is_none())
        .map(|i| i.listing_id)
        .collect();

    let cart_pincode = match groups.into_iter().next() {
        Some(group) if unlocated.is_empty() => group.pincode,
        _ => {
            return CartClassification::DataError {
                listing_ids: unlocated,
            }
        }
    };

    match current {
        None => CartClassification::LocationRequired { cart_pincode },
        Some(current) if *current != cart_pincode => CartClassification::LocationMismatch {
            cart_pincode,
            current_pincode: current.clone(),
        },
        Some(_) => CartClassification::Compatible {
            pincode: cart_pincode,
        },
    }
}

/// Cart as shown on the cart page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartView {
    pub cart: Cart,
    pub current_pincode: Option<Pincode>,
    pub classification: CartClassification,
    pub subtotal: Decimal,
}

/// How to resolve a single-pincode cart that does not match the active location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LocationResolution {
    /// Switch the active location to the cart's pincode
    AdoptCartPincode,
    /// Empty the cart and keep the active location
    DiscardCart,
}

/// Result of a resolution action
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResolutionOutcome {
    pub cart: Cart,
    pub classification: CartClassification,
    /// Set when the active location was switched
    pub pincode_change: Option<PincodeChange>,
    pub compatibility: Option<CompatibilityResult>,
    pub discarded_items: usize,
}

#[derive(Clone)]
pub struct CartService {
    repository: Repository,
    pincode: PincodeService,
}

impl CartService {
    pub fn new(repository: Repository, pincode: PincodeService) -> Self {
        Self {
            repository,
            pincode,
        }
    }

    /// Fresh cart and classification; never cached
    pub async fn load(&self, viewer: &Viewer) -> AppResult<CartView> {
        let user_id = viewer.require_user()?.user_id;
        let cart = self.repository.carts.get(user_id).await?;
        let state = self.pincode.load(viewer).await?;
        let current = state.get().cloned();
        let classification = classify(&cart, current.as_ref());

        if !matches!(
            classification,
            CartClassification::Empty | CartClassification::Compatible { .. }
        ) {
            tracing::debug!(user_id = %user_id, ?classification, "Cart needs location resolution");
        }

        Ok(CartView {
            subtotal: cart.subtotal(),
            cart,
            current_pincode: current,
            classification,
        })
    }

    /// Add a listing, replacing any existing line for it
    pub async fn add_item(&self, viewer: &Viewer, request: AddToCart) -> AppResult<Cart> {
        let user_id = viewer.require_user()?.user_id;

        let (pickup_date, pickup_time) = match (request.pickup_date, request.pickup_time) {
            (Some(date), Some(time)) => (date, time),
            _ => {
                return Err(AppError::MissingPickupSlot(vec![format!(
                    "listing {}",
                    request.listing_id
                )]))
            }
        };
        if request.rental_quantity == 0 {
            return Err(AppError::Validation(
                "Rental quantity must be at least 1".to_string(),
            ));
        }

        let listing = self.repository.listings.get(request.listing_id).await?;
        let pincode = match (&listing.pincode, listing.is_orderable()) {
            (Some(pincode), true) => pincode.clone(),
            (None, _) => {
                return Err(AppError::ListingNotOrderable(format!(
                    "{} has no pincode",
                    listing.name
                )))
            }
            (Some(_), false) => {
                return Err(AppError::ListingNotOrderable(format!(
                    "{} is not available",
                    listing.name
                )))
            }
        };

        let rate = listing.rate_for(request.rental_mode);
        if rate <= Decimal::ZERO {
            return Err(AppError::ListingNotOrderable(format!(
                "{} is not offered per {}",
                listing.name,
                request.rental_mode.unit()
            )));
        }

        let mut cart = self.repository.carts.get(user_id).await?;

        let others: Vec<&CartLineItem> = cart
            .items
            .iter()
            .filter(|i| i.listing_id != listing.id)
            .collect();
        if let Some(existing) = others.iter().find_map(|i| i.pincode.as_ref()) {
            if *existing != pincode {
                return Err(AppError::ListingLocationMismatch {
                    cart_pincode: existing.clone(),
                    listing_pincode: pincode,
                });
            }
        }

        cart.upsert(CartLineItem {
            listing_id: listing.id,
            listing_name: listing.name.clone(),
            seller_id: listing.seller_id,
            seller_name: listing.seller_name.clone(),
            rental_mode: request.rental_mode,
            rental_quantity: request.rental_quantity,
            rate,
            price: rate * Decimal::from(request.rental_quantity),
            pincode: Some(pincode),
            pickup_date: Some(pickup_date),
            pickup_time: Some(pickup_time),
            seller_address: listing.seller_address.clone(),
            added_at: Utc::now(),
        });

        self.repository.carts.save(&cart).await?;
        tracing::info!(user_id = %user_id, listing_id = %listing.id, "Added to cart");
        Ok(cart)
    }

    pub async fn remove_item(&self, viewer: &Viewer, listing_id: Uuid) -> AppResult<Cart> {
        let user_id = viewer.require_user()?.user_id;
        let mut cart = self.repository.carts.get(user_id).await?;
        if !cart.remove(listing_id) {
            return Err(AppError::NotFound(format!(
                "Listing {} is not in the cart",
                listing_id
            )));
        }
        self.repository.carts.save(&cart).await?;
        Ok(cart)
    }

    pub async fn clear(&self, viewer: &Viewer) -> AppResult<()> {
        let user_id = viewer.require_user()?.user_id;
        self.repository.carts.clear(user_id).await
    }

    /// Keep only the items from `selection` and make it the active location
    pub async fn resolve_mixed(
        &self,
        viewer: &Viewer,
        selection: &str,
    ) -> AppResult<ResolutionOutcome> {
        let user_id = viewer.require_user()?.user_id;
        let selection = Pincode::parse(selection)?;

        let mut cart = self.repository.carts.get(user_id).await?;
        let groups = cart.pincode_groups();
        if !groups.iter().any(|g| g.pincode == selection) {
            return Err(AppError::Validation(format!(
                "Pincode {} is not one of the cart's locations",
                selection
            )));
        }

        let discarded_items = cart.retain_pincode(&selection);
        self.repository.carts.save(&cart).await?;

        let (compatibility, change) = self.pincode.switch_to(viewer, selection.clone()).await?;
        tracing::info!(
            user_id = %user_id,
            kept = %selection,
            discarded_items,
            "Resolved mixed-location cart"
        );

        Ok(ResolutionOutcome {
            classification: classify(&cart, Some(&selection)),
            cart,
            pincode_change: Some(change),
            compatibility: Some(compatibility),
            discarded_items,
        })
    }

    /// Resolve a location mismatch or a missing location
    pub async fn resolve_location(
        &self,
        viewer: &Viewer,
        action: LocationResolution,
    ) -> AppResult<ResolutionOutcome> {
        let view = self.load(viewer).await?;

        let cart_pincode = match &view.classification {
            CartClassification::LocationMismatch { cart_pincode, .. }
            | CartClassification::LocationRequired { cart_pincode } => cart_pincode.clone(),
            other => {
                return Err(AppError::BusinessRule(format!(
                    "Nothing to resolve: {}",
                    other.message()
                )))
            }
        };

        match action {
            LocationResolution::AdoptCartPincode => {
                let (compatibility, change) =
                    self.pincode.switch_to(viewer, cart_pincode.clone()).await?;
                Ok(ResolutionOutcome {
                    classification: classify(&view.cart, Some(&cart_pincode)),
                    cart: view.cart,
                    pincode_change: Some(change),
                    compatibility: Some(compatibility),
                    discarded_items: 0,
                })
            }
            LocationResolution::DiscardCart => {
                let discarded_items = view.cart.items.len();
                self.repository.carts.clear(view.cart.owner_id).await?;
                let cart = Cart::empty(view.cart.owner_id);
                Ok(ResolutionOutcome {
                    classification: classify(&cart, view.current_pincode.as_ref()),
                    cart,
                    pincode_change: None,
                    compatibility: None,
                    discarded_items,
                })
            }
        }
    }
}
