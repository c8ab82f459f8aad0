//! In-memory backend for development and tests
//!
//! All collections live behind one `RwLock`-guarded store shared by clones.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    CartsRepository, ListingFilter, ListingsRepository, OrderFilter, OrdersRepository,
    ProfileChanges, SessionStore, SettingsRepository, UsersRepository,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        cart::Cart,
        listing::{Listing, ListingStatus},
        order::{Order, OrderStatus},
        pincode::Pincode,
        settings::PlatformSettings,
        user::{Role, User},
    },
};

#[derive(Default)]
struct Store {
    users: HashMap<Uuid, User>,
    listings: HashMap<Uuid, Listing>,
    carts: HashMap<Uuid, Cart>,
    orders: HashMap<Uuid, Order>,
    settings: Option<PlatformSettings>,
    sessions: HashMap<String, Pincode>,
}

#[derive(Clone, Default)]
pub struct MemoryRepository {
    store: Arc<RwLock<Store>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, Store>> {
        self.store
            .read()
            .map_err(|e| AppError::Internal(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, Store>> {
        self.store
            .write()
            .map_err(|e| AppError::Internal(format!("Failed to acquire write lock: {}", e)))
    }
}

#[async_trait]
impl ListingsRepository for MemoryRepository {
    async fn list(&self, filter: &ListingFilter) -> AppResult<Vec<Listing>> {
        let store = self.read()?;
        let mut listings: Vec<Listing> = store
            .listings
            .values()
            .filter(|l| {
                filter.status.map_or(true, |s| l.status == s)
                    && filter
                        .pincode
                        .as_ref()
                        .map_or(true, |p| l.pincode.as_ref() == Some(p))
                    && filter.category.as_ref().map_or(true, |c| &l.category == c)
                    && filter.seller_id.map_or(true, |s| l.seller_id == s)
                    && filter.featured.map_or(true, |f| l.featured == f)
            })
            .cloned()
            .collect();
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = filter.limit {
            listings.truncate(limit);
        }
        Ok(listings)
    }

    async fn get(&self, id: Uuid) -> AppResult<Listing> {
        self.read()?
            .listings
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", id)))
    }

    async fn create(&self, listing: &Listing) -> AppResult<()> {
        self.write()?.listings.insert(listing.id, listing.clone());
        Ok(())
    }

    async fn set_status(&self, id: Uuid, status: ListingStatus) -> AppResult<Listing> {
        let mut store = self.write()?;
        let listing = store
            .listings
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", id)))?;
        listing.status = status;
        listing.updated_at = Some(Utc::now());
        Ok(listing.clone())
    }

    async fn set_featured(&self, id: Uuid, featured: bool) -> AppResult<Listing> {
        let mut store = self.write()?;
        let listing = store
            .listings
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", id)))?;
        listing.featured = featured;
        listing.updated_at = Some(Utc::now());
        Ok(listing.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.write()?
            .listings
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", id)))
    }
}

#[async_trait]
impl CartsRepository for MemoryRepository {
    async fn get(&self, owner_id: Uuid) -> AppResult<Cart> {
        Ok(self
            .read()?
            .carts
            .get(&owner_id)
            .cloned()
            .unwrap_or_else(|| Cart::empty(owner_id)))
    }

    async fn save(&self, cart: &Cart) -> AppResult<()> {
        let mut cart = cart.clone();
        cart.updated_at = Some(Utc::now());
        self.write()?.carts.insert(cart.owner_id, cart);
        Ok(())
    }

    async fn clear(&self, owner_id: Uuid) -> AppResult<()> {
        self.write()?.carts.remove(&owner_id);
        Ok(())
    }
}

#[async_trait]
impl OrdersRepository for MemoryRepository {
    async fn create(&self, order: &Order) -> AppResult<()> {
        let mut store = self.write()?;
        if store.orders.contains_key(&order.id) {
            return Err(AppError::Internal(format!("Order {} already exists", order.id)));
        }
        store.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> AppResult<Order> {
        self.read()?
            .orders
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))
    }

    async fn list(&self, filter: &OrderFilter) -> AppResult<Vec<Order>> {
        let store = self.read()?;
        let mut orders: Vec<Order> = store
            .orders
            .values()
            .filter(|o| {
                filter.customer_id.map_or(true, |c| o.customer_id == c)
                    && filter.seller_id.map_or(true, |s| o.involves_seller(s))
                    && filter.status.map_or(true, |s| o.status == s)
            })
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Order> {
        let mut store = self.write()?;
        let order = store
            .orders
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))?;
        order.status = status;
        order.updated_at = Some(at);
        Ok(order.clone())
    }
}

#[async_trait]
impl UsersRepository for MemoryRepository {
    async fn get(&self, id: Uuid) -> AppResult<User> {
        self.read()?
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    async fn list(&self, role: Option<Role>) -> AppResult<Vec<User>> {
        let store = self.read()?;
        let mut users: Vec<User> = store
            .users
            .values()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn create(&self, user: &User) -> AppResult<()> {
        self.write()?.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> AppResult<User> {
        let mut store = self.write()?;
        let user = store
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if changes.phone.is_some() {
            user.phone = changes.phone;
        }
        if changes.address.is_some() {
            user.address = changes.address;
        }
        if changes.business_name.is_some() {
            user.business_name = changes.business_name;
        }
        Ok(user.clone())
    }

    async fn set_pincode(&self, id: Uuid, pincode: Option<Pincode>) -> AppResult<()> {
        let mut store = self.write()?;
        let user = store
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        user.pincode = pincode;
        Ok(())
    }
}

#[async_trait]
impl SettingsRepository for MemoryRepository {
    async fn get(&self) -> AppResult<Option<PlatformSettings>> {
        Ok(self.read()?.settings.clone())
    }

    async fn save(&self, settings: &PlatformSettings) -> AppResult<()> {
        self.write()?.settings = Some(settings.clone());
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryRepository {
    async fn get_pincode(&self, session_id: &str) -> AppResult<Option<Pincode>> {
        Ok(self.read()?.sessions.get(session_id).cloned())
    }

    async fn set_pincode(&self, session_id: &str, pincode: &Pincode) -> AppResult<()> {
        self.write()?
            .sessions
            .insert(session_id.to_string(), pincode.clone());
        Ok(())
    }

    async fn clear_pincode(&self, session_id: &str) -> AppResult<()> {
        self.write()?.sessions.remove(session_id);
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        self.read().map(|_| ())
    }
}
