//! Repository layer: one trait per collection, Postgres/Redis and in-memory backends

pub mod carts;
pub mod listings;
pub mod memory;
pub mod orders;
pub mod sessions;
pub mod settings;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        cart::Cart,
        listing::{Listing, ListingStatus},
        order::{Order, OrderStatus},
        pincode::Pincode,
        settings::PlatformSettings,
        user::{Role, User},
    },
};

/// Equality filters for listing queries; results are always newest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    pub status: Option<ListingStatus>,
    pub pincode: Option<Pincode>,
    pub category: Option<String>,
    pub seller_id: Option<Uuid>,
    pub featured: Option<bool>,
    pub limit: Option<usize>,
}

/// Equality filters for order queries; results are always newest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub customer_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
}

/// Profile fields to overwrite; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub business_name: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingsRepository: Send + Sync {
    async fn list(&self, filter: &ListingFilter) -> AppResult<Vec<Listing>>;
    async fn get(&self, id: Uuid) -> AppResult<Listing>;
    async fn create(&self, listing: &Listing) -> AppResult<()>;
    async fn set_status(&self, id: Uuid, status: ListingStatus) -> AppResult<Listing>;
    async fn set_featured(&self, id: Uuid, featured: bool) -> AppResult<Listing>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartsRepository: Send + Sync {
    /// Returns an empty cart when the owner has none
    async fn get(&self, owner_id: Uuid) -> AppResult<Cart>;
    async fn save(&self, cart: &Cart) -> AppResult<()>;
    async fn clear(&self, owner_id: Uuid) -> AppResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrdersRepository: Send + Sync {
    async fn create(&self, order: &Order) -> AppResult<()>;
    async fn get(&self, id: Uuid) -> AppResult<Order>;
    async fn list(&self, filter: &OrderFilter) -> AppResult<Vec<Order>>;
    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Order>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<User>;
    async fn list(&self, role: Option<Role>) -> AppResult<Vec<User>>;
    async fn create(&self, user: &User) -> AppResult<()>;
    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> AppResult<User>;
    async fn set_pincode(&self, id: Uuid, pincode: Option<Pincode>) -> AppResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// `None` when no record has been saved yet
    async fn get(&self) -> AppResult<Option<PlatformSettings>>;
    async fn save(&self, settings: &PlatformSettings) -> AppResult<()>;
}

/// Local-only pincode storage for visitors who are not logged in
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_pincode(&self, session_id: &str) -> AppResult<Option<Pincode>>;
    async fn set_pincode(&self, session_id: &str, pincode: &Pincode) -> AppResult<()>;
    async fn clear_pincode(&self, session_id: &str) -> AppResult<()>;
    async fn ping(&self) -> AppResult<()>;
}

/// Container of all persistence handles
#[derive(Clone)]
pub struct Repository {
    pub pool: Option<Pool<Postgres>>,
    pub listings: Arc<dyn ListingsRepository>,
    pub carts: Arc<dyn CartsRepository>,
    pub orders: Arc<dyn OrdersRepository>,
    pub users: Arc<dyn UsersRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub sessions: Arc<dyn SessionStore>,
}

impl Repository {
    /// Postgres-backed repository; anonymous sessions go to `sessions`
    pub fn postgres(pool: Pool<Postgres>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            listings: Arc::new(listings::PgListingsRepository::new(pool.clone())),
            carts: Arc::new(carts::PgCartsRepository::new(pool.clone())),
            orders: Arc::new(orders::PgOrdersRepository::new(pool.clone())),
            users: Arc::new(users::PgUsersRepository::new(pool.clone())),
            settings: Arc::new(settings::PgSettingsRepository::new(pool.clone())),
            pool: Some(pool),
            sessions,
        }
    }

    /// Everything held in process memory
    pub fn in_memory() -> Self {
        let store = memory::MemoryRepository::new();
        Self::from_memory(store)
    }

    pub fn from_memory(store: memory::MemoryRepository) -> Self {
        Self {
            pool: None,
            listings: Arc::new(store.clone()),
            carts: Arc::new(store.clone()),
            orders: Arc::new(store.clone()),
            users: Arc::new(store.clone()),
            settings: Arc::new(store.clone()),
            sessions: Arc::new(store),
        }
    }

    /// Check that the backends answer
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        self.sessions.ping().await
    }
}
