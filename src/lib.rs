//! AgriRent marketplace server
//!
//! Farm equipment rental marketplace partitioned by Indian postal pincode:
//! location state, catalog filtering, cart/location consistency, checkout and
//! order placement, served as a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
