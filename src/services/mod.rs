//! Business logic services

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod directory;
pub mod orders;
pub mod payment;
pub mod pincode;
pub mod readiness;
pub mod settings;
pub mod stats;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    error::AppResult,
    repository::Repository,
};

use self::{directory::LocationDirectory, payment::PaymentGateway};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub pincode: pincode::PincodeService,
    pub catalog: catalog::CatalogService,
    pub cart: cart::CartService,
    pub checkout: checkout::CheckoutService,
    pub orders: orders::OrderService,
    pub users: users::UsersService,
    pub stats: stats::StatsService,
    pub settings: settings::SettingsService,
    repository: Repository,
}

impl Services {
    /// Create all services over the given repository and external clients
    pub fn new(
        repository: Repository,
        config: &AppConfig,
        directory: Arc<dyn LocationDirectory>,
        payment: Arc<dyn PaymentGateway>,
    ) -> Self {
        let pincode = pincode::PincodeService::new(repository.clone(), directory);
        let settings = settings::SettingsService::new(
            repository.clone(),
            config.marketplace.platform_fee_rate,
        );
        let orders = orders::OrderService::new(repository.clone());

        Self {
            catalog: catalog::CatalogService::new(
                repository.clone(),
                config.marketplace.featured_limit,
            ),
            cart: cart::CartService::new(repository.clone(), pincode.clone()),
            checkout: checkout::CheckoutService::new(
                repository.clone(),
                pincode.clone(),
                settings.clone(),
                orders.clone(),
                payment,
                config.marketplace.currency.clone(),
            ),
            users: users::UsersService::new(repository.clone(), pincode.clone()),
            stats: stats::StatsService::new(repository.clone()),
            pincode,
            settings,
            orders,
            repository,
        }
    }

    /// Check that the persistence and session backends answer
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
