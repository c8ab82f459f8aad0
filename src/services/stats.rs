//! Statistics service

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        listing::{Listing, ListingStatus},
        order::{Order, OrderStatus},
        pincode::Pincode,
        user::{User, UserClaims},
    },
    repository::{ListingFilter, OrderFilter, Repository},
};

/// Admin dashboard figures
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct StatsResponse {
    pub users_by_role: BTreeMap<String, usize>,
    pub listings_by_status: BTreeMap<String, usize>,
    pub featured_listings: usize,
    pub orders_by_status: BTreeMap<String, usize>,
    /// Sum of order totals, cancelled and rejected orders excluded
    pub gross_revenue: Decimal,
    pub platform_fees: Decimal,
    /// Distinct pincodes with at least one approved listing
    pub served_pincodes: Vec<Pincode>,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_stats(&self, claims: &UserClaims) -> AppResult<StatsResponse> {
        claims.require_admin()?;

        let users = self.repository.users.list(None).await?;
        let listings = self.repository.listings.list(&ListingFilter::default()).await?;
        let orders = self.repository.orders.list(&OrderFilter::default()).await?;

        Ok(aggregate(&users, &listings, &orders))
    }
}

fn aggregate(users: &[User], listings: &[Listing], orders: &[Order]) -> StatsResponse {
    let mut stats = StatsResponse::default();

    for user in users {
        *stats.users_by_role.entry(user.role.to_string()).or_default() += 1;
    }

    let mut served = BTreeSet::new();
    for listing in listings {
        *stats
            .listings_by_status
            .entry(listing.status.to_string())
            .or_default() += 1;
        if listing.featured {
            stats.featured_listings += 1;
        }
        if listing.status == ListingStatus::Approved {
            if let Some(pincode) = &listing.pincode {
                served.insert(pincode.clone());
            }
        }
    }
    stats.served_pincodes = served.into_iter().collect();

    for order in orders {
        *stats
            .orders_by_status
            .entry(order.status.to_string())
            .or_default() += 1;
        if !matches!(order.status, OrderStatus::Cancelled | OrderStatus::Rejected) {
            stats.gross_revenue += order.total_amount;
            stats.platform_fees += order.platform_fee;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;
    use crate::{
        models::{order::PaymentRecord, user::Role},
        services::{
            orders::{snapshot, OrderTotals},
            test_support::*,
        },
    };

    fn order(status: OrderStatus) -> Order {
        let cart = cart_of(Uuid::new_v4(), vec![line("Tractor", Some("500001"))]);
        let mut order = snapshot(
            Uuid::new_v4(),
            &cart,
            crate::models::order::CustomerContact {
                name: "Anil".to_string(),
                phone: "9000000000".to_string(),
                email: None,
                address: None,
            },
            PaymentRecord::pay_on_pickup(),
            OrderTotals::compute(cart.subtotal(), Decimal::new(5, 2)),
            pin("500001"),
        );
        order.status = status;
        order
    }

    #[test]
    fn aggregates_collections() {
        let seller = user(Role::Seller, None);
        let users = vec![user(Role::Customer, None), user(Role::Customer, None), seller.clone()];

        let mut featured = listing(&seller, "A", Some("500002"), 1);
        featured.featured = true;
        let mut pending = listing(&seller, "B", Some("600001"), 2);
        pending.status = ListingStatus::Pending;
        let listings = vec![
            featured,
            pending,
            listing(&seller, "C", Some("500001"), 3),
            listing(&seller, "D", Some("500001"), 4),
            listing(&seller, "E", None, 5),
        ];

        let orders = vec![
            order(OrderStatus::Pending),
            order(OrderStatus::Completed),
            order(OrderStatus::Cancelled),
        ];

        let stats = aggregate(&users, &listings, &orders);
        assert_eq!(stats.users_by_role.get("customer"), Some(&2));
        assert_eq!(stats.users_by_role.get("seller"), Some(&1));
        assert_eq!(stats.listings_by_status.get("approved"), Some(&4));
        assert_eq!(stats.listings_by_status.get("pending"), Some(&1));
        assert_eq!(stats.featured_listings, 1);
        assert_eq!(stats.orders_by_status.get("cancelled"), Some(&1));
        assert_eq!(stats.gross_revenue, Decimal::new(420, 0));
        assert_eq!(stats.platform_fees, Decimal::new(20, 0));
        assert_eq!(stats.served_pincodes, vec![pin("500001"), pin("500002")]);
    }
}
