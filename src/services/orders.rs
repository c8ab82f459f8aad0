//! Order placement and the order lifecycle

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        cart::Cart,
        order::{CustomerContact, Order, OrderStatus, PaymentRecord},
        pincode::Pincode,
        user::{Role, UserClaims},
    },
    repository::{OrderFilter, Repository},
};

/// Amounts charged for one order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub platform_fee: Decimal,
    pub total_amount: Decimal,
}

impl OrderTotals {
    /// Fee is `subtotal × rate` rounded to paise
    pub fn compute(subtotal: Decimal, fee_rate: Decimal) -> Self {
        let platform_fee = (subtotal * fee_rate).round_dp(2);
        Self {
            subtotal,
            platform_fee,
            total_amount: subtotal + platform_fee,
        }
    }
}

/// Build the order snapshot of a checked-out cart
pub fn snapshot(
    id: Uuid,
    cart: &Cart,
    contact: CustomerContact,
    payment: PaymentRecord,
    totals: OrderTotals,
    pincode: Pincode,
) -> Order {
    let mut seller_ids: Vec<Uuid> = Vec::new();
    let mut seller_names: Vec<&str> = Vec::new();
    for item in &cart.items {
        if !seller_ids.contains(&item.seller_id) {
            seller_ids.push(item.seller_id);
        }
        if let Some(name) = item.seller_name.as_deref().filter(|n| !n.is_empty()) {
            if !seller_names.contains(&name) {
                seller_names.push(name);
            }
        }
    }

    let equipment_names = cart
        .items
        .iter()
        .map(|i| i.listing_name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let first = cart.items.first();

    Order {
        id,
        customer_id: cart.owner_id,
        customer: contact,
        items: cart.items.clone(),
        equipment_names,
        seller_names: seller_names.join(", "),
        seller_ids,
        subtotal: totals.subtotal,
        platform_fee: totals.platform_fee,
        total_amount: totals.total_amount,
        status: OrderStatus::Pending,
        payment_status: payment.status,
        payment_method: payment.method,
        transaction_id: payment.transaction_id,
        pickup_date: first.and_then(|i| i.pickup_date),
        pickup_time: first.and_then(|i| i.pickup_time),
        order_pincode: pincode,
        created_at: Utc::now(),
        updated_at: None,
    }
}

#[derive(Clone)]
pub struct OrderService {
    repository: Repository,
}

impl OrderService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Persist the order, then clear the cart.
    ///
    /// The cart is only cleared once the order write has succeeded; a failed
    /// write leaves it intact.
    pub async fn place(
        &self,
        order_id: Uuid,
        cart: &Cart,
        contact: CustomerContact,
        payment: PaymentRecord,
        totals: OrderTotals,
        pincode: Pincode,
    ) -> AppResult<Order> {
        let order = snapshot(order_id, cart, contact, payment, totals, pincode);

        if let Err(e) = self.repository.orders.create(&order).await {
            tracing::error!(
                order_id = %order.id,
                customer_id = %order.customer_id,
                transaction_id = %order.transaction_id,
                "Order write failed: {}",
                e
            );
            return Err(AppError::PlacementFailed(e.to_string()));
        }

        if let Err(e) = self.repository.carts.clear(cart.owner_id).await {
            tracing::warn!(
                order_id = %order.id,
                "Order placed but the cart could not be cleared: {}",
                e
            );
        }

        tracing::info!(
            order_id = %order.id,
            customer_id = %order.customer_id,
            total = %order.total_amount,
            method = order.payment_method.as_str(),
            "Order placed"
        );
        Ok(order)
    }

    pub async fn get(&self, claims: &UserClaims, id: Uuid) -> AppResult<Order> {
        let order = self.repository.orders.get(id).await?;
        let visible = claims.is_admin()
            || order.customer_id == claims.user_id
            || order.involves_seller(claims.user_id);
        if !visible {
            return Err(AppError::Authorization(
                "You do not have access to this order".to_string(),
            ));
        }
        Ok(order)
    }

    /// Orders placed by the caller
    pub async fn customer_orders(&self, claims: &UserClaims) -> AppResult<Vec<Order>> {
        self.repository
            .orders
            .list(&OrderFilter {
                customer_id: Some(claims.user_id),
                ..OrderFilter::default()
            })
            .await
    }

    /// Orders containing at least one of the caller's listings
    pub async fn seller_orders(
        &self,
        claims: &UserClaims,
        status: Option<OrderStatus>,
    ) -> AppResult<Vec<Order>> {
        claims.require_seller()?;
        self.repository
            .orders
            .list(&OrderFilter {
                seller_id: Some(claims.user_id),
                status,
                ..OrderFilter::default()
            })
            .await
    }

    pub async fn all_orders(
        &self,
        claims: &UserClaims,
        status: Option<OrderStatus>,
    ) -> AppResult<Vec<Order>> {
        claims.require_admin()?;
        self.repository
            .orders
            .list(&OrderFilter {
                status,
                ..OrderFilter::default()
            })
            .await
    }

    /// Move an order along its lifecycle.
    ///
    /// Sellers confirm, complete, reject or cancel orders that include their
    /// listings; customers may only cancel their own pending orders.
    pub async fn update_status(
        &self,
        claims: &UserClaims,
        id: Uuid,
        next: OrderStatus,
    ) -> AppResult<Order> {
        let order = self.repository.orders.get(id).await?;

        let permitted = match claims.role {
            Role::Admin => true,
            Role::Seller if order.involves_seller(claims.user_id) => true,
            _ if order.customer_id == claims.user_id => {
                next == OrderStatus::Cancelled && order.status == OrderStatus::Pending
            }
            _ => false,
        };
        if !permitted {
            return Err(AppError::Authorization(
                "You cannot change the status of this order".to_string(),
            ));
        }

        if !order.status.can_transition_to(next) {
            return Err(AppError::BusinessRule(format!(
                "Cannot move an order from {} to {}",
                order.status, next
            )));
        }

        let updated = self
            .repository
            .orders
            .update_status(id, next, Utc::now())
            .await?;
        tracing::info!(order_id = %id, from = %order.status, to = %next, "Order status changed");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        models::order::{PaymentMethod, PaymentStatus, PAY_ON_PICKUP_TRANSACTION},
        repository::MockOrdersRepository,
        services::test_support::*,
    };

    fn contact() -> CustomerContact {
        CustomerContact {
            name: "Ravi Kumar".to_string(),
            phone: "9876543210".to_string(),
            email: None,
            address: Some("Plot 4, Shamirpet".to_string()),
        }
    }

    #[test]
    fn totals_round_fee() {
        let totals = OrderTotals::compute(Decimal::new(33333, 2), Decimal::new(5, 2));
        assert_eq!(totals.platform_fee, Decimal::new(1667, 2));
        assert_eq!(totals.total_amount, Decimal::new(35000, 2));
    }

    #[test]
    fn snapshot_aggregates_display_fields() {
        let owner = Uuid::new_v4();
        let mut a = line("Tractor", Some("500001"));
        let mut b = line("Seeder", Some("500001"));
        let c = line("Sprayer", Some("500001"));
        b.seller_id = a.seller_id;
        b.seller_name = a.seller_name.clone();
        a.pickup_time = chrono::NaiveTime::from_hms_opt(7, 0, 0);
        let cart = cart_of(owner, vec![a.clone(), b, c.clone()]);

        let order = snapshot(
            Uuid::new_v4(),
            &cart,
            contact(),
            PaymentRecord::pay_on_pickup(),
            OrderTotals::compute(cart.subtotal(), Decimal::new(5, 2)),
            pin("500001"),
        );

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.equipment_names, "Tractor, Seeder, Sprayer");
        assert_eq!(order.seller_ids, vec![a.seller_id, c.seller_id]);
        assert_eq!(order.seller_names, "Tractor Rentals, Sprayer Rentals");
        assert_eq!(order.pickup_time, a.pickup_time);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.payment_method, PaymentMethod::PayOnPickup);
        assert_eq!(order.transaction_id, PAY_ON_PICKUP_TRANSACTION);
        assert_eq!(order.total_amount, Decimal::new(630, 0));
    }

    #[tokio::test]
    async fn failed_write_keeps_cart() {
        let mut repository = Repository::in_memory();
        let customer = seed_user(&repository, Role::Customer, None).await;
        let cart = cart_of(
            customer.id,
            vec![line("Tractor", Some("500001")), line("Seeder", Some("500001"))],
        );
        repository.carts.save(&cart).await.unwrap();

        let mut orders = MockOrdersRepository::new();
        orders
            .expect_create()
            .times(1)
            .returning(|_| Err(AppError::Internal("disk full".to_string())));
        repository.orders = Arc::new(orders);

        let svc = OrderService::new(repository.clone());
        let err = svc
            .place(
                Uuid::new_v4(),
                &cart,
                contact(),
                PaymentRecord::online("txn_1".to_string()),
                OrderTotals::compute(cart.subtotal(), Decimal::new(5, 2)),
                pin("500001"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PlacementFailed(_)));
        assert_eq!(repository.carts.get(customer.id).await.unwrap().items, cart.items);
    }

    #[tokio::test]
    async fn successful_write_clears_cart() {
        let repository = Repository::in_memory();
        let customer = seed_user(&repository, Role::Customer, None).await;
        let cart = cart_of(customer.id, vec![line("Tractor", Some("500001"))]);
        repository.carts.save(&cart).await.unwrap();

        let svc = OrderService::new(repository.clone());
        let order = svc
            .place(
                Uuid::new_v4(),
                &cart,
                contact(),
                PaymentRecord::online("txn_2".to_string()),
                OrderTotals::compute(cart.subtotal(), Decimal::new(5, 2)),
                pin("500001"),
            )
            .await
            .unwrap();

        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert!(repository.carts.get(customer.id).await.unwrap().is_empty());
        assert_eq!(repository.orders.get(order.id).await.unwrap(), order);
    }

    #[tokio::test]
    async fn lifecycle_permissions() {
        let repository = Repository::in_memory();
        let customer = seed_user(&repository, Role::Customer, None).await;
        let seller = seed_user(&repository, Role::Seller, None).await;
        let other_seller = seed_user(&repository, Role::Seller, None).await;

        let mut item = line("Tractor", Some("500001"));
        item.seller_id = seller.id;
        let cart = cart_of(customer.id, vec![item]);
        let svc = OrderService::new(repository.clone());
        let order = svc
            .place(
                Uuid::new_v4(),
                &cart,
                contact(),
                PaymentRecord::pay_on_pickup(),
                OrderTotals::compute(cart.subtotal(), Decimal::new(5, 2)),
                pin("500001"),
            )
            .await
            .unwrap();

        let customer_claims = UserClaims::new(customer.id, Role::Customer, 1);
        let seller_claims = UserClaims::new(seller.id, Role::Seller, 1);
        let other_claims = UserClaims::new(other_seller.id, Role::Seller, 1);

        assert!(matches!(
            svc.update_status(&other_claims, order.id, OrderStatus::Active).await,
            Err(AppError::Authorization(_))
        ));
        assert!(matches!(
            svc.update_status(&customer_claims, order.id, OrderStatus::Active).await,
            Err(AppError::Authorization(_))
        ));

        let active = svc
            .update_status(&seller_claims, order.id, OrderStatus::Active)
            .await
            .unwrap();
        assert_eq!(active.status, OrderStatus::Active);
        assert!(active.updated_at.is_some());

        // Customers can only cancel while pending
        assert!(matches!(
            svc.update_status(&customer_claims, order.id, OrderStatus::Cancelled).await,
            Err(AppError::Authorization(_))
        ));
        assert!(matches!(
            svc.update_status(&seller_claims, order.id, OrderStatus::Pending).await,
            Err(AppError::BusinessRule(_))
        ));

        svc.update_status(&seller_claims, order.id, OrderStatus::Completed)
            .await
            .unwrap();
        assert_eq!(svc.seller_orders(&seller_claims, None).await.unwrap().len(), 1);
        assert!(svc.seller_orders(&other_claims, None).await.unwrap().is_empty());
        assert_eq!(svc.customer_orders(&customer_claims).await.unwrap().len(), 1);
        assert!(matches!(
            svc.all_orders(&seller_claims, None).await,
            Err(AppError::Authorization(_))
        ));
    }
}
