//! Checkout gate and order submission
//!
//! The gate runs its preconditions in a fixed order and stops at the first
//! failure. Location checks run a second time against freshly read state right
//! before totals are computed.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        cart::{Cart, CartClassification},
        order::{CustomerContact, Order, PaymentMethod, PaymentRecord},
        pincode::Pincode,
        user::Viewer,
    },
    repository::Repository,
    services::{
        cart::classify,
        orders::{OrderService, OrderTotals},
        payment::{ChargeRequest, PaymentGateway},
        pincode::PincodeService,
        settings::SettingsService,
    },
};

/// Payable amount shown on the checkout page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckoutSummary {
    pub cart: Cart,
    pub pincode: Pincode,
    pub fee_rate: Decimal,
    pub totals: OrderTotals,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub contact: CustomerContact,
    pub payment_method: PaymentMethod,
}

#[derive(Clone)]
pub struct CheckoutService {
    repository: Repository,
    pincode: PincodeService,
    settings: SettingsService,
    orders: OrderService,
    payment: Arc<dyn PaymentGateway>,
    currency: String,
}

impl CheckoutService {
    pub fn new(
        repository: Repository,
        pincode: PincodeService,
        settings: SettingsService,
        orders: OrderService,
        payment: Arc<dyn PaymentGateway>,
        currency: String,
    ) -> Self {
        Self {
            repository,
            pincode,
            settings,
            orders,
            payment,
            currency,
        }
    }

    /// Run every precondition and compute the payable amount
    pub async fn summary(&self, viewer: &Viewer) -> AppResult<CheckoutSummary> {
        let user_id = viewer.require_user()?.user_id;

        let cart = self.repository.carts.get(user_id).await?;
        if cart.is_empty() {
            return Err(AppError::EmptyCart);
        }

        let missing = cart.items_missing_pickup_slot();
        if !missing.is_empty() {
            return Err(AppError::MissingPickupSlot(missing));
        }

        self.check_location(viewer, &cart).await?;

        // Re-read before showing the amount; another session may have changed either
        let cart = self.repository.carts.get(user_id).await?;
        let pincode = self.check_location(viewer, &cart).await?;

        let fee_rate = self.settings.fee_rate().await?;
        Ok(CheckoutSummary {
            totals: OrderTotals::compute(cart.subtotal(), fee_rate),
            cart,
            pincode,
            fee_rate,
            currency: self.currency.clone(),
        })
    }

    /// Active pincode is set and the cart is compatible with it
    async fn check_location(&self, viewer: &Viewer, cart: &Cart) -> AppResult<Pincode> {
        let state = self.pincode.load(viewer).await?;
        let current = state.get().ok_or(AppError::PincodeRequired)?;

        match classify(cart, Some(current)) {
            CartClassification::Compatible { pincode } => Ok(pincode),
            CartClassification::Empty => Err(AppError::EmptyCart),
            conflict => Err(AppError::CartConflict(conflict)),
        }
    }

    /// Pass the gate, collect payment, then place the order
    pub async fn place_order(
        &self,
        viewer: &Viewer,
        request: PlaceOrderRequest,
    ) -> AppResult<Order> {
        let summary = self.summary(viewer).await?;
        request
            .contact
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let order_id = Uuid::new_v4();
        let payment = match request.payment_method {
            PaymentMethod::PayOnPickup => PaymentRecord::pay_on_pickup(),
            PaymentMethod::Online => {
                let receipt = self
                    .payment
                    .charge(ChargeRequest {
                        reference: order_id,
                        customer_id: summary.cart.owner_id,
                        amount: summary.totals.total_amount,
                        currency: summary.currency.clone(),
                        description: format!("Equipment rental at {}", summary.pincode),
                    })
                    .await
                    .map_err(|e| match e {
                        AppError::PaymentFailed(_) => e,
                        other => AppError::PaymentFailed(other.to_string()),
                    })?;
                PaymentRecord::online(receipt.transaction_id)
            }
        };

        self.orders
            .place(
                order_id,
                &summary.cart,
                request.contact,
                payment,
                summary.totals,
                summary.pincode,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use mockall::Sequence;

    use super::*;
    use crate::{
        models::{
            order::{OrderStatus, PaymentStatus},
            user::Role,
        },
        repository::{MockCartsRepository, MockUsersRepository, OrderFilter},
        services::{
            directory::MockLocationDirectory, payment::{ChargeReceipt, MockPaymentGateway},
            test_support::*,
        },
    };

    fn service(repository: &Repository, payment: MockPaymentGateway) -> CheckoutService {
        let pincode = PincodeService::new(repository.clone(), Arc::new(MockLocationDirectory::new()));
        CheckoutService::new(
            repository.clone(),
            pincode,
            SettingsService::new(repository.clone(), Decimal::new(5, 2)),
            OrderService::new(repository.clone()),
            Arc::new(payment),
            "INR".to_string(),
        )
    }

    fn request(method: PaymentMethod) -> PlaceOrderRequest {
        PlaceOrderRequest {
            contact: CustomerContact {
                name: "Lakshmi Devi".to_string(),
                phone: "9123456780".to_string(),
                email: Some("lakshmi@example.com".to_string()),
                address: None,
            },
            payment_method: method,
        }
    }

    fn no_payment() -> MockPaymentGateway {
        let mut payment = MockPaymentGateway::new();
        payment.expect_charge().never();
        payment
    }

    async fn order_count(repository: &Repository) -> usize {
        repository.orders.list(&OrderFilter::default()).await.unwrap().len()
    }

    #[tokio::test]
    async fn missing_pickup_time_stops_before_any_call() {
        let repository = Repository::in_memory();
        let customer = seed_user(&repository, Role::Customer, Some("500001")).await;
        let mut item = line("Tractor", Some("500001"));
        item.pickup_time = None;
        let cart = cart_of(customer.id, vec![item]);
        repository.carts.save(&cart).await.unwrap();

        let svc = service(&repository, no_payment());
        let err = svc
            .place_order(&viewer_for(&customer), request(PaymentMethod::Online))
            .await
            .unwrap_err();

        match err {
            AppError::MissingPickupSlot(names) => assert_eq!(names, vec!["Tractor".to_string()]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(order_count(&repository).await, 0);
        assert_eq!(repository.carts.get(customer.id).await.unwrap().items, cart.items);
    }

    #[tokio::test]
    async fn cart_changed_between_checks_blocks_checkout() {
        let mut repository = Repository::in_memory();
        let customer = seed_user(&repository, Role::Customer, Some("500001")).await;
        let first = cart_of(customer.id, vec![line("Tractor", Some("500001"))]);
        let second = cart_of(
            customer.id,
            vec![line("Tractor", Some("500001")), line("Seeder", Some("500002"))],
        );

        let mut seq = Sequence::new();
        let mut carts = MockCartsRepository::new();
        carts
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(first.clone()));
        carts
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(second.clone()));
        carts.expect_save().never();
        carts.expect_clear().never();

        repository.carts = Arc::new(carts);
        let svc = service(&repository, no_payment());

        let err = svc
            .place_order(&viewer_for(&customer), request(PaymentMethod::Online))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::CartConflict(CartClassification::MixedLocations { .. })
        ));
        assert_eq!(order_count(&repository).await, 0);
    }

    #[tokio::test]
    async fn location_changed_between_checks_blocks_checkout() {
        let mut repository = Repository::in_memory();
        let at_cart = user(Role::Customer, Some("500001"));
        let mut moved = at_cart.clone();
        moved.pincode = Some(pin("500002"));
        let cart = cart_of(at_cart.id, vec![line("Tractor", Some("500001"))]);
        repository.carts.save(&cart).await.unwrap();

        let mut seq = Sequence::new();
        let mut users = MockUsersRepository::new();
        let first = at_cart.clone();
        users
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(first.clone()));
        users
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(moved.clone()));
        users.expect_set_pincode().never();
        repository.users = Arc::new(users);

        let svc = service(&repository, no_payment());
        let err = svc.summary(&viewer_for(&at_cart)).await.unwrap_err();

        match err {
            AppError::CartConflict(CartClassification::LocationMismatch {
                cart_pincode,
                current_pincode,
            }) => {
                assert_eq!(cart_pincode, pin("500001"));
                assert_eq!(current_pincode, pin("500002"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(repository.carts.get(at_cart.id).await.unwrap().items, cart.items);
        assert_eq!(order_count(&repository).await, 0);
    }

    #[tokio::test]
    async fn every_failed_precondition_leaves_no_trace() {
        let repository = Repository::in_memory();
        let svc = service(&repository, no_payment());

        // 1. not logged in
        assert!(matches!(
            svc.place_order(&Viewer::anonymous("s-1"), request(PaymentMethod::Online)).await,
            Err(AppError::Authentication(_))
        ));

        // 2. empty cart
        let empty = seed_user(&repository, Role::Customer, Some("500001")).await;
        assert!(matches!(
            svc.place_order(&viewer_for(&empty), request(PaymentMethod::Online)).await,
            Err(AppError::EmptyCart)
        ));

        // 4. no pincode
        let unset = seed_user(&repository, Role::Customer, None).await;
        let cart = cart_of(unset.id, vec![line("Tractor", Some("500001"))]);
        repository.carts.save(&cart).await.unwrap();
        assert!(matches!(
            svc.place_order(&viewer_for(&unset), request(PaymentMethod::Online)).await,
            Err(AppError::PincodeRequired)
        ));
        assert_eq!(repository.carts.get(unset.id).await.unwrap().items, cart.items);

        // 5. mismatch and mixed
        let elsewhere = seed_user(&repository, Role::Customer, Some("500002")).await;
        let cart = cart_of(elsewhere.id, vec![line("Tractor", Some("500001"))]);
        repository.carts.save(&cart).await.unwrap();
        assert!(matches!(
            svc.place_order(&viewer_for(&elsewhere), request(PaymentMethod::Online)).await,
            Err(AppError::CartConflict(CartClassification::LocationMismatch { .. }))
        ));

        let mixed = seed_user(&repository, Role::Customer, Some("500001")).await;
        let cart = cart_of(
            mixed.id,
            vec![line("Tractor", Some("500001")), line("Seeder", Some("500002"))],
        );
        repository.carts.save(&cart).await.unwrap();
        assert!(matches!(
            svc.place_order(&viewer_for(&mixed), request(PaymentMethod::Online)).await,
            Err(AppError::CartConflict(CartClassification::MixedLocations { .. }))
        ));
        assert_eq!(repository.carts.get(mixed.id).await.unwrap().items.len(), 2);

        let broken = seed_user(&repository, Role::Customer, Some("500001")).await;
        let cart = cart_of(
            broken.id,
            vec![line("Tractor", Some("500001")), line("Seeder", None)],
        );
        repository.carts.save(&cart).await.unwrap();
        assert!(matches!(
            svc.place_order(&viewer_for(&broken), request(PaymentMethod::Online)).await,
            Err(AppError::CartConflict(CartClassification::DataError { .. }))
        ));

        assert_eq!(order_count(&repository).await, 0);
    }

    #[tokio::test]
    async fn summary_uses_settings_rate() {
        let repository = Repository::in_memory();
        let customer = seed_user(&repository, Role::Customer, Some("500001")).await;
        repository
            .carts
            .save(&cart_of(
                customer.id,
                vec![line("Tractor", Some("500001")), line("Seeder", Some("500001"))],
            ))
            .await
            .unwrap();

        let svc = service(&repository, no_payment());
        let summary = svc.summary(&viewer_for(&customer)).await.unwrap();
        assert_eq!(summary.pincode, pin("500001"));
        assert_eq!(summary.totals.subtotal, Decimal::new(400, 0));
        assert_eq!(summary.totals.platform_fee, Decimal::new(20, 0));
        assert_eq!(summary.totals.total_amount, Decimal::new(420, 0));

        repository
            .settings
            .save(&crate::models::settings::PlatformSettings {
                platform_fee_rate: Decimal::new(1, 1),
            })
            .await
            .unwrap();
        let summary = svc.summary(&viewer_for(&customer)).await.unwrap();
        assert_eq!(summary.totals.total_amount, Decimal::new(440, 0));
    }

    #[tokio::test]
    async fn online_payment_places_paid_pending_order() {
        let repository = Repository::in_memory();
        let customer = seed_user(&repository, Role::Customer, Some("500001")).await;
        repository
            .carts
            .save(&cart_of(customer.id, vec![line("Tractor", Some("500001"))]))
            .await
            .unwrap();

        let mut payment = MockPaymentGateway::new();
        payment
            .expect_charge()
            .withf(|r| r.amount == Decimal::new(210, 0) && r.currency == "INR")
            .times(1)
            .returning(|_| {
                Ok(ChargeReceipt {
                    transaction_id: "pay_9XK2".to_string(),
                })
            });

        let svc = service(&repository, payment);
        let order = svc
            .place_order(&viewer_for(&customer), request(PaymentMethod::Online))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.transaction_id, "pay_9XK2");
        assert_eq!(order.order_pincode, pin("500001"));
        assert!(repository.carts.get(customer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_payment_keeps_cart() {
        let repository = Repository::in_memory();
        let customer = seed_user(&repository, Role::Customer, Some("500001")).await;
        let cart = cart_of(customer.id, vec![line("Tractor", Some("500001"))]);
        repository.carts.save(&cart).await.unwrap();

        let mut payment = MockPaymentGateway::new();
        payment
            .expect_charge()
            .times(1)
            .returning(|_| Err(AppError::PaymentFailed("card declined".to_string())));

        let svc = service(&repository, payment);
        assert!(matches!(
            svc.place_order(&viewer_for(&customer), request(PaymentMethod::Online)).await,
            Err(AppError::PaymentFailed(_))
        ));
        assert_eq!(order_count(&repository).await, 0);
        assert_eq!(repository.carts.get(customer.id).await.unwrap().items, cart.items);
    }

    #[tokio::test]
    async fn pay_on_pickup_skips_gateway() {
        let repository = Repository::in_memory();
        let customer = seed_user(&repository, Role::Customer, None).await;
        let viewer = viewer_for(&customer);
        repository
            .carts
            .save(&cart_of(customer.id, vec![line("Tractor", Some("500001"))]))
            .await
            .unwrap();

        let svc = service(&repository, no_payment());
        svc.pincode.set(&viewer, "500001").await.unwrap();
        let order = svc
            .place_order(&viewer, request(PaymentMethod::PayOnPickup))
            .await
            .unwrap();

        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.payment_method, PaymentMethod::PayOnPickup);
        assert_eq!(order.transaction_id, "PAY_ON_PICKUP");
    }

    #[tokio::test]
    async fn invalid_contact_is_rejected_before_payment() {
        let repository = Repository::in_memory();
        let customer = seed_user(&repository, Role::Customer, Some("500001")).await;
        repository
            .carts
            .save(&cart_of(customer.id, vec![line("Tractor", Some("500001"))]))
            .await
            .unwrap();

        let svc = service(&repository, no_payment());
        let mut bad = request(PaymentMethod::Online);
        bad.contact.phone = "12".to_string();
        assert!(matches!(
            svc.place_order(&viewer_for(&customer), bad).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(order_count(&repository).await, 0);
    }
}
