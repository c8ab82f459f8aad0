//! Fixtures shared by service tests

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    models::{
        cart::{Cart, CartLineItem},
        listing::{Listing, ListingStatus, RentalMode},
        pincode::Pincode,
        user::{Role, User, UserClaims, Viewer},
    },
    repository::Repository,
};

pub fn pin(raw: &str) -> Pincode {
    Pincode::parse(raw).unwrap()
}

pub fn pickup_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 11, 2).unwrap()
}

pub fn pickup_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 30, 0).unwrap()
}

/// A cart line with a complete pickup slot at 100/hour × 2
pub fn line(name: &str, pincode: Option<&str>) -> CartLineItem {
    CartLineItem {
        listing_id: Uuid::new_v4(),
        listing_name: name.to_string(),
        seller_id: Uuid::new_v4(),
        seller_name: Some(format!("{} Rentals", name)),
        rental_mode: RentalMode::Time,
        rental_quantity: 2,
        rate: Decimal::new(100, 0),
        price: Decimal::new(200, 0),
        pincode: pincode.map(pin),
        pickup_date: Some(pickup_date()),
        pickup_time: Some(pickup_time()),
        seller_address: None,
        added_at: Utc::now(),
    }
}

pub fn cart_of(owner_id: Uuid, items: Vec<CartLineItem>) -> Cart {
    Cart {
        owner_id,
        items,
        updated_at: None,
    }
}

pub fn user(role: Role, pincode: Option<&str>) -> User {
    let id = Uuid::new_v4();
    User {
        id,
        name: format!("{} {}", role, &id.to_string()[..8]),
        email: format!("{}@example.com", id),
        phone: Some("9876543210".to_string()),
        role,
        pincode: pincode.map(pin),
        business_name: (role == Role::Seller).then(|| "Kisan Machinery".to_string()),
        address: Some("Main road, Medchal".to_string()),
        created_at: Utc::now(),
    }
}

pub async fn seed_user(repository: &Repository, role: Role, pincode: Option<&str>) -> User {
    let user = user(role, pincode);
    repository.users.create(&user).await.unwrap();
    user
}

pub fn viewer_for(user: &User) -> Viewer {
    Viewer::user(UserClaims::new(user.id, user.role, 1))
}

/// An approved, non-featured listing created `age_minutes` ago
pub fn listing(seller: &User, name: &str, pincode: Option<&str>, age_minutes: i64) -> Listing {
    Listing {
        id: Uuid::new_v4(),
        seller_id: seller.id,
        seller_name: Some(seller.display_name().to_string()),
        seller_address: seller.address.clone(),
        name: name.to_string(),
        category: "tractor".to_string(),
        price_per_acre: Decimal::new(1200, 0),
        price_per_hour: Decimal::new(800, 0),
        description: None,
        location: Some("Medchal".to_string()),
        pincode: pincode.map(pin),
        quantity: 1,
        status: ListingStatus::Approved,
        featured: false,
        images: Vec::new(),
        specifications: BTreeMap::new(),
        created_at: Utc::now() - Duration::minutes(age_minutes),
        updated_at: None,
    }
}

pub async fn seed_listing(repository: &Repository, listing: Listing) -> Listing {
    repository.listings.create(&listing).await.unwrap();
    listing
}
