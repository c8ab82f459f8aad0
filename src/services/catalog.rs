//! Equipment catalog: pincode filtering, featured selection and listing lifecycle

use std::collections::HashSet;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        listing::{CreateListing, Listing, ListingQuery, ListingStatus, ModerationDecision},
        pincode::Pincode,
        user::UserClaims,
    },
    repository::{ListingFilter, Repository},
};

/// Outcome of the home page featured strip
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeaturedSelection {
    Listings {
        listings: Vec<Listing>,
        /// How many slots were filled with recent non-featured listings
        filled: usize,
    },
    /// A location filter is active and nothing featured matches it
    NoResultsForLocation { pincode: Pincode },
}

/// Approved listings, optionally restricted to an exact pincode, newest first
pub fn filter_by_pincode(listings: &[Listing], pincode: Option<&Pincode>) -> Vec<Listing> {
    let mut matching: Vec<Listing> = listings
        .iter()
        .filter(|l| l.status == ListingStatus::Approved)
        .filter(|l| pincode.map_or(true, |p| l.pincode.as_ref() == Some(p)))
        .cloned()
        .collect();
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    matching
}

/// Featured listings first, topped up with the most recent non-featured ones.
///
/// Under an active pincode filter, zero featured matches short-circuits to
/// [`FeaturedSelection::NoResultsForLocation`] instead of filling.
pub fn select_featured_with_fill(
    listings: &[Listing],
    pincode: Option<&Pincode>,
    limit: usize,
) -> FeaturedSelection {
    let candidates = filter_by_pincode(listings, pincode);

    let mut selected: Vec<Listing> = candidates
        .iter()
        .filter(|l| l.featured)
        .take(limit)
        .cloned()
        .collect();

    if !candidates.iter().any(|l| l.featured) {
        if let Some(pincode) = pincode {
            return FeaturedSelection::NoResultsForLocation {
                pincode: pincode.clone(),
            };
        }
    }

    let mut seen: HashSet<Uuid> = selected.iter().map(|l| l.id).collect();
    let featured_count = selected.len();

    for listing in candidates.iter().filter(|l| !l.featured) {
        if selected.len() >= limit {
            break;
        }
        if seen.insert(listing.id) {
            selected.push(listing.clone());
        }
    }

    FeaturedSelection::Listings {
        filled: selected.len() - featured_count,
        listings: selected,
    }
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    featured_limit: usize,
}

impl CatalogService {
    pub fn new(repository: Repository, featured_limit: usize) -> Self {
        Self {
            repository,
            featured_limit,
        }
    }

    /// Public catalog: approved listings, newest first
    pub async fn search(&self, query: &ListingQuery) -> AppResult<Vec<Listing>> {
        let pincode = query.pincode.as_deref().map(Pincode::parse).transpose()?;
        let listings = self
            .repository
            .listings
            .list(&ListingFilter {
                status: Some(ListingStatus::Approved),
                pincode: pincode.clone(),
                category: query.category.clone(),
                ..Default::default()
            })
            .await?;
        Ok(filter_by_pincode(&listings, pincode.as_ref()))
    }

    /// Home page strip for the viewer's location.
    ///
    /// Fetches at most `featured_limit` featured listings, and the same number
    /// of recent non-featured ones only when slots remain to fill.
    pub async fn featured(&self, pincode: Option<&Pincode>) -> AppResult<FeaturedSelection> {
        let filter = ListingFilter {
            status: Some(ListingStatus::Approved),
            pincode: pincode.cloned(),
            limit: Some(self.featured_limit),
            ..Default::default()
        };
        let mut listings = self
            .repository
            .listings
            .list(&ListingFilter {
                featured: Some(true),
                ..filter.clone()
            })
            .await?;

        let no_featured_here = listings.is_empty() && pincode.is_some();
        if listings.len() < self.featured_limit && !no_featured_here {
            let fill = self
                .repository
                .listings
                .list(&ListingFilter {
                    featured: Some(false),
                    ..filter
                })
                .await?;
            listings.extend(fill);
        }
        Ok(select_featured_with_fill(&listings, pincode, self.featured_limit))
    }

    /// Single listing; non-approved ones are visible to their seller and admins only
    pub async fn get(&self, id: Uuid, claims: Option<&UserClaims>) -> AppResult<Listing> {
        let listing = self.repository.listings.get(id).await?;
        let privileged = claims.is_some_and(|c| c.is_admin() || c.user_id == listing.seller_id);
        if listing.status != ListingStatus::Approved && !privileged {
            return Err(AppError::NotFound(format!("Listing {} not found", id)));
        }
        Ok(listing)
    }

    /// New listings start pending and unfeatured
    pub async fn create(&self, claims: &UserClaims, data: CreateListing) -> AppResult<Listing> {
        claims.require_seller()?;
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        if data.price_per_acre < Decimal::ZERO || data.price_per_hour < Decimal::ZERO {
            return Err(AppError::Validation("Prices cannot be negative".to_string()));
        }
        if data.price_per_acre.is_zero() && data.price_per_hour.is_zero() {
            return Err(AppError::Validation(
                "Set a price per acre or a price per hour".to_string(),
            ));
        }

        let seller = self.repository.users.get(claims.user_id).await?;
        let listing = Listing {
            id: Uuid::new_v4(),
            seller_id: seller.id,
            seller_name: Some(seller.display_name().to_string()),
            seller_address: seller.address.clone(),
            name: data.name,
            category: data.category,
            price_per_acre: data.price_per_acre,
            price_per_hour: data.price_per_hour,
            description: data.description,
            location: data.location,
            pincode: Some(data.pincode),
            quantity: data.quantity,
            status: ListingStatus::Pending,
            featured: false,
            images: data.images,
            specifications: data.specifications,
            created_at: Utc::now(),
            updated_at: None,
        };

        self.repository.listings.create(&listing).await?;
        tracing::info!(listing_id = %listing.id, seller_id = %seller.id, "Listing submitted for review");
        Ok(listing)
    }

    /// Only the owning seller may delete a listing
    pub async fn delete(&self, claims: &UserClaims, id: Uuid) -> AppResult<()> {
        let listing = self.repository.listings.get(id).await?;
        if listing.seller_id != claims.user_id {
            return Err(AppError::Authorization(
                "Only the owner can delete this listing".to_string(),
            ));
        }
        self.repository.listings.delete(id).await?;
        tracing::info!(listing_id = %id, "Listing deleted");
        Ok(())
    }

    pub async fn seller_listings(&self, claims: &UserClaims) -> AppResult<Vec<Listing>> {
        claims.require_seller()?;
        self.repository
            .listings
            .list(&ListingFilter {
                seller_id: Some(claims.user_id),
                ..Default::default()
            })
            .await
    }

    /// Moderation queue and history for administrators
    pub async fn admin_listings(
        &self,
        claims: &UserClaims,
        status: Option<ListingStatus>,
    ) -> AppResult<Vec<Listing>> {
        claims.require_admin()?;
        self.repository
            .listings
            .list(&ListingFilter {
                status,
                ..Default::default()
            })
            .await
    }

    pub async fn moderate(
        &self,
        claims: &UserClaims,
        id: Uuid,
        decision: ModerationDecision,
    ) -> AppResult<Listing> {
        claims.require_admin()?;
        let status = ListingStatus::from(decision);
        let mut listing = self.repository.listings.set_status(id, status).await?;
        // A rejected listing cannot stay on the featured strip
        if status == ListingStatus::Rejected && listing.featured {
            listing = self.repository.listings.set_featured(id, false).await?;
        }
        tracing::info!(listing_id = %id, status = %status, "Listing moderated");
        Ok(listing)
    }

    /// Featuring is limited to approved listings
    pub async fn set_featured(
        &self,
        claims: &UserClaims,
        id: Uuid,
        featured: bool,
    ) -> AppResult<Listing> {
        claims.require_admin()?;
        let listing = self.repository.listings.get(id).await?;
        if featured && listing.status != ListingStatus::Approved {
            return Err(AppError::BusinessRule(
                "Only approved listings can be featured".to_string(),
            ));
        }
        self.repository.listings.set_featured(id, featured).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::user::Role;
    use crate::repository::MockListingsRepository;
    use crate::services::test_support::*;

    fn featured(mut l: Listing) -> Listing {
        l.featured = true;
        l
    }

    #[test]
    fn filter_is_exact_and_approved_only() {
        let seller = user(Role::Seller, None);
        let mut pending = listing(&seller, "Pending", Some("500001"), 1);
        pending.status = ListingStatus::Pending;
        let listings = vec![
            listing(&seller, "Old", Some("500001"), 30),
            listing(&seller, "New", Some("500001"), 5),
            listing(&seller, "Near", Some("500002"), 2),
            listing(&seller, "Prefix", Some("500010"), 3),
            listing(&seller, "Unlocated", None, 4),
            pending,
        ];

        let names = |v: Vec<Listing>| v.into_iter().map(|l| l.name).collect::<Vec<_>>();

        assert_eq!(
            names(filter_by_pincode(&listings, Some(&pin("500001")))),
            vec!["New", "Old"]
        );
        assert_eq!(
            names(filter_by_pincode(&listings, None)),
            vec!["Near", "Prefix", "Unlocated", "New", "Old"]
        );
    }

    #[test]
    fn featured_then_recent_fill() {
        let seller = user(Role::Seller, None);
        let listings = vec![
            featured(listing(&seller, "F1", Some("500001"), 50)),
            listing(&seller, "R1", Some("500001"), 1),
            listing(&seller, "R2", Some("500001"), 2),
            listing(&seller, "R3", Some("500001"), 3),
            listing(&seller, "Other", Some("600001"), 0),
        ];

        match select_featured_with_fill(&listings, Some(&pin("500001")), 3) {
            FeaturedSelection::Listings { listings, filled } => {
                let names: Vec<_> = listings.iter().map(|l| l.name.as_str()).collect();
                assert_eq!(names, vec!["F1", "R1", "R2"]);
                assert_eq!(filled, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn featured_limit_caps_selection() {
        let seller = user(Role::Seller, None);
        let listings: Vec<Listing> = (0..8)
            .map(|i| featured(listing(&seller, &format!("F{i}"), Some("500001"), i)))
            .collect();
        match select_featured_with_fill(&listings, None, 6) {
            FeaturedSelection::Listings { listings, filled } => {
                assert_eq!(listings.len(), 6);
                assert_eq!(filled, 0);
                assert_eq!(listings[0].name, "F0");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn zero_featured_under_filter_is_no_results() {
        assert_eq!(
            select_featured_with_fill(&[], Some(&pin("500001")), 6),
            FeaturedSelection::NoResultsForLocation {
                pincode: pin("500001")
            }
        );

        // Non-featured matches exist but are not used as a fallback
        let seller = user(Role::Seller, None);
        let listings = vec![listing(&seller, "R1", Some("500001"), 1)];
        assert!(matches!(
            select_featured_with_fill(&listings, Some(&pin("500001")), 6),
            FeaturedSelection::NoResultsForLocation { .. }
        ));
    }

    #[test]
    fn zero_limit_still_sees_featured_matches() {
        let seller = user(Role::Seller, None);
        let listings = vec![featured(listing(&seller, "F1", Some("500001"), 1))];
        assert_eq!(
            select_featured_with_fill(&listings, Some(&pin("500001")), 0),
            FeaturedSelection::Listings {
                listings: Vec::new(),
                filled: 0,
            }
        );
    }

    #[tokio::test]
    async fn featured_queries_are_bounded_by_the_limit() {
        let seller = user(Role::Seller, None);
        let featured_rows = vec![featured(listing(&seller, "F1", Some("500001"), 5))];
        let recent_rows = vec![
            listing(&seller, "R1", Some("500001"), 1),
            listing(&seller, "R2", Some("500001"), 2),
        ];

        let mut listings = MockListingsRepository::new();
        listings
            .expect_list()
            .withf(|f| {
                f.featured == Some(true)
                    && f.limit == Some(2)
                    && f.status == Some(ListingStatus::Approved)
                    && f.pincode == Some(pin("500001"))
            })
            .times(1)
            .returning(move |_| Ok(featured_rows.clone()));
        listings
            .expect_list()
            .withf(|f| f.featured == Some(false) && f.limit == Some(2))
            .times(1)
            .returning(move |_| Ok(recent_rows.clone()));

        let mut repository = Repository::in_memory();
        repository.listings = Arc::new(listings);
        let svc = CatalogService::new(repository, 2);

        match svc.featured(Some(&pin("500001"))).await.unwrap() {
            FeaturedSelection::Listings { listings, filled } => {
                let names: Vec<_> = listings.iter().map(|l| l.name.as_str()).collect();
                assert_eq!(names, vec!["F1", "R1"]);
                assert_eq!(filled, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_featured_under_filter_skips_fill_query() {
        let mut listings = MockListingsRepository::new();
        listings
            .expect_list()
            .withf(|f| f.featured == Some(true))
            .times(1)
            .returning(|_| Ok(Vec::new()));
        listings
            .expect_list()
            .withf(|f| f.featured == Some(false))
            .never();

        let mut repository = Repository::in_memory();
        repository.listings = Arc::new(listings);
        let svc = CatalogService::new(repository, 6);

        assert!(matches!(
            svc.featured(Some(&pin("500001"))).await.unwrap(),
            FeaturedSelection::NoResultsForLocation { .. }
        ));
    }

    #[test]
    fn zero_featured_without_filter_fills() {
        let seller = user(Role::Seller, None);
        let listings = vec![
            listing(&seller, "R1", Some("500001"), 1),
            listing(&seller, "R2", Some("500002"), 2),
        ];
        match select_featured_with_fill(&listings, None, 6) {
            FeaturedSelection::Listings { listings, filled } => {
                assert_eq!(listings.len(), 2);
                assert_eq!(filled, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn listing_lifecycle() {
        let repository = Repository::in_memory();
        let svc = CatalogService::new(repository.clone(), 6);
        let seller = seed_user(&repository, Role::Seller, None).await;
        let admin = seed_user(&repository, Role::Admin, None).await;
        let seller_claims = UserClaims::new(seller.id, Role::Seller, 1);
        let admin_claims = UserClaims::new(admin.id, Role::Admin, 1);

        let created = svc
            .create(
                &seller_claims,
                CreateListing {
                    name: "Rotavator".into(),
                    category: "tillage".into(),
                    price_per_acre: Decimal::new(1500, 0),
                    price_per_hour: Decimal::ZERO,
                    description: None,
                    location: Some("Shamirpet".into()),
                    pincode: pin("500078"),
                    quantity: 1,
                    images: vec![],
                    specifications: Default::default(),
                },
            )
            .await
            .unwrap();
        assert_eq!(created.status, ListingStatus::Pending);
        assert_eq!(created.seller_name.as_deref(), Some("Kisan Machinery"));

        // Pending listings are neither searchable nor featurable
        assert!(svc.search(&ListingQuery::default()).await.unwrap().is_empty());
        assert!(matches!(
            svc.set_featured(&admin_claims, created.id, true).await,
            Err(AppError::BusinessRule(_))
        ));
        assert!(matches!(
            svc.moderate(&seller_claims, created.id, ModerationDecision::Approve).await,
            Err(AppError::Authorization(_))
        ));

        svc.moderate(&admin_claims, created.id, ModerationDecision::Approve)
            .await
            .unwrap();
        let featured = svc.set_featured(&admin_claims, created.id, true).await.unwrap();
        assert!(featured.featured);

        let found = svc
            .search(&ListingQuery {
                pincode: Some("500078".into()),
                category: None,
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let rejected = svc
            .moderate(&admin_claims, created.id, ModerationDecision::Reject)
            .await
            .unwrap();
        assert!(!rejected.featured);

        let stranger = UserClaims::new(uuid::Uuid::new_v4(), Role::Seller, 1);
        assert!(matches!(
            svc.delete(&stranger, created.id).await,
            Err(AppError::Authorization(_))
        ));
        svc.delete(&seller_claims, created.id).await.unwrap();
        assert!(svc.seller_listings(&seller_claims).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn customers_cannot_list_equipment() {
        let repository = Repository::in_memory();
        let svc = CatalogService::new(repository.clone(), 6);
        let customer = UserClaims::new(uuid::Uuid::new_v4(), Role::Customer, 1);
        assert!(matches!(
            svc.seller_listings(&customer).await,
            Err(AppError::Authorization(_))
        ));
    }
}
