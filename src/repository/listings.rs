//! Equipment listings persistence (Postgres)

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, FromRow, Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{ListingFilter, ListingsRepository};
use crate::{
    error::{AppError, AppResult},
    models::{
        listing::{Listing, ListingStatus},
        pincode::parse_stored,
    },
};

/// Raw equipment row
#[derive(Debug, FromRow)]
struct ListingRow {
    id: Uuid,
    seller_id: Uuid,
    seller_name: Option<String>,
    seller_address: Option<String>,
    name: String,
    category: String,
    price_per_acre: Decimal,
    price_per_hour: Decimal,
    description: Option<String>,
    location: Option<String>,
    pincode: Option<String>,
    quantity: i32,
    status: String,
    featured: bool,
    images: Vec<String>,
    specifications: Json<BTreeMap<String, String>>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<ListingRow> for Listing {
    type Error = AppError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        Ok(Listing {
            id: row.id,
            seller_id: row.seller_id,
            seller_name: row.seller_name,
            seller_address: row.seller_address,
            name: row.name,
            category: row.category,
            price_per_acre: row.price_per_acre,
            price_per_hour: row.price_per_hour,
            description: row.description,
            location: row.location,
            pincode: parse_stored(row.pincode),
            quantity: row.quantity,
            status: row.status.parse().map_err(AppError::Internal)?,
            featured: row.featured,
            images: row.images,
            specifications: row.specifications.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgListingsRepository {
    pool: Pool<Postgres>,
}

impl PgListingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingsRepository for PgListingsRepository {
    async fn list(&self, filter: &ListingFilter) -> AppResult<Vec<Listing>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM equipment WHERE TRUE");

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(pincode) = &filter.pincode {
            query.push(" AND pincode = ").push_bind(pincode.as_str().to_string());
        }
        if let Some(category) = &filter.category {
            query.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(seller_id) = filter.seller_id {
            query.push(" AND seller_id = ").push_bind(seller_id);
        }
        if let Some(featured) = filter.featured {
            query.push(" AND featured = ").push_bind(featured);
        }
        query.push(" ORDER BY created_at DESC");
        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(limit as i64);
        }

        let rows = query
            .build_query_as::<ListingRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Listing::try_from).collect()
    }

    async fn get(&self, id: Uuid) -> AppResult<Listing> {
        sqlx::query_as::<_, ListingRow>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", id)))?
            .try_into()
    }

    async fn create(&self, listing: &Listing) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO equipment (
                id, seller_id, seller_name, seller_address, name, category,
                price_per_acre, price_per_hour, description, location, pincode,
                quantity, status, featured, images, specifications, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(listing.id)
        .bind(listing.seller_id)
        .bind(&listing.seller_name)
        .bind(&listing.seller_address)
        .bind(&listing.name)
        .bind(&listing.category)
        .bind(listing.price_per_acre)
        .bind(listing.price_per_hour)
        .bind(&listing.description)
        .bind(&listing.location)
        .bind(listing.pincode.as_ref().map(|p| p.as_str().to_string()))
        .bind(listing.quantity)
        .bind(listing.status.as_str())
        .bind(listing.featured)
        .bind(&listing.images)
        .bind(Json(&listing.specifications))
        .bind(listing.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_status(&self, id: Uuid, status: ListingStatus) -> AppResult<Listing> {
        sqlx::query_as::<_, ListingRow>(
            "UPDATE equipment SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", id)))?
        .try_into()
    }

    async fn set_featured(&self, id: Uuid, featured: bool) -> AppResult<Listing> {
        sqlx::query_as::<_, ListingRow>(
            "UPDATE equipment SET featured = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(featured)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", id)))?
        .try_into()
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Listing {} not found", id)));
        }
        Ok(())
    }
}
