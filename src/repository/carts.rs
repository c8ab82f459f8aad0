//! Cart documents persistence (Postgres)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, Pool, Postgres};
use uuid::Uuid;

use super::CartsRepository;
use crate::{
    error::AppResult,
    models::cart::{Cart, CartLineItem},
};

#[derive(Debug, FromRow)]
struct CartRow {
    owner_id: Uuid,
    items: Json<Vec<CartLineItem>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Cart {
            owner_id: row.owner_id,
            items: row.items.0,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PgCartsRepository {
    pool: Pool<Postgres>,
}

impl PgCartsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartsRepository for PgCartsRepository {
    async fn get(&self, owner_id: Uuid) -> AppResult<Cart> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT owner_id, items, updated_at FROM carts WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Cart::from).unwrap_or_else(|| Cart::empty(owner_id)))
    }

    /// Whole-document write, last writer wins
    async fn save(&self, cart: &Cart) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO carts (owner_id, items, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (owner_id) DO UPDATE SET items = EXCLUDED.items, updated_at = NOW()
            "#,
        )
        .bind(cart.owner_id)
        .bind(Json(&cart.items))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear(&self, owner_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM carts WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
