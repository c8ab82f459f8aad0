//! Orders persistence (Postgres)

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, FromRow, Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{OrderFilter, OrdersRepository};
use crate::{
    error::{AppError, AppResult},
    models::{
        cart::CartLineItem,
        order::{CustomerContact, Order, OrderStatus},
        pincode::Pincode,
    },
};

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    customer_id: Uuid,
    customer: Json<CustomerContact>,
    items: Json<Vec<CartLineItem>>,
    equipment_names: String,
    seller_ids: Vec<Uuid>,
    seller_names: String,
    subtotal: Decimal,
    platform_fee: Decimal,
    total_amount: Decimal,
    status: String,
    payment_status: String,
    payment_method: String,
    transaction_id: String,
    pickup_date: Option<NaiveDate>,
    pickup_time: Option<NaiveTime>,
    order_pincode: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            customer_id: row.customer_id,
            customer: row.customer.0,
            items: row.items.0,
            equipment_names: row.equipment_names,
            seller_ids: row.seller_ids,
            seller_names: row.seller_names,
            subtotal: row.subtotal,
            platform_fee: row.platform_fee,
            total_amount: row.total_amount,
            status: row.status.parse().map_err(AppError::Internal)?,
            payment_status: row.payment_status.parse().map_err(AppError::Internal)?,
            payment_method: row.payment_method.parse().map_err(AppError::Internal)?,
            transaction_id: row.transaction_id,
            pickup_date: row.pickup_date,
            pickup_time: row.pickup_time,
            order_pincode: Pincode::parse(&row.order_pincode)
                .map_err(|e| AppError::Internal(format!("Order {}: {}", row.id, e)))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgOrdersRepository {
    pool: Pool<Postgres>,
}

impl PgOrdersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrdersRepository for PgOrdersRepository {
    async fn create(&self, order: &Order) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, customer_id, customer, items, equipment_names, seller_ids, seller_names,
                subtotal, platform_fee, total_amount, status, payment_status, payment_method,
                transaction_id, pickup_date, pickup_time, order_pincode, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(order.id)
        .bind(order.customer_id)
        .bind(Json(&order.customer))
        .bind(Json(&order.items))
        .bind(&order.equipment_names)
        .bind(&order.seller_ids)
        .bind(&order.seller_names)
        .bind(order.subtotal)
        .bind(order.platform_fee)
        .bind(order.total_amount)
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.payment_method.as_str())
        .bind(&order.transaction_id)
        .bind(order.pickup_date)
        .bind(order.pickup_time)
        .bind(order.order_pincode.as_str())
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> AppResult<Order> {
        sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))?
            .try_into()
    }

    async fn list(&self, filter: &OrderFilter) -> AppResult<Vec<Order>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM orders WHERE TRUE");

        if let Some(customer_id) = filter.customer_id {
            query.push(" AND customer_id = ").push_bind(customer_id);
        }
        if let Some(seller_id) = filter.seller_id {
            query.push(" AND ").push_bind(seller_id).push(" = ANY(seller_ids)");
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        query.push(" ORDER BY created_at DESC");

        let rows = query
            .build_query_as::<OrderRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Order> {
        sqlx::query_as::<_, OrderRow>(
            "UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))?
        .try_into()
    }
}
