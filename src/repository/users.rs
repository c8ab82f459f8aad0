//! User profiles persistence (Postgres)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use super::{ProfileChanges, UsersRepository};
use crate::{
    error::{AppError, AppResult},
    models::{
        pincode::{parse_stored, Pincode},
        user::{Role, User},
    },
};

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    role: String,
    pincode: Option<String>,
    business_name: Option<String>,
    address: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            role: row.role.parse().map_err(AppError::Internal)?,
            pincode: parse_stored(row.pincode),
            business_name: row.business_name,
            address: row.address,
            created_at: row.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PgUsersRepository {
    pool: Pool<Postgres>,
}

impl PgUsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsersRepository for PgUsersRepository {
    async fn get(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?
            .try_into()
    }

    async fn list(&self, role: Option<Role>) -> AppResult<Vec<User>> {
        let rows = match role {
            Some(role) => {
                sqlx::query_as::<_, UserRow>(
                    "SELECT * FROM users WHERE role = $1 ORDER BY created_at DESC",
                )
                .bind(role.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.into_iter().map(User::try_from).collect()
    }

    async fn create(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, phone, role, pincode, business_name, address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .bind(user.pincode.as_ref().map(|p| p.as_str().to_string()))
        .bind(&user.business_name)
        .bind(&user.address)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> AppResult<User> {
        sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                address = COALESCE($4, address),
                business_name = COALESCE($5, business_name)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.phone)
        .bind(changes.address)
        .bind(changes.business_name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?
        .try_into()
    }

    async fn set_pincode(&self, id: Uuid, pincode: Option<Pincode>) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET pincode = $2 WHERE id = $1")
            .bind(id)
            .bind(pincode.map(String::from))
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }
}
