//! Platform settings record (Postgres)

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};

use super::SettingsRepository;
use crate::{error::AppResult, models::settings::PlatformSettings};

#[derive(Clone)]
pub struct PgSettingsRepository {
    pool: Pool<Postgres>,
}

impl PgSettingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    async fn get(&self) -> AppResult<Option<PlatformSettings>> {
        let rate: Option<Decimal> =
            sqlx::query_scalar("SELECT platform_fee_rate FROM settings WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(rate.map(|platform_fee_rate| PlatformSettings { platform_fee_rate }))
    }

    async fn save(&self, settings: &PlatformSettings) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (id, platform_fee_rate, updated_at)
            VALUES (1, $1, NOW())
            ON CONFLICT (id) DO UPDATE SET platform_fee_rate = EXCLUDED.platform_fee_rate, updated_at = NOW()
            "#,
        )
        .bind(settings.platform_fee_rate)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
