//! Settings service

use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    models::{
        settings::{PlatformSettings, UpdateSettings},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct SettingsService {
    repository: Repository,
    /// Used until an administrator saves a record
    default_fee_rate: Decimal,
}

impl SettingsService {
    pub fn new(repository: Repository, default_fee_rate: Decimal) -> Self {
        Self {
            repository,
            default_fee_rate,
        }
    }

    /// Current settings
    pub async fn get_settings(&self) -> AppResult<PlatformSettings> {
        Ok(self
            .repository
            .settings
            .get()
            .await?
            .unwrap_or(PlatformSettings {
                platform_fee_rate: self.default_fee_rate,
            }))
    }

    pub async fn fee_rate(&self) -> AppResult<Decimal> {
        Ok(self.get_settings().await?.platform_fee_rate)
    }

    /// Update settings (admin only)
    pub async fn update_settings(
        &self,
        claims: &UserClaims,
        request: UpdateSettings,
    ) -> AppResult<PlatformSettings> {
        claims.require_admin()?;

        if request.platform_fee_rate < Decimal::ZERO || request.platform_fee_rate > Decimal::ONE {
            return Err(AppError::Validation(
                "Platform fee rate must be between 0 and 1".to_string(),
            ));
        }

        let settings = PlatformSettings {
            platform_fee_rate: request.platform_fee_rate,
        };
        self.repository.settings.save(&settings).await?;
        tracing::info!(rate = %settings.platform_fee_rate, "Platform fee rate updated");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::user::Role, services::test_support::*};

    #[tokio::test]
    async fn falls_back_to_configured_rate() {
        let repository = Repository::in_memory();
        let svc = SettingsService::new(repository.clone(), Decimal::new(5, 2));
        assert_eq!(svc.fee_rate().await.unwrap(), Decimal::new(5, 2));

        let admin = viewer_for(&seed_user(&repository, Role::Admin, None).await);
        svc.update_settings(
            admin.require_user().unwrap(),
            UpdateSettings {
                platform_fee_rate: Decimal::new(8, 2),
            },
        )
        .await
        .unwrap();
        assert_eq!(svc.fee_rate().await.unwrap(), Decimal::new(8, 2));
    }

    #[tokio::test]
    async fn update_is_admin_only_and_bounded() {
        let repository = Repository::in_memory();
        let svc = SettingsService::new(repository.clone(), Decimal::new(5, 2));
        let seller = viewer_for(&seed_user(&repository, Role::Seller, None).await);
        let admin = viewer_for(&seed_user(&repository, Role::Admin, None).await);

        assert!(matches!(
            svc.update_settings(
                seller.require_user().unwrap(),
                UpdateSettings {
                    platform_fee_rate: Decimal::new(1, 1)
                }
            )
            .await,
            Err(AppError::Authorization(_))
        ));
        assert!(matches!(
            svc.update_settings(
                admin.require_user().unwrap(),
                UpdateSettings {
                    platform_fee_rate: Decimal::new(15, 1)
                }
            )
            .await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(svc.fee_rate().await.unwrap(), Decimal::new(5, 2));
    }
}
