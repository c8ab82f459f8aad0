//! User profile service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        pincode::Pincode,
        user::{UpdateProfile, User, Viewer},
    },
    repository::{ProfileChanges, Repository},
    services::pincode::PincodeService,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    pincode: PincodeService,
}

impl UsersService {
    pub fn new(repository: Repository, pincode: PincodeService) -> Self {
        Self {
            repository,
            pincode,
        }
    }

    pub async fn get_profile(&self, viewer: &Viewer) -> AppResult<User> {
        let claims = viewer.require_user()?;
        self.repository.users.get(claims.user_id).await
    }

    /// Update profile fields; an invalid pincode rejects the whole update
    pub async fn update_profile(&self, viewer: &Viewer, request: UpdateProfile) -> AppResult<User> {
        let claims = viewer.require_user()?;
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let pincode = request.pincode.as_deref().map(Pincode::parse).transpose()?;

        let changes = ProfileChanges {
            name: request.name,
            phone: request.phone,
            address: request.address,
            business_name: request.business_name,
        };
        let mut user = if changes == ProfileChanges::default() {
            self.repository.users.get(claims.user_id).await?
        } else {
            self.repository
                .users
                .update_profile(claims.user_id, changes)
                .await?
        };

        if let Some(pincode) = pincode {
            self.pincode.switch_to(viewer, pincode.clone()).await?;
            user.pincode = Some(pincode);
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        models::user::Role,
        services::{directory::MockLocationDirectory, test_support::*},
    };

    fn service(repository: &Repository) -> UsersService {
        let pincode = PincodeService::new(repository.clone(), Arc::new(MockLocationDirectory::new()));
        UsersService::new(repository.clone(), pincode)
    }

    #[tokio::test]
    async fn invalid_pincode_rejects_whole_update() {
        let repository = Repository::in_memory();
        let customer = seed_user(&repository, Role::Customer, Some("500001")).await;
        let svc = service(&repository);

        let err = svc
            .update_profile(
                &viewer_for(&customer),
                UpdateProfile {
                    name: Some("Suresh Reddy".to_string()),
                    pincode: Some("5000O1".to_string()),
                    ..UpdateProfile::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidPincodeFormat(_)));
        let stored = repository.users.get(customer.id).await.unwrap();
        assert_eq!(stored.name, customer.name);
        assert_eq!(stored.pincode, Some(pin("500001")));
    }

    #[tokio::test]
    async fn profile_pincode_becomes_active_location() {
        let repository = Repository::in_memory();
        let customer = seed_user(&repository, Role::Customer, None).await;
        let svc = service(&repository);
        let viewer = viewer_for(&customer).with_session("tab-1");

        let user = svc
            .update_profile(
                &viewer,
                UpdateProfile {
                    phone: Some("9988776655".to_string()),
                    pincode: Some("110001".to_string()),
                    ..UpdateProfile::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(user.phone.as_deref(), Some("9988776655"));
        assert_eq!(user.pincode, Some(pin("110001")));
        assert_eq!(
            repository.sessions.get_pincode("tab-1").await.unwrap(),
            Some(pin("110001"))
        );
        assert_eq!(svc.get_profile(&viewer).await.unwrap().pincode, Some(pin("110001")));
    }
}
