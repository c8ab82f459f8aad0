//! User model, roles and identity claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::pincode::Pincode;
use crate::error::AppError;

/// Marketplace role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Seller => "seller",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "seller" => Ok(Role::Seller),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// User profile document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    /// Preferred location; takes precedence over any session pincode
    pub pincode: Option<Pincode>,
    /// Sellers only
    pub business_name: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name shown on listings and orders
    pub fn display_name(&self) -> &str {
        self.business_name.as_deref().unwrap_or(&self.name)
    }
}

/// Profile update request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 10, max = 15, message = "Phone must be 10-15 characters"))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub business_name: Option<String>,
    /// Raw pincode; validated before anything is written
    pub pincode: Option<String>,
}

/// JWT claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: Uuid,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn new(user_id: Uuid, role: Role, ttl_hours: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            user_id,
            role,
            exp: now + ttl_hours * 3600,
            iat: now,
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    /// Admins may act as sellers
    pub fn require_seller(&self) -> Result<(), AppError> {
        match self.role {
            Role::Seller | Role::Admin => Ok(()),
            Role::Customer => Err(AppError::Authorization(
                "Seller account required".to_string(),
            )),
        }
    }
}

/// Outcome of a role check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct AccessCheck {
    pub authenticated: bool,
    pub authorized: bool,
}

impl AccessCheck {
    pub fn into_result(self) -> Result<(), AppError> {
        match (self.authenticated, self.authorized) {
            (false, _) => Err(AppError::Authentication("Please log in to continue".to_string())),
            (true, false) => Err(AppError::Authorization(
                "You do not have access to this page".to_string(),
            )),
            (true, true) => Ok(()),
        }
    }
}

/// Who is making a request: an optional authenticated identity plus an optional
/// anonymous session used for the locally persisted pincode
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub claims: Option<UserClaims>,
    pub session_id: Option<String>,
}

impl Viewer {
    pub fn anonymous(session_id: impl Into<String>) -> Self {
        Self {
            claims: None,
            session_id: Some(session_id.into()),
        }
    }

    pub fn user(claims: UserClaims) -> Self {
        Self {
            claims: Some(claims),
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.claims.as_ref().map(|c| c.user_id)
    }

    pub fn require_user(&self) -> Result<&UserClaims, AppError> {
        self.claims
            .as_ref()
            .ok_or_else(|| AppError::Authentication("Please log in to continue".to_string()))
    }

    pub fn has_role(&self, required: Role) -> AccessCheck {
        match &self.claims {
            None => AccessCheck {
                authenticated: false,
                authorized: false,
            },
            Some(claims) => AccessCheck {
                authenticated: true,
                authorized: claims.role == required || claims.role == Role::Admin,
            },
        }
    }
}
