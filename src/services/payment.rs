//! External payment service client

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::PaymentConfig,
    error::{AppError, AppResult},
};

/// Amount to collect for one checkout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeRequest {
    /// Idempotency reference; also used as the order id
    pub reference: Uuid,
    pub customer_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChargeReceipt {
    pub transaction_id: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Collect the amount; any failure is an `AppError::PaymentFailed`
    async fn charge(&self, request: ChargeRequest) -> AppResult<ChargeReceipt>;
}

#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpPaymentGateway {
    pub fn new(config: &PaymentConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build payment client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn charge(&self, request: ChargeRequest) -> AppResult<ChargeReceipt> {
        let mut builder = self
            .client
            .post(format!("{}/charges", self.base_url))
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::PaymentFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::PaymentFailed(format!(
                "payment service returned {}: {}",
                status, body
            )));
        }

        let receipt: ChargeReceipt = response
            .json()
            .await
            .map_err(|e| AppError::PaymentFailed(format!("unreadable receipt: {}", e)))?;

        if receipt.transaction_id.trim().is_empty() {
            return Err(AppError::PaymentFailed(
                "payment service returned no transaction id".to_string(),
            ));
        }
        Ok(receipt)
    }
}
