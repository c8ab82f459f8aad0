//! Location directory (pincode → localities) client

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    config::DirectoryConfig,
    error::{AppError, AppResult},
    models::{location::Locality, pincode::Pincode},
};

/// Looks up the localities served by a pincode
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationDirectory: Send + Sync {
    /// An unknown pincode yields an empty list, transport or format problems an
    /// `AppError::LocationLookupFailed`
    async fn lookup(&self, pincode: &Pincode) -> AppResult<Vec<Locality>>;
}

/// One entry of the postal directory response
#[derive(Debug, Deserialize)]
struct PostalResponse {
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "PostOffice")]
    post_office: Option<Vec<PostOffice>>,
}

#[derive(Debug, Deserialize)]
struct PostOffice {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "District")]
    district: String,
    #[serde(rename = "State")]
    state: String,
}

/// HTTP client for the public India Post pincode directory
#[derive(Clone)]
pub struct PostalDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl PostalDirectory {
    pub fn new(config: &DirectoryConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build directory client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LocationDirectory for PostalDirectory {
    async fn lookup(&self, pincode: &Pincode) -> AppResult<Vec<Locality>> {
        let url = format!("{}/pincode/{}", self.base_url, pincode);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::LocationLookupFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::LocationLookupFailed(format!(
                "directory returned {}",
                response.status()
            )));
        }

        let body: Vec<PostalResponse> = response
            .json()
            .await
            .map_err(|e| AppError::LocationLookupFailed(e.to_string()))?;

        Ok(localities_from(body))
    }
}

fn localities_from(body: Vec<PostalResponse>) -> Vec<Locality> {
    body.into_iter()
        .filter(|entry| entry.status.eq_ignore_ascii_case("success"))
        .flat_map(|entry| entry.post_office.unwrap_or_default())
        .map(|po| Locality {
            locality_name: po.name,
            district: po.district,
            state: po.state,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_success_payload() {
        let body: Vec<PostalResponse> = serde_json::from_str(
            r#"[{"Message":"Number of pincode(s) found:2","Status":"Success","PostOffice":[
                {"Name":"Abids","District":"Hyderabad","State":"Telangana","Country":"India"},
                {"Name":"Gandhi Bhawan","District":"Hyderabad","State":"Telangana","Country":"India"}
            ]}]"#,
        )
        .unwrap();

        let localities = localities_from(body);
        assert_eq!(localities.len(), 2);
        assert_eq!(localities[0].locality_name, "Abids");
        assert_eq!(localities[1].state, "Telangana");
    }

    #[test]
    fn not_found_is_empty() {
        let body: Vec<PostalResponse> = serde_json::from_str(
            r#"[{"Message":"No records found","Status":"Error","PostOffice":null}]"#,
        )
        .unwrap();
        assert!(localities_from(body).is_empty());
    }
}
