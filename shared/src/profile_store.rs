//! Write-through of a resolved location to the Salebot client profile.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{Config, Error, Result};

const PROFILE_STORE_TIMEOUT_SECS: u64 = 10;

/// Persists bot-platform variables against a user.
pub trait ProfileStore: Send + Sync {
    fn save_variables(
        &self,
        user_id: &str,
        variables: &BTreeMap<String, String>,
    ) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Serialize)]
struct SaveVariablesRequest<'a> {
    client_id: &'a str,
    variables: &'a BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct SaveVariablesResponse {
    status: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Salebot `save_variables` client.
#[derive(Debug, Clone)]
pub struct SalebotProfileStore {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SalebotProfileStore {
    pub fn new(http_client: reqwest::Client, base_url: impl Into<String>, api_key: String) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            api_key,
        }
    }

    /// Build a store when a Salebot API key is configured.
    pub fn from_config(http_client: reqwest::Client, config: &Config) -> Option<Self> {
        config
            .salebot_api_key
            .clone()
            .map(|api_key| Self::new(http_client, config.salebot_api_url.clone(), api_key))
    }
}

impl ProfileStore for SalebotProfileStore {
    async fn save_variables(
        &self,
        user_id: &str,
        variables: &BTreeMap<String, String>,
    ) -> Result<()> {
        let url = format!(
            "{}/{}/save_variables",
            self.base_url.trim_end_matches('/'),
            self.api_key
        );

        let response = self
            .http_client
            .post(&url)
            .json(&SaveVariablesRequest {
                client_id: user_id,
                variables,
            })
            .timeout(Duration::from_secs(PROFILE_STORE_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| Error::from_request(e, PROFILE_STORE_TIMEOUT_SECS))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Salebot save_variables failed: {} - {}", status, body);
            return Err(Error::ProfileStore(format!("HTTP {}", status.as_u16())));
        }

        // Salebot answers 200 with {"status": "error"} for unknown clients
        let body = response.text().await.unwrap_or_default();
        if let Ok(parsed) = serde_json::from_str::<SaveVariablesResponse>(&body) {
            if parsed.status.as_deref() == Some("error") {
                return Err(Error::ProfileStore(
                    parsed
                        .description
                        .unwrap_or_else(|| "rejected by Salebot".to_string()),
                ));
            }
        }

        info!(user_id, "Saved location variables to Salebot");
        Ok(())
    }
}
