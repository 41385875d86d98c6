//! AWS Secrets Manager integration.

use std::collections::HashMap;
use std::future::Future;
use std::sync::OnceLock;

use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::{Config, Error, Result};

/// Third-party API keys stored as one JSON secret.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiCredentials {
    pub yandex_api_key: Option<String>,
    pub salebot_api_key: Option<String>,
}

impl ApiCredentials {
    /// Fill keys the environment did not provide. Environment values win.
    pub fn apply_to(self, config: &mut Config) {
        let non_empty = |key: Option<String>| key.filter(|k| !k.trim().is_empty());
        if config.yandex_api_key.is_none() {
            config.yandex_api_key = non_empty(self.yandex_api_key);
        }
        if config.salebot_api_key.is_none() {
            config.salebot_api_key = non_empty(self.salebot_api_key);
        }
    }
}

/// Parsed credentials keyed by secret ARN.
///
/// Warm Lambda invocations reuse the process, so a secret is fetched and
/// parsed once. Failed loads are not remembered.
#[derive(Debug, Default)]
pub struct CredentialsCache {
    entries: RwLock<HashMap<String, ApiCredentials>>,
}

impl CredentialsCache {
    /// The process-wide cache used by [`get_api_credentials`].
    pub fn global() -> &'static CredentialsCache {
        static GLOBAL: OnceLock<CredentialsCache> = OnceLock::new();
        GLOBAL.get_or_init(CredentialsCache::default)
    }

    /// Cached credentials for `secret_arn`, or parse what `load` returns.
    pub async fn get_or_load<F, Fut>(&self, secret_arn: &str, load: F) -> Result<ApiCredentials>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        if let Some(credentials) = self.entries.read().await.get(secret_arn) {
            return Ok(credentials.clone());
        }

        let credentials = parse_api_credentials(&load().await?)?;
        self.entries
            .write()
            .await
            .insert(secret_arn.to_string(), credentials.clone());
        Ok(credentials)
    }
}

/// Fetch the raw string value of a secret.
pub async fn get_secret(client: &SecretsClient, secret_arn: &str) -> Result<String> {
    let response = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| Error::Aws(format!("Failed to get secret {}: {}", secret_arn, e)))?;

    response
        .secret_string()
        .map(String::from)
        .ok_or_else(|| Error::Aws(format!("Secret {} has no string value", secret_arn)))
}

/// Get geocoder and profile-store keys from Secrets Manager.
pub async fn get_api_credentials(
    client: &SecretsClient,
    secret_arn: &str,
) -> Result<ApiCredentials> {
    CredentialsCache::global()
        .get_or_load(secret_arn, || get_secret(client, secret_arn))
        .await
}

fn parse_api_credentials(secret_string: &str) -> Result<ApiCredentials> {
    serde_json::from_str(secret_string)
        .map_err(|e| Error::Aws(format!("Failed to parse API credentials: {}", e)))
}
