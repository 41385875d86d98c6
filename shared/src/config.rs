//! Configuration management for the location webhook.

use std::env;

use crate::format::Locale;
use crate::response::ResponseLayout;
use crate::{Error, Result};

pub const DEFAULT_GEOCODER_URL: &str = "https://geocode-maps.yandex.ru/1.x/";
pub const DEFAULT_GEOCODER_LANG: &str = "ru_RU";
pub const DEFAULT_GEOCODER_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SALEBOT_API_URL: &str = "https://chatter.salebot.pro/api";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Yandex Geocoder API key used when the payload carries none
    pub yandex_api_key: Option<String>,
    /// ARN of a secret holding `yandex_api_key` / `salebot_api_key`
    pub credentials_secret_arn: Option<String>,
    /// Reverse geocoding endpoint
    pub geocoder_url: String,
    /// Response language requested from the geocoder
    pub geocoder_lang: String,
    /// Upper bound for a single geocoder call
    pub geocoder_timeout_secs: u64,
    /// Salebot API key; profile write-through is disabled without it
    pub salebot_api_key: Option<String>,
    /// Salebot API base URL
    pub salebot_api_url: String,
    /// Forces one response layout regardless of the request action
    pub response_layout: Option<ResponseLayout>,
    /// Language of user-facing messages
    pub locale: Locale,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            yandex_api_key: None,
            credentials_secret_arn: None,
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            geocoder_lang: DEFAULT_GEOCODER_LANG.to_string(),
            geocoder_timeout_secs: DEFAULT_GEOCODER_TIMEOUT_SECS,
            salebot_api_key: None,
            salebot_api_url: DEFAULT_SALEBOT_API_URL.to_string(),
            response_layout: None,
            locale: Locale::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty variables are treated as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let geocoder_timeout_secs = match get("GEOCODER_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("GEOCODER_TIMEOUT_SECS must be an integer: {}", e))
            })?,
            None => DEFAULT_GEOCODER_TIMEOUT_SECS,
        };
        if geocoder_timeout_secs == 0 {
            return Err(Error::Config(
                "GEOCODER_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        let response_layout = get("RESPONSE_LAYOUT")
            .map(|raw| raw.parse::<ResponseLayout>())
            .transpose()?;

        let locale = get("MESSAGE_LOCALE")
            .map(|raw| raw.parse::<Locale>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            yandex_api_key: get("YANDEX_API_KEY"),
            credentials_secret_arn: get("CREDENTIALS_SECRET_ARN"),
            geocoder_url: get("GEOCODER_URL").unwrap_or_else(|| DEFAULT_GEOCODER_URL.to_string()),
            geocoder_lang: get("GEOCODER_LANG")
                .unwrap_or_else(|| DEFAULT_GEOCODER_LANG.to_string()),
            geocoder_timeout_secs,
            salebot_api_key: get("SALEBOT_API_KEY"),
            salebot_api_url: get("SALEBOT_API_URL")
                .unwrap_or_else(|| DEFAULT_SALEBOT_API_URL.to_string()),
            response_layout,
            locale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.geocoder_url, DEFAULT_GEOCODER_URL);
        assert_eq!(config.geocoder_timeout_secs, 10);
        assert_eq!(config.locale, Locale::Ru);
        assert!(config.yandex_api_key.is_none());
        assert!(config.response_layout.is_none());
    }

    #[test]
    fn test_reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("YANDEX_API_KEY", "key-1"),
            ("GEOCODER_TIMEOUT_SECS", "3"),
            ("RESPONSE_LAYOUT", "variables"),
            ("MESSAGE_LOCALE", "en"),
            ("SALEBOT_API_KEY", "  "),
        ]))
        .unwrap();
        assert_eq!(config.yandex_api_key.as_deref(), Some("key-1"));
        assert_eq!(config.geocoder_timeout_secs, 3);
        assert_eq!(config.response_layout, Some(ResponseLayout::Variables));
        assert_eq!(config.locale, Locale::En);
        assert!(config.salebot_api_key.is_none());
    }

    #[test]
    fn test_rejects_bad_timeout() {
        assert!(Config::from_lookup(lookup_from(&[("GEOCODER_TIMEOUT_SECS", "soon")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("GEOCODER_TIMEOUT_SECS", "0")])).is_err());
    }
}
