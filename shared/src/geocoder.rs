//! Reverse geocoding via the Yandex Geocoder HTTP API.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{Config, Error, Result};

/// Maps coordinates to a human-readable address.
pub trait ReverseGeocoder: Send + Sync {
    /// Look up the address at a point. An empty result set is an error.
    ///
    /// `api_key` is the caller-supplied key; implementations fall back to
    /// their configured one.
    fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
        api_key: Option<&str>,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Top-level geocoder response.
#[derive(Debug, Deserialize)]
struct GeocoderResponse {
    response: GeocoderBody,
}

#[derive(Debug, Deserialize)]
struct GeocoderBody {
    #[serde(rename = "GeoObjectCollection")]
    collection: GeoObjectCollection,
}

#[derive(Debug, Deserialize)]
struct GeoObjectCollection {
    #[serde(rename = "featureMember", default)]
    feature_member: Vec<FeatureMember>,
}

#[derive(Debug, Deserialize)]
struct FeatureMember {
    #[serde(rename = "GeoObject")]
    geo_object: GeoObject,
}

#[derive(Debug, Deserialize)]
struct GeoObject {
    #[serde(rename = "metaDataProperty")]
    meta_data: Option<MetaDataProperty>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetaDataProperty {
    #[serde(rename = "GeocoderMetaData")]
    geocoder: GeocoderMetaData,
}

#[derive(Debug, Deserialize)]
struct GeocoderMetaData {
    text: Option<String>,
    #[serde(rename = "Address")]
    address: Option<AddressDetails>,
}

#[derive(Debug, Deserialize)]
struct AddressDetails {
    formatted: Option<String>,
}

impl GeoObject {
    fn address(self) -> Option<String> {
        let meta = self.meta_data.map(|m| m.geocoder);
        let (text, formatted) = match meta {
            Some(meta) => (meta.text, meta.address.and_then(|a| a.formatted)),
            None => (None, None),
        };
        [text, formatted, self.name]
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
    }
}

/// Client for the Yandex reverse geocoder.
#[derive(Debug, Clone)]
pub struct YandexGeocoder {
    http_client: reqwest::Client,
    base_url: String,
    lang: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl YandexGeocoder {
    /// Create a new geocoder client.
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        lang: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            lang: lang.into(),
            api_key,
            timeout_secs,
        }
    }

    /// Create from application configuration.
    pub fn from_config(http_client: reqwest::Client, config: &Config) -> Self {
        Self::new(
            http_client,
            config.geocoder_url.clone(),
            config.geocoder_lang.clone(),
            config.yandex_api_key.clone(),
            config.geocoder_timeout_secs,
        )
    }
}

impl ReverseGeocoder for YandexGeocoder {
    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
        api_key: Option<&str>,
    ) -> Result<String> {
        let api_key = api_key
            .or(self.api_key.as_deref())
            .ok_or_else(|| Error::Config("Yandex geocoder API key is not configured".to_string()))?;

        // Yandex expects "longitude,latitude"
        let point = format!("{},{}", longitude, latitude);
        debug!(latitude, longitude, "Reverse geocoding");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("apikey", api_key),
                ("geocode", point.as_str()),
                ("format", "json"),
                ("lang", self.lang.as_str()),
                ("results", "1"),
            ])
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::from_request(e, self.timeout_secs))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!("Geocoder returned {}: {}", status, body);
            return Err(Error::Geocoder(format!("HTTP {}", status.as_u16())));
        }

        let body: GeocoderResponse = response
            .json()
            .await
            .map_err(|e| Error::from_request(e, self.timeout_secs))?;

        body.response
            .collection
            .feature_member
            .into_iter()
            .find_map(|member| member.geo_object.address())
            .ok_or_else(|| Error::Geocoder("no objects found at these coordinates".to_string()))
    }
}
