//! Decides whether an address is already usable or must be geocoded.

use tracing::{info, warn};

use crate::geocoder::ReverseGeocoder;
use crate::models::{
    Accuracy, LocationInput, LocationSource, Resolution, ResolutionFailure, ResolvedLocation,
};

/// Placeholder strings the webapp and geocoder use instead of an address.
const PLACEHOLDER_ADDRESSES: &[&str] = &[
    "адрес не указан",
    "адрес не определен",
    "адрес не определён",
    "no address selected",
    "address not determined",
];

/// True for blank strings and known "no address" placeholders.
pub fn is_placeholder_address(address: &str) -> bool {
    let normalized = address.trim().to_lowercase();
    normalized.is_empty() || PLACEHOLDER_ADDRESSES.contains(&normalized.as_str())
}

/// `"{lat:.6}, {lng:.6}"`, used when the caller sent no coordinates text.
pub fn format_coordinates(latitude: f64, longitude: f64) -> String {
    format!("{:.6}, {:.6}", latitude, longitude)
}

/// Resolve a normalized input into a location with an address.
///
/// The geocoder is called at most once, and only when the input has no
/// usable address but does have non-zero coordinates. `api_key` is passed
/// through to the geocoder unchanged.
pub async fn resolve<G>(input: &LocationInput, geocoder: &G, api_key: Option<&str>) -> Resolution
where
    G: ReverseGeocoder,
{
    if !input.raw_payload_valid {
        return Err(ResolutionFailure::malformed(
            "payload carried no parsable location data",
        ));
    }

    let coordinates_text = input
        .coordinates_text
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format_coordinates(input.latitude, input.longitude));

    if let Some(address) = input
        .address
        .as_deref()
        .map(str::trim)
        .filter(|address| !is_placeholder_address(address))
    {
        info!(user_id = ?input.user_id, "Using address selected on the map");
        return Ok(ResolvedLocation {
            address: address.to_string(),
            latitude: input.latitude,
            longitude: input.longitude,
            coordinates_text,
            source: LocationSource::Provided,
            accuracy: Accuracy::High,
        });
    }

    if !input.has_coordinates() {
        return Err(ResolutionFailure::no_address());
    }

    match geocoder
        .reverse_geocode(input.latitude, input.longitude, api_key)
        .await
    {
        Ok(address) if !is_placeholder_address(&address) => {
            info!(user_id = ?input.user_id, "Address resolved by geocoder");
            Ok(ResolvedLocation {
                address: address.trim().to_string(),
                latitude: input.latitude,
                longitude: input.longitude,
                coordinates_text,
                source: LocationSource::Geocoded,
                accuracy: Accuracy::High,
            })
        }
        Ok(address) => {
            warn!("Geocoder returned placeholder address {:?}", address);
            Err(ResolutionFailure::geocoder(format!(
                "geocoder returned no address ({:?})",
                address
            )))
        }
        Err(e) => {
            warn!("Reverse geocoding failed: {}", e);
            Err(ResolutionFailure::geocoder(e.to_string()))
        }
    }
}
