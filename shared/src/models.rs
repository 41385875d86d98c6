//! Shared data models.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Normalized view of a map-picker payload.
///
/// Coordinates are never absent: anything missing or unparsable is `0.0`,
/// and `(0.0, 0.0)` means "no coordinates".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationInput {
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub coordinates_text: Option<String>,
    pub user_id: Option<String>,
    pub timestamp: Option<String>,
    /// False when neither the embedded JSON nor the flat fields yielded anything
    pub raw_payload_valid: bool,
}

impl LocationInput {
    /// Both coordinates are non-zero.
    pub fn has_coordinates(&self) -> bool {
        self.latitude != 0.0 && self.longitude != 0.0
    }
}

/// Where the resolved address came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    Provided,
    Geocoded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    High,
    Unknown,
}

/// A location with a usable, non-empty address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "coordinates")]
    pub coordinates_text: String,
    pub source: LocationSource,
    pub accuracy: Accuracy,
}

/// Closed set of reasons a request could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    NoAddressSelected,
    MalformedInput,
    GeocoderError,
    InternalError,
}

impl FailureKind {
    /// Stable machine-readable text placed in the `error` field.
    pub fn error_code(self) -> &'static str {
        match self {
            FailureKind::NoAddressSelected => "No address selected",
            FailureKind::MalformedInput => "Invalid JSON format",
            FailureKind::GeocoderError => "Address not determined",
            FailureKind::InternalError => "Internal error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.error_code())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl ResolutionFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn no_address() -> Self {
        Self::new(
            FailureKind::NoAddressSelected,
            "no address and no usable coordinates",
        )
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::MalformedInput, detail)
    }

    pub fn geocoder(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::GeocoderError, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::InternalError, detail)
    }
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

pub type Resolution = std::result::Result<ResolvedLocation, ResolutionFailure>;

/// Caller-facing result of one request, before layout rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub success: bool,
    pub payload: Option<ResolvedLocation>,
    /// Localized, user-facing text
    pub message: String,
    /// Flat string variables for bot-platform form binding
    pub variables: BTreeMap<String, String>,
    pub error: Option<String>,
    pub failure_kind: Option<FailureKind>,
    pub user_id: Option<String>,
    pub timestamp: Option<String>,
}

/// Requested operation, taken from the payload's `action` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `process_web_app_data`
    ProcessWebAppData,
    /// `get_address_from_coords`
    GetAddressFromCoords,
    /// No (or an unknown) action: the original `webapp_data` handler
    Legacy,
}

impl Action {
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some("process_web_app_data") => Action::ProcessWebAppData,
            Some("get_address_from_coords") => Action::GetAddressFromCoords,
            _ => Action::Legacy,
        }
    }
}

/// A parsed inbound request: the location plus request-level metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundRequest {
    pub action: Action,
    pub input: LocationInput,
    /// Geocoder key supplied by the caller (`yandex_api_key`)
    pub geocoder_api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_from_name() {
        assert_eq!(
            Action::from_name(Some("process_web_app_data")),
            Action::ProcessWebAppData
        );
        assert_eq!(
            Action::from_name(Some(" get_address_from_coords ")),
            Action::GetAddressFromCoords
        );
        assert_eq!(Action::from_name(Some("something_else")), Action::Legacy);
        assert_eq!(Action::from_name(None), Action::Legacy);
    }

    #[test]
    fn test_has_coordinates_requires_both() {
        let mut input = LocationInput {
            latitude: 55.75,
            ..Default::default()
        };
        assert!(!input.has_coordinates());
        input.longitude = 37.61;
        assert!(input.has_coordinates());
    }
}
