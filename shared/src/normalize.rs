//! Input normalization for map-picker payloads.
//!
//! The webapp has sent its data in several shapes over time: a JSON string
//! under one of a few keys, an already-decoded object, or plain top-level
//! fields. [`normalize`] folds all of them into a [`LocationInput`] and never
//! fails; problems degrade to default values plus the `raw_payload_valid`
//! flag.

use std::borrow::Cow;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::{Action, InboundRequest, LocationInput};

/// Accepted key spellings for every logical field, in priority order.
#[derive(Debug, Clone)]
pub struct FieldAliases {
    /// Keys that may carry the embedded webapp JSON
    pub payload: Vec<String>,
    pub address: Vec<String>,
    pub latitude: Vec<String>,
    pub longitude: Vec<String>,
    pub coordinates: Vec<String>,
    pub user_id: Vec<String>,
    pub timestamp: Vec<String>,
    pub action: Vec<String>,
    pub api_key: Vec<String>,
}

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self {
            payload: keys(&["webapp_data", "web_app_data", "webAppData"]),
            address: keys(&["address"]),
            latitude: keys(&["latitude", "lat"]),
            longitude: keys(&["longitude", "lng", "lon"]),
            coordinates: keys(&["coordinates", "coords"]),
            user_id: keys(&["user_id", "userId", "client_id"]),
            timestamp: keys(&["timestamp"]),
            action: keys(&["action"]),
            api_key: keys(&["yandex_api_key", "api_key"]),
        }
    }
}

/// Parse a raw payload into the request action, location and geocoder key.
pub fn parse_request(raw: &Value, aliases: &FieldAliases) -> InboundRequest {
    let Some(root) = root_object(raw) else {
        warn!("Payload is not a JSON object");
        return InboundRequest {
            action: Action::Legacy,
            input: LocationInput::default(),
            geocoder_api_key: None,
        };
    };

    let geocoder_api_key = lookup(&root, &aliases.api_key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(String::from);

    InboundRequest {
        action: action_of(&root, aliases),
        input: normalize_object(&root, aliases),
        geocoder_api_key,
    }
}

/// Only the requested action, without normalizing the location.
pub fn request_action(raw: &Value, aliases: &FieldAliases) -> Action {
    root_object(raw)
        .map(|root| action_of(&root, aliases))
        .unwrap_or(Action::Legacy)
}

/// Normalize any supported payload shape into a [`LocationInput`].
pub fn normalize(raw: &Value, aliases: &FieldAliases) -> LocationInput {
    match root_object(raw) {
        Some(root) => normalize_object(&root, aliases),
        None => {
            warn!("Payload is not a JSON object");
            LocationInput::default()
        }
    }
}

fn action_of(root: &Map<String, Value>, aliases: &FieldAliases) -> Action {
    Action::from_name(lookup(root, &aliases.action).and_then(Value::as_str))
}

fn normalize_object(root: &Map<String, Value>, aliases: &FieldAliases) -> LocationInput {
    let embedded = embedded_object(root, aliases);
    let flat = read_fields(root, aliases);

    // Only an unparsable webapp blob with nothing to fall back on is
    // malformed; a well-formed payload without location fields is not.
    let raw_payload_valid = !matches!(embedded, Embedded::Unparsable) || flat.is_usable();

    let fields = match &embedded {
        Embedded::Found(obj) => read_fields(obj, aliases).or(flat),
        Embedded::Unparsable | Embedded::Absent => flat,
    };

    let mut latitude = fields.latitude.unwrap_or(0.0);
    let mut longitude = fields.longitude.unwrap_or(0.0);
    if latitude == 0.0 && longitude == 0.0 {
        if let Some((lat, lng)) = fields.coordinates.as_deref().and_then(parse_coordinates_text) {
            debug!("Coordinates taken from coordinates text");
            latitude = lat;
            longitude = lng;
        }
    }

    LocationInput {
        address: fields.address,
        latitude,
        longitude,
        coordinates_text: fields.coordinates,
        user_id: fields.user_id,
        timestamp: fields.timestamp,
        raw_payload_valid,
    }
}

/// Split `"lat, lng"` into two finite numbers.
pub fn parse_coordinates_text(text: &str) -> Option<(f64, f64)> {
    let mut parts = text
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|part| !part.is_empty());
    let lat = parse_number(parts.next()?)?;
    let lng = parse_number(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some((lat, lng))
}

/// Fields read from one object; `None` means absent or unusable.
#[derive(Debug, Clone, Default)]
struct RawFields {
    address: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    coordinates: Option<String>,
    user_id: Option<String>,
    timestamp: Option<String>,
}

impl RawFields {
    fn is_usable(&self) -> bool {
        self.address.is_some()
            || self.latitude.is_some()
            || self.longitude.is_some()
            || self.coordinates.is_some()
    }

    /// Fill gaps in `self` from `fallback`.
    fn or(self, fallback: RawFields) -> RawFields {
        RawFields {
            address: self.address.or(fallback.address),
            latitude: self.latitude.or(fallback.latitude),
            longitude: self.longitude.or(fallback.longitude),
            coordinates: self.coordinates.or(fallback.coordinates),
            user_id: self.user_id.or(fallback.user_id),
            timestamp: self.timestamp.or(fallback.timestamp),
        }
    }
}

fn read_fields(obj: &Map<String, Value>, aliases: &FieldAliases) -> RawFields {
    RawFields {
        address: lookup(obj, &aliases.address)
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string()),
        latitude: lookup(obj, &aliases.latitude).and_then(coerce_f64),
        longitude: lookup(obj, &aliases.longitude).and_then(coerce_f64),
        coordinates: lookup(obj, &aliases.coordinates)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from),
        user_id: lookup(obj, &aliases.user_id).and_then(coerce_text),
        timestamp: lookup(obj, &aliases.timestamp).and_then(coerce_text),
    }
}

/// The payload itself may arrive as a JSON-encoded string.
fn root_object(raw: &Value) -> Option<Cow<'_, Map<String, Value>>> {
    match raw {
        Value::Object(obj) => Some(Cow::Borrowed(obj)),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(obj)) => Some(Cow::Owned(obj)),
            _ => None,
        },
        _ => None,
    }
}

/// Outcome of looking for the embedded webapp JSON.
enum Embedded<'a> {
    Found(Cow<'a, Map<String, Value>>),
    /// A payload key was present but held no JSON object
    Unparsable,
    Absent,
}

fn embedded_object<'a>(root: &'a Map<String, Value>, aliases: &FieldAliases) -> Embedded<'a> {
    let mut outcome = Embedded::Absent;
    for key in &aliases.payload {
        match root.get(key) {
            Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(obj)) => return Embedded::Found(Cow::Owned(obj)),
                Ok(other) => {
                    warn!(key = %key, kind = %json_kind(&other), "Webapp data is not an object");
                    outcome = Embedded::Unparsable;
                }
                Err(e) => {
                    warn!(key = %key, "Failed to parse webapp data: {}", e);
                    outcome = Embedded::Unparsable;
                }
            },
            Some(Value::Object(obj)) => return Embedded::Found(Cow::Borrowed(obj)),
            _ => {}
        }
    }
    outcome
}

/// First non-null value under any of `names`.
fn lookup<'a>(obj: &'a Map<String, Value>, names: &[String]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| obj.get(name))
        .find(|value| !value.is_null())
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(raw: Value) -> LocationInput {
        normalize(&raw, &FieldAliases::default())
    }

    #[test]
    fn test_embedded_webapp_data() {
        let input = run(json!({
            "webapp_data": "{\"address\":\"Moscow, Red Square\",\"latitude\":55.7539,\"longitude\":37.6208,\"coordinates\":\"55.7539, 37.6208\",\"user_id\":12345}"
        }));
        assert_eq!(input.address.as_deref(), Some("Moscow, Red Square"));
        assert_eq!(input.latitude, 55.7539);
        assert_eq!(input.longitude, 37.6208);
        assert_eq!(input.coordinates_text.as_deref(), Some("55.7539, 37.6208"));
        assert_eq!(input.user_id.as_deref(), Some("12345"));
        assert!(input.raw_payload_valid);
    }

    #[test]
    fn test_alias_keys_and_decoded_object() {
        let input = run(json!({"web_app_data": "{\"latitude\":\"55.1\",\"longitude\":\"37.2\"}"}));
        assert_eq!((input.latitude, input.longitude), (55.1, 37.2));

        let input = run(json!({"webAppData": {"address": "Kazan", "userId": "u-1"}}));
        assert_eq!(input.address.as_deref(), Some("Kazan"));
        assert_eq!(input.user_id.as_deref(), Some("u-1"));
        assert!(input.raw_payload_valid);
    }

    #[test]
    fn test_flat_fields() {
        let input = run(json!({
            "action": "get_address_from_coords",
            "latitude": 55.7558,
            "longitude": "37.6173",
            "yandex_api_key": "k"
        }));
        assert_eq!(input.latitude, 55.7558);
        assert_eq!(input.longitude, 37.6173);
        assert!(input.address.is_none());
        assert!(input.raw_payload_valid);
    }

    #[test]
    fn test_truncated_json_falls_back_to_flat_fields() {
        let input = run(json!({
            "webapp_data": "{\"address\":\"Mosc",
            "address": "Saint Petersburg",
            "latitude": 59.93
        }));
        assert_eq!(input.address.as_deref(), Some("Saint Petersburg"));
        assert_eq!(input.latitude, 59.93);
        assert_eq!(input.longitude, 0.0);
        assert!(input.raw_payload_valid);
    }

    #[test]
    fn test_truncated_json_without_flat_fields_is_invalid() {
        let input = run(json!({"webapp_data": "{\"address\":\"Mosc"}));
        assert!(!input.raw_payload_valid);
        assert!(input.address.is_none());
        assert_eq!((input.latitude, input.longitude), (0.0, 0.0));
    }

    #[test]
    fn test_well_formed_payload_without_location_is_valid() {
        let input = run(json!({}));
        assert!(input.raw_payload_valid);
        assert!(input.address.is_none());

        let input = run(json!({"action": "get_address_from_coords", "yandex_api_key": "k"}));
        assert!(input.raw_payload_valid);
        assert_eq!((input.latitude, input.longitude), (0.0, 0.0));

        let input = run(json!({"webapp_data": "{}"}));
        assert!(input.raw_payload_valid);
    }

    #[test]
    fn test_non_object_webapp_data_without_flat_fields_is_invalid() {
        let input = run(json!({"webapp_data": "[1, 2]"}));
        assert!(!input.raw_payload_valid);
    }

    #[test]
    fn test_non_numeric_coordinates_become_zero() {
        let input = run(json!({"address": "", "latitude": "north", "longitude": [1, 2]}));
        assert_eq!((input.latitude, input.longitude), (0.0, 0.0));
        assert_eq!(input.address.as_deref(), Some(""));
        assert!(input.raw_payload_valid);
    }

    #[test]
    fn test_embedded_fields_win_over_flat() {
        let input = run(json!({
            "webapp_data": "{\"address\":\"Inner\"}",
            "address": "Outer",
            "latitude": 10.5,
            "longitude": 20.25
        }));
        assert_eq!(input.address.as_deref(), Some("Inner"));
        assert_eq!((input.latitude, input.longitude), (10.5, 20.25));
    }

    #[test]
    fn test_coordinates_text_fills_missing_numbers() {
        let input = run(json!({"coordinates": "55.7539, 37.6208"}));
        assert_eq!((input.latitude, input.longitude), (55.7539, 37.6208));
    }

    #[test]
    fn test_payload_as_string_and_non_object() {
        let input = run(Value::String("{\"address\":\"Tver\"}".to_string()));
        assert_eq!(input.address.as_deref(), Some("Tver"));

        let input = run(json!([1, 2, 3]));
        assert!(!input.raw_payload_valid);
    }

    #[test]
    fn test_parse_request_reads_metadata() {
        let request = parse_request(
            &json!({
                "action": "process_web_app_data",
                "web_app_data": "{\"address\":\"Omsk\"}",
                "yandex_api_key": " abc ",
                "user_id": 7
            }),
            &FieldAliases::default(),
        );
        assert_eq!(request.action, Action::ProcessWebAppData);
        assert_eq!(request.geocoder_api_key.as_deref(), Some("abc"));
        assert_eq!(request.input.user_id.as_deref(), Some("7"));
        assert_eq!(
            request_action(&json!({"action": "get_address_from_coords"}), &FieldAliases::default()),
            Action::GetAddressFromCoords
        );
    }

    #[test]
    fn test_parse_request_matches_normalize() {
        let aliases = FieldAliases::default();
        for raw in [
            json!({"webapp_data": "{\"latitude\":1.5,\"longitude\":2.5}", "user_id": 3}),
            Value::String("{\"address\":\"Tver\",\"action\":\"get_address_from_coords\"}".to_string()),
            json!({"webapp_data": "{broken"}),
            json!("not json"),
        ] {
            let request = parse_request(&raw, &aliases);
            assert_eq!(request.input, normalize(&raw, &aliases));
            assert_eq!(request.action, request_action(&raw, &aliases));
        }

        let request = parse_request(&json!(42), &aliases);
        assert_eq!(request.action, Action::Legacy);
        assert!(request.geocoder_api_key.is_none());
        assert!(!request.input.raw_payload_valid);
    }

    #[test]
    fn test_parse_coordinates_text() {
        assert_eq!(parse_coordinates_text("1.5, 2.5"), Some((1.5, 2.5)));
        assert_eq!(parse_coordinates_text("1.5 2.5"), Some((1.5, 2.5)));
        assert_eq!(parse_coordinates_text("1.5"), None);
        assert_eq!(parse_coordinates_text("a, b"), None);
        assert_eq!(parse_coordinates_text("1, 2, 3"), None);
    }
}
