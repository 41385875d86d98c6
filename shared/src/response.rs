//! Output layouts expected by the different bot-platform callers.

use std::str::FromStr;

use serde_json::{json, Map, Value};

use crate::models::{Action, ResponseEnvelope};
use crate::Error;

/// Which JSON field names a response populates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseLayout {
    /// `selected_address`, `selected_latitude`, ... at the top level
    Selected,
    /// Nested `processed_data` object plus `variables`
    ProcessedData,
    /// Only the `variables` map
    Variables,
    /// Top-level `address` and `coordinates`
    Address,
}

impl ResponseLayout {
    /// Layout each action has historically answered with.
    pub fn for_action(action: Action) -> Self {
        match action {
            Action::ProcessWebAppData => ResponseLayout::ProcessedData,
            Action::GetAddressFromCoords => ResponseLayout::Address,
            Action::Legacy => ResponseLayout::Selected,
        }
    }
}

impl FromStr for ResponseLayout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "selected" => Ok(ResponseLayout::Selected),
            "processed_data" => Ok(ResponseLayout::ProcessedData),
            "variables" => Ok(ResponseLayout::Variables),
            "address" => Ok(ResponseLayout::Address),
            other => Err(Error::Config(format!("unknown response layout: {}", other))),
        }
    }
}

/// Render an envelope as the JSON object the caller expects.
pub fn render(envelope: &ResponseEnvelope, layout: ResponseLayout) -> Value {
    let mut out = Map::new();
    out.insert("success".to_string(), Value::Bool(envelope.success));

    if let Some(error) = &envelope.error {
        out.insert("error".to_string(), Value::String(error.clone()));
    }

    let variables = json!(envelope.variables);

    match (layout, &envelope.payload) {
        (ResponseLayout::Selected, Some(location)) => {
            out.insert("selected_address".to_string(), json!(location.address));
            out.insert("selected_latitude".to_string(), json!(location.latitude));
            out.insert("selected_longitude".to_string(), json!(location.longitude));
            out.insert(
                "selected_coordinates".to_string(),
                json!(location.coordinates_text),
            );
            out.insert(
                "user_id".to_string(),
                json!(envelope.user_id.clone().unwrap_or_default()),
            );
        }
        (ResponseLayout::ProcessedData, Some(location)) => {
            let mut processed = match serde_json::to_value(location) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            };
            processed.insert("user_id".to_string(), json!(envelope.user_id));
            processed.insert("timestamp".to_string(), json!(envelope.timestamp));
            out.insert("processed_data".to_string(), Value::Object(processed));
            out.insert("variables".to_string(), variables);
        }
        (ResponseLayout::ProcessedData, None) | (ResponseLayout::Variables, _) => {
            out.insert("variables".to_string(), variables);
        }
        (ResponseLayout::Address, Some(location)) => {
            out.insert("address".to_string(), json!(location.address));
            out.insert("coordinates".to_string(), json!(location.coordinates_text));
        }
        (ResponseLayout::Selected, None) | (ResponseLayout::Address, None) => {}
    }

    out.insert("message".to_string(), Value::String(envelope.message.clone()));
    Value::Object(out)
}
