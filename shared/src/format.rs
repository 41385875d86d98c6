//! Response formatting: resolution result to caller-facing envelope.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::models::{FailureKind, Resolution, ResolutionFailure, ResolvedLocation, ResponseEnvelope};
use crate::Error;

/// Bot-platform variable names.
pub const VAR_ADDRESS: &str = "address";
pub const VAR_LATITUDE: &str = "latitude";
pub const VAR_LONGITUDE: &str = "longitude";
pub const VAR_COORDINATES: &str = "coordinates";
pub const VAR_MAP_SELECTED: &str = "map_selected";

const MAX_DETAIL_CHARS: usize = 200;
const FALLBACK_DETAIL: &str = "unknown error";

/// Language of user-facing messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    Ru,
    En,
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ru" | "ru_ru" | "ru-ru" => Ok(Locale::Ru),
            "en" | "en_us" | "en-us" | "en_gb" | "en-gb" => Ok(Locale::En),
            other => Err(Error::Config(format!("unsupported locale: {}", other))),
        }
    }
}

impl Locale {
    fn success_message(self, location: &ResolvedLocation) -> String {
        match self {
            Locale::Ru => format!(
                "✅ Отлично! Вы выбрали точку:\n\n📍 {}\n🌐 Координаты: {}",
                location.address, location.coordinates_text
            ),
            Locale::En => format!(
                "✅ Great! You picked a point:\n\n📍 {}\n🌐 Coordinates: {}",
                location.address, location.coordinates_text
            ),
        }
    }

    fn failure_message(self, kind: FailureKind) -> &'static str {
        match (self, kind) {
            (Locale::Ru, FailureKind::NoAddressSelected) => "❌ Пожалуйста, выберите адрес на карте",
            (Locale::Ru, FailureKind::MalformedInput) => "❌ Ошибка обработки данных",
            (Locale::Ru, FailureKind::GeocoderError) => {
                "❌ Не удалось определить адрес по координатам. Попробуйте выбрать точку ещё раз"
            }
            (Locale::Ru, FailureKind::InternalError) => {
                "❌ Произошла ошибка при обработке выбранной точки"
            }
            (Locale::En, FailureKind::NoAddressSelected) => "❌ Please select an address on the map",
            (Locale::En, FailureKind::MalformedInput) => "❌ Could not process the map data",
            (Locale::En, FailureKind::GeocoderError) => {
                "❌ Could not determine the address for these coordinates. Please pick the point again"
            }
            (Locale::En, FailureKind::InternalError) => {
                "❌ Something went wrong while processing the selected point"
            }
        }
    }
}

/// Turn a resolution result into a response envelope. Never fails.
pub fn format(result: &Resolution, locale: Locale) -> ResponseEnvelope {
    match result {
        Ok(location) => format_success(location, locale),
        Err(failure) => format_failure(failure, locale),
    }
}

fn format_success(location: &ResolvedLocation, locale: Locale) -> ResponseEnvelope {
    let mut variables = BTreeMap::new();
    variables.insert(VAR_ADDRESS.to_string(), location.address.clone());
    variables.insert(VAR_LATITUDE.to_string(), location.latitude.to_string());
    variables.insert(VAR_LONGITUDE.to_string(), location.longitude.to_string());
    variables.insert(VAR_COORDINATES.to_string(), location.coordinates_text.clone());
    variables.insert(VAR_MAP_SELECTED.to_string(), "true".to_string());

    ResponseEnvelope {
        success: true,
        payload: Some(location.clone()),
        message: locale.success_message(location),
        variables,
        error: None,
        failure_kind: None,
        user_id: None,
        timestamp: None,
    }
}

fn format_failure(failure: &ResolutionFailure, locale: Locale) -> ResponseEnvelope {
    let mut variables = BTreeMap::new();
    variables.insert(VAR_MAP_SELECTED.to_string(), "false".to_string());

    // Provider and internal details help the bot operator; the other kinds
    // keep the stable code only.
    let error = match failure.kind {
        FailureKind::GeocoderError | FailureKind::InternalError => format!(
            "{}: {}",
            failure.kind.error_code(),
            sanitize_detail(&failure.detail)
        ),
        _ => failure.kind.error_code().to_string(),
    };

    ResponseEnvelope {
        success: false,
        payload: None,
        message: locale.failure_message(failure.kind).to_string(),
        variables,
        error: Some(error),
        failure_kind: Some(failure.kind),
        user_id: None,
        timestamp: None,
    }
}

/// Single-line, bounded detail text; blank or garbled input becomes a fallback.
fn sanitize_detail(detail: &str) -> String {
    let cleaned: String = detail
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.is_empty() || cleaned.chars().all(|c| c == char::REPLACEMENT_CHARACTER) {
        return FALLBACK_DETAIL.to_string();
    }

    if cleaned.chars().count() > MAX_DETAIL_CHARS {
        let truncated: String = cleaned.chars().take(MAX_DETAIL_CHARS).collect();
        format!("{}…", truncated)
    } else {
        cleaned
    }
}
