//! API Gateway proxy helpers.
//!
//! The webhook is invoked either directly with the bot-platform payload or
//! through an API Gateway proxy integration that wraps it in `body`.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// API Gateway proxy request (simplified)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiGatewayRequest {
    body: Option<String>,
    is_base64_encoded: Option<bool>,
}

/// API Gateway proxy response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl ApiGatewayResponse {
    pub fn json(status_code: u16, data: &Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert(
            "content-type".to_string(),
            "application/json; charset=utf-8".to_string(),
        );
        Self {
            status_code,
            headers,
            body: data.to_string(),
            is_base64_encoded: false,
        }
    }
}

/// An invocation payload with its transport unwrapped.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub payload: Value,
    /// Reply must be wrapped in an [`ApiGatewayResponse`]
    pub proxied: bool,
}

fn is_proxy_event(event: &Value) -> bool {
    let Some(obj) = event.as_object() else {
        return false;
    };
    obj.contains_key("body")
        && ["httpMethod", "requestContext", "isBase64Encoded", "routeKey"]
            .iter()
            .any(|key| obj.contains_key(*key))
}

/// Strip an API Gateway envelope, if any.
///
/// A proxied body that is not JSON is passed on as a string so the
/// normalizer can classify it.
pub fn unwrap_event(event: Value) -> InboundEvent {
    if !is_proxy_event(&event) {
        return InboundEvent {
            payload: event,
            proxied: false,
        };
    }

    let request: ApiGatewayRequest = match serde_json::from_value(event) {
        Ok(request) => request,
        Err(e) => {
            warn!("Unreadable API Gateway event: {}", e);
            return InboundEvent {
                payload: Value::Null,
                proxied: true,
            };
        }
    };

    let mut body = request.body.unwrap_or_default();
    if request.is_base64_encoded.unwrap_or(false) {
        match STANDARD.decode(body.as_bytes()) {
            Ok(bytes) => body = String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!("Invalid base64 body: {}", e);
                body.clear();
            }
        }
    }

    let payload = serde_json::from_str(&body).unwrap_or(Value::String(body));
    InboundEvent {
        payload,
        proxied: true,
    }
}

/// Wrap a rendered response for the transport it arrived on.
pub fn wrap_response(response: Value, proxied: bool) -> Value {
    if !proxied {
        return response;
    }
    let proxy = ApiGatewayResponse::json(200, &response);
    serde_json::to_value(proxy).unwrap_or(response)
}
