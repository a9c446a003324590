//! The echo document and the handler that produces it

use super::request::Request;
use super::response::Response;
use crate::Result;
use http::{Method, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{error, warn};

/// JSON description of a received request
///
/// Built fresh for every request and dropped once serialized.
///
/// # Examples
///
/// ```rust
/// use bytes::Bytes;
/// use http::{Method, Version};
/// use jsonecho::http::{EchoResponse, Request};
///
/// let request = Request {
///     method: Method::POST,
///     target: "/test".to_string(),
///     version: Version::HTTP_11,
///     headers: vec![("X-Foo".to_string(), "bar".to_string())],
///     body: Bytes::from_static(br#"{"x":5}"#),
/// };
///
/// let echo = EchoResponse::from_request(&request);
/// assert_eq!(echo.path, "/test");
/// assert_eq!(echo.json, Some(serde_json::json!({"x": 5})));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoResponse {
    pub method: String,
    pub path: String,
    pub headers: Map<String, Value>,
    pub body: String,
    /// Parsed body; absent (not `null`) unless the body is non-empty valid JSON
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub json: Option<Value>,
}

impl EchoResponse {
    pub fn from_request(request: &Request) -> Self {
        let mut headers = Map::new();
        for (name, value) in &request.headers {
            // First spelling keeps its slot, last value wins.
            let key = headers
                .keys()
                .find(|existing| existing.eq_ignore_ascii_case(name))
                .cloned()
                .unwrap_or_else(|| name.clone());
            headers.insert(key, Value::String(value.clone()));
        }

        let body = match std::str::from_utf8(&request.body) {
            Ok(text) => text.to_string(),
            Err(e) => {
                warn!(error = %e, size = request.body.len(), "Request body is not valid UTF-8, replacing invalid bytes");
                String::from_utf8_lossy(&request.body).into_owned()
            }
        };

        Self {
            method: request.method.to_string(),
            path: request.target.clone(),
            headers,
            body,
            json: parse_json_body(&request.body),
        }
    }

    /// Serializes with two-space indentation
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parses a request body as JSON; `None` for an empty or unparsable body
pub fn parse_json_body(body: &[u8]) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice(body).ok()
}

// A present `"json": null` must stay `Some(Value::Null)`.
fn deserialize_present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Answers a request: an echo for GET, POST, PUT and DELETE, `501` for anything else
pub fn handle(request: &Request) -> Response {
    match request.method {
        Method::GET | Method::POST | Method::PUT | Method::DELETE => echo(request),
        ref other => Response::error(
            StatusCode::NOT_IMPLEMENTED,
            &format!("Unsupported method ({other})"),
        ),
    }
}

fn echo(request: &Request) -> Response {
    match EchoResponse::from_request(request).to_pretty_json() {
        Ok(body) => Response::json(body),
        Err(e) => {
            error!(error = %e, "Failed to serialize echo response");
            Response::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to serialize echo response")
        }
    }
}
