use bytes::Bytes;
use http::StatusCode;
use serde_json::json;

/// An HTTP response ready to be encoded onto the wire
///
/// `Content-Length` is not stored in `headers`; the codec derives it from
/// the body when encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    /// Close the connection once this response has been written
    pub close: bool,
}

impl Response {
    /// A `200 OK` response carrying a JSON document
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: body.into(),
            close: false,
        }
    }

    /// An error response with a `{"error": message}` JSON body
    ///
    /// Error responses always close the connection.
    pub fn error(status: StatusCode, message: &str) -> Self {
        let body = json!({ "error": message }).to_string();
        Self {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Bytes::from(body),
            close: true,
        }
    }

    /// Appends a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the first value of the header `name`, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
