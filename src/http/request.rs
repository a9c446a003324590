use bytes::Bytes;
use http::{Method, Version};

/// A fully received HTTP/1.x request
///
/// Headers are kept as an ordered list of `(name, value)` pairs exactly as
/// they appeared on the wire, including repeats and the original name
/// spelling. `http::HeaderMap` would lowercase names, which an echo of what
/// the client sent must not do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Request target as sent, never decoded or normalized
    pub target: String,
    pub version: Version,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Request {
    /// An HTTP/1.1 request with no headers and an empty body
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            version: Version::HTTP_11,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Appends a header, keeping any earlier header of the same name
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the last value of the header `name`, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the connection should stay open after this request is answered
    ///
    /// HTTP/1.1 persists unless the client sent `Connection: close`;
    /// HTTP/1.0 closes unless the client sent `Connection: keep-alive`.
    pub fn keep_alive(&self) -> bool {
        let tokens = |wanted: &str| {
            self.headers
                .iter()
                .filter(|(n, _)| n.eq_ignore_ascii_case("connection"))
                .flat_map(|(_, v)| v.split(','))
                .any(|t| t.trim().eq_ignore_ascii_case(wanted))
        };

        match self.version {
            Version::HTTP_11 => !tokens("close"),
            _ => tokens("keep-alive"),
        }
    }

    /// The request line as it appears in access logs, e.g. `GET /a?b=1 HTTP/1.1`
    pub fn request_line(&self) -> String {
        format!("{} {} {:?}", self.method, self.target, self.version)
    }
}
