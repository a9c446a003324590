use super::request::Request;
use super::response::Response;
use bytes::{Buf, BufMut, BytesMut};
use http::{Method, StatusCode, Version};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

/// Most header lines accepted in one request
pub const MAX_HEADERS: usize = 100;

/// Largest request head (request line plus headers) accepted, in bytes
pub const MAX_HEAD_SIZE: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum HttpProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("HTTP parsing error: {0}")]
    HttpParse(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Request head exceeds {} bytes or {} headers", MAX_HEAD_SIZE, MAX_HEADERS)]
    HeadTooLarge,
    #[error("Request body of {size} bytes exceeds the {limit} byte limit")]
    BodyTooLarge { size: usize, limit: usize },
    #[error("Transfer-Encoding {0:?} is not supported")]
    UnsupportedTransferEncoding(String),
    #[error("Incomplete request")]
    IncompleteRequest,
}

impl HttpProtocolError {
    /// Status code used when answering a client whose request failed to decode
    pub fn status(&self) -> StatusCode {
        match self {
            HttpProtocolError::HeadTooLarge => StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
            HttpProtocolError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            HttpProtocolError::UnsupportedTransferEncoding(_) => StatusCode::NOT_IMPLEMENTED,
            HttpProtocolError::Io(_)
            | HttpProtocolError::HttpParse(_)
            | HttpProtocolError::InvalidRequest(_)
            | HttpProtocolError::IncompleteRequest => StatusCode::BAD_REQUEST,
        }
    }
}

/// A parsed request head still waiting for its body
#[derive(Debug)]
struct PendingHead {
    method: Method,
    target: String,
    version: Version,
    headers: Vec<(String, String)>,
    content_length: usize,
}

/// HTTP/1.x server codec
///
/// Decodes `Content-Length` framed requests and encodes responses. The
/// decoder remembers a parsed head between calls so a slow body never
/// causes the head to be parsed twice.
#[derive(Debug)]
pub struct HttpCodec {
    max_body_size: usize,
    pending: Option<PendingHead>,
}

impl HttpCodec {
    pub fn new(max_body_size: usize) -> Self {
        Self {
            max_body_size,
            pending: None,
        }
    }
}

impl Decoder for HttpCodec {
    type Item = Request;
    type Error = HttpProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Request>, Self::Error> {
        let head = match self.pending.take() {
            Some(head) => head,
            None => match parse_head(src, self.max_body_size)? {
                Some(head) => head,
                None => return Ok(None),
            },
        };

        if src.len() < head.content_length {
            src.reserve(head.content_length - src.len());
            self.pending = Some(head);
            return Ok(None);
        }

        let body = src.split_to(head.content_length).freeze();
        Ok(Some(Request {
            method: head.method,
            target: head.target,
            version: head.version,
            headers: head.headers,
            body,
        }))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Request>, Self::Error> {
        match self.decode(src)? {
            Some(request) => Ok(Some(request)),
            None if src.is_empty() && self.pending.is_none() => Ok(None),
            None => Err(HttpProtocolError::IncompleteRequest),
        }
    }
}

impl Encoder<Response> for HttpCodec {
    type Error = HttpProtocolError;

    fn encode(&mut self, response: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let reason = response.status.canonical_reason().unwrap_or("");
        dst.reserve(128 + response.body.len());

        dst.put_slice(format!("HTTP/1.1 {} {}\r\n", response.status.as_u16(), reason).as_bytes());
        for (name, value) in &response.headers {
            put_header(dst, name, value);
        }
        put_header(dst, "Content-Length", &response.body.len().to_string());
        dst.put_slice(b"\r\n");
        dst.put_slice(&response.body);
        Ok(())
    }
}

pub(crate) fn put_header(dst: &mut BytesMut, name: &str, value: &str) {
    dst.put_slice(name.as_bytes());
    dst.put_slice(b": ");
    dst.put_slice(value.as_bytes());
    dst.put_slice(b"\r\n");
}

/// Parses the request head at the front of `src`, consuming it on success
fn parse_head(
    src: &mut BytesMut,
    max_body_size: usize,
) -> Result<Option<PendingHead>, HttpProtocolError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);

    let parsed_len = match req.parse(&src[..]) {
        Ok(httparse::Status::Complete(parsed_len)) => parsed_len,
        Ok(httparse::Status::Partial) => {
            if src.len() > MAX_HEAD_SIZE {
                return Err(HttpProtocolError::HeadTooLarge);
            }
            return Ok(None);
        }
        Err(httparse::Error::TooManyHeaders) => return Err(HttpProtocolError::HeadTooLarge),
        Err(e) => {
            return Err(HttpProtocolError::HttpParse(format!(
                "Failed to parse request head: {e}"
            )));
        }
    };
    if parsed_len > MAX_HEAD_SIZE {
        return Err(HttpProtocolError::HeadTooLarge);
    }

    let method = req
        .method
        .ok_or_else(|| HttpProtocolError::HttpParse("Missing method".to_string()))?;
    let method = Method::from_bytes(method.as_bytes())
        .map_err(|e| HttpProtocolError::InvalidRequest(format!("Invalid method: {e}")))?;
    let target = req
        .path
        .ok_or_else(|| HttpProtocolError::HttpParse("Missing request target".to_string()))?
        .to_string();
    let version = match req.version {
        Some(0) => Version::HTTP_10,
        Some(1) => Version::HTTP_11,
        other => {
            return Err(HttpProtocolError::InvalidRequest(format!(
                "Unsupported HTTP version: {other:?}"
            )));
        }
    };
    let headers: Vec<(String, String)> = req
        .headers
        .iter()
        .map(|h| (h.name.to_string(), String::from_utf8_lossy(h.value).into_owned()))
        .collect();

    if let Some((_, encoding)) = headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("transfer-encoding"))
    {
        return Err(HttpProtocolError::UnsupportedTransferEncoding(encoding.clone()));
    }

    let content_length = content_length(&headers)?;
    if content_length > max_body_size {
        return Err(HttpProtocolError::BodyTooLarge {
            size: content_length,
            limit: max_body_size,
        });
    }

    src.advance(parsed_len);
    Ok(Some(PendingHead {
        method,
        target,
        version,
        headers,
        content_length,
    }))
}

/// Declared body length; 0 when absent
///
/// Repeated `Content-Length` headers are tolerated only when they agree.
pub(crate) fn content_length(headers: &[(String, String)]) -> Result<usize, HttpProtocolError> {
    let mut length = None;

    for (_, value) in headers
        .iter()
        .filter(|(n, _)| n.eq_ignore_ascii_case("content-length"))
    {
        let value = value.trim();
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(HttpProtocolError::InvalidRequest(format!(
                "Invalid Content-Length: {value:?}"
            )));
        }
        let parsed: usize = value.parse().map_err(|_| {
            HttpProtocolError::InvalidRequest(format!("Content-Length out of range: {value}"))
        })?;

        match length {
            Some(existing) if existing != parsed => {
                return Err(HttpProtocolError::InvalidRequest(
                    "Conflicting Content-Length headers".to_string(),
                ));
            }
            _ => length = Some(parsed),
        }
    }

    Ok(length.unwrap_or(0))
}
