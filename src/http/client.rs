use super::codec::{HttpProtocolError, content_length, put_header};
use super::echo::EchoResponse;
use super::request::Request;
use crate::{EchoError, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use http::StatusCode;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::{Decoder, Encoder, Framed};

/// Configuration for HTTP echo clients
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Read timeout for operations
    pub read_timeout: Duration,
    /// Write timeout for operations
    pub write_timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Maximum response size to prevent memory exhaustion
    pub max_response_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_response_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// A response as received by [`HttpEchoClient`]
#[derive(Debug, Clone)]
pub struct ClientResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ClientResponse {
    /// Returns the last value of the header `name`, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Parses the body as a JSON value
    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// HTTP/1.1 client for talking to the echo server
///
/// Sends one request at a time over a persistent connection and reads
/// `Content-Length` framed responses.
///
/// # Examples
///
/// ```no_run
/// use http::Method;
/// use jsonecho::http::{HttpEchoClient, Request};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let addr = "127.0.0.1:9090".parse()?;
///     let mut client = HttpEchoClient::connect(addr).await?;
///
///     let request = Request::new(Method::POST, "/test")
///         .with_header("X-Foo", "bar")
///         .with_body(r#"{"x":5}"#);
///     let echo = client.echo(request).await?;
///     println!("Server saw {} {}", echo.method, echo.path);
///     Ok(())
/// }
/// ```
pub struct HttpEchoClient {
    framed: Framed<TcpStream, ClientCodec>,
    config: ClientConfig,
}

impl HttpEchoClient {
    /// Connect to a server with custom configuration
    pub async fn connect_with_config(addr: SocketAddr, config: ClientConfig) -> Result<Self> {
        let stream = timeout(config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| EchoError::Timeout("Connection timeout".to_string()))??;

        Ok(Self {
            framed: Framed::new(stream, ClientCodec::new(config.max_response_size)),
            config,
        })
    }

    /// Connect with default configuration
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        Self::connect_with_config(addr, ClientConfig::default()).await
    }

    /// Sends a request and waits for its response
    ///
    /// A `Content-Length` header is added when the request has a body and
    /// does not declare one itself.
    pub async fn send(&mut self, request: Request) -> Result<ClientResponse> {
        timeout(self.config.write_timeout, self.framed.send(request))
            .await
            .map_err(|_| EchoError::Timeout("Write timeout".to_string()))??;

        match timeout(self.config.read_timeout, self.framed.next()).await {
            Ok(Some(response)) => Ok(response?),
            Ok(None) => Err(EchoError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "Connection closed before a response was received",
            ))),
            Err(_) => Err(EchoError::Timeout("Read timeout".to_string())),
        }
    }

    /// Sends a request and decodes the echo document from a `200 OK` response
    pub async fn echo(&mut self, request: Request) -> Result<EchoResponse> {
        let response = self.send(request).await?;
        if response.status != StatusCode::OK {
            return Err(EchoError::Status(response.status));
        }
        Ok(serde_json::from_slice(&response.body)?)
    }
}

/// Client side of the wire format: encodes requests, decodes responses
#[derive(Debug)]
pub struct ClientCodec {
    max_response_size: usize,
}

impl ClientCodec {
    pub fn new(max_response_size: usize) -> Self {
        Self { max_response_size }
    }
}

impl Encoder<Request> for ClientCodec {
    type Error = HttpProtocolError;

    fn encode(&mut self, request: Request, dst: &mut BytesMut) -> std::result::Result<(), Self::Error> {
        dst.reserve(128 + request.body.len());
        dst.put_slice(request.request_line().as_bytes());
        dst.put_slice(b"\r\n");

        for (name, value) in &request.headers {
            put_header(dst, name, value);
        }
        if !request.body.is_empty() && request.header("content-length").is_none() {
            put_header(dst, "Content-Length", &request.body.len().to_string());
        }
        dst.put_slice(b"\r\n");
        dst.put_slice(&request.body);
        Ok(())
    }
}

impl Decoder for ClientCodec {
    type Item = ClientResponse;
    type Error = HttpProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> std::result::Result<Option<ClientResponse>, Self::Error> {
        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut res = httparse::Response::new(&mut headers);

        let head_len = match res.parse(&src[..]) {
            Ok(httparse::Status::Complete(head_len)) => head_len,
            Ok(httparse::Status::Partial) => return Ok(None),
            Err(e) => {
                return Err(HttpProtocolError::HttpParse(format!(
                    "Failed to parse response head: {e}"
                )));
            }
        };

        let status = res
            .code
            .and_then(|code| StatusCode::from_u16(code).ok())
            .ok_or_else(|| HttpProtocolError::HttpParse("Invalid status code".to_string()))?;
        let headers: Vec<(String, String)> = res
            .headers
            .iter()
            .map(|h| (h.name.to_string(), String::from_utf8_lossy(h.value).into_owned()))
            .collect();

        let body_len = content_length(&headers)?;
        if body_len > self.max_response_size {
            return Err(HttpProtocolError::BodyTooLarge {
                size: body_len,
                limit: self.max_response_size,
            });
        }
        if src.len() < head_len + body_len {
            src.reserve(head_len + body_len - src.len());
            return Ok(None);
        }

        src.advance(head_len);
        let body = src.split_to(body_len).freeze();
        Ok(Some(ClientResponse {
            status,
            headers,
            body,
        }))
    }
}
