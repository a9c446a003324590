use std::net::SocketAddr;
use std::time::Duration;

/// Port the echo server listens on
pub const DEFAULT_PORT: u16 = 9090;

/// Largest request body accepted by default (10 MiB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Configuration for the HTTP echo server
///
/// # Examples
///
/// ```rust
/// use jsonecho::http::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig {
///     bind_addr: "127.0.0.1:8080".parse().unwrap(),
///     max_connections: 100,
///     max_body_size: 64 * 1024,
///     read_timeout: Duration::from_secs(30),
///     write_timeout: Duration::from_secs(30),
///     server_name: Some("EchoServer/1.0".to_string()),
/// };
/// ```
///
/// Using the default configuration:
///
/// ```rust
/// use jsonecho::http::HttpConfig;
///
/// let config = HttpConfig::default();
/// assert_eq!(config.bind_addr.port(), 9090);
/// assert!(config.bind_addr.ip().is_unspecified());
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Network address to bind to
    pub bind_addr: SocketAddr,
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Largest request body, in bytes, the server will buffer
    pub max_body_size: usize,
    /// How long to wait for the next request on a connection
    pub read_timeout: Duration,
    /// How long a response write may take
    pub write_timeout: Duration,
    /// Value of the `Server` response header (omitted when `None`)
    pub server_name: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: 1000,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            server_name: Some(concat!("jsonecho/", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}
