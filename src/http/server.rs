use super::codec::{HttpCodec, HttpProtocolError};
use super::config::HttpConfig;
use super::echo::handle;
use super::request::Request;
use super::response::Response;
use crate::Result;
use crate::common::EchoServerTrait;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use http::Version;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::{signal, time::timeout};
use tokio_util::codec::Framed;
use tracing::{Instrument, debug, error, info, warn};

/// How long a rejected connection keeps reading before it is dropped
const LINGER_TIMEOUT: Duration = Duration::from_secs(2);

/// Most unread request bytes discarded after a rejection
const LINGER_MAX_BYTES: usize = 4 * 1024 * 1024;

/// HTTP echo server
///
/// Answers GET, POST, PUT and DELETE on any path with a JSON description of
/// the request. One task serves each connection; requests on a connection
/// are answered in order.
///
/// # Examples
///
/// ```no_run
/// use jsonecho::{EchoServerTrait, HttpConfig, HttpEchoServer};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = HttpEchoServer::new(HttpConfig::default());
///     server.run().await?;
///     Ok(())
/// }
/// ```
pub struct HttpEchoServer {
    config: Arc<HttpConfig>,
    shutdown_signal: Arc<tokio::sync::broadcast::Sender<()>>,
}

impl HttpEchoServer {
    /// Creates a new HTTP echo server with the given configuration
    pub fn new(config: HttpConfig) -> Self {
        let (shutdown_signal, _) = tokio::sync::broadcast::channel(1);
        Self {
            config: Arc::new(config),
            shutdown_signal: Arc::new(shutdown_signal),
        }
    }

    /// Serves connections from an already bound listener until shut down
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        info!(
            address = %local_addr,
            "Echo server running on http://localhost:{}",
            local_addr.port()
        );

        let connection_count = Arc::new(AtomicUsize::new(0));
        let mut shutdown_rx = self.shutdown_signal.subscribe();

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            let current_count = connection_count.load(Ordering::SeqCst);
                            if current_count >= self.config.max_connections {
                                warn!(%addr, current = current_count, limit = self.config.max_connections, "Connection rejected: limit reached");
                                continue;
                            }

                            let new_count = connection_count.fetch_add(1, Ordering::SeqCst) + 1;
                            debug!(%addr, current = new_count, "Accepted connection");

                            let config = self.config.clone();
                            let connection_count = connection_count.clone();
                            let span = tracing::info_span!("connection", %addr);

                            tokio::spawn(async move {
                                let result = Self::handle_connection(stream, addr, config).instrument(span).await;
                                if let Err(e) = result {
                                    error!(%addr, error = %e, "Error handling connection");
                                }
                                let final_count = connection_count.fetch_sub(1, Ordering::SeqCst) - 1;
                                debug!(%addr, current = final_count, "Connection closed");
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                _ = signal::ctrl_c() => {
                    info!("Received shutdown signal, stopping server");
                    break;
                }
                _ = shutdown_rx.recv() => {
                    info!("Received internal shutdown signal, stopping server");
                    break;
                }
            }
        }

        info!("Echo server stopped");
        Ok(())
    }

    /// Serves requests on one connection until it closes or a response asks to close it
    async fn handle_connection(
        stream: TcpStream,
        addr: SocketAddr,
        config: Arc<HttpConfig>,
    ) -> Result<()> {
        let mut framed = Framed::new(stream, HttpCodec::new(config.max_body_size));

        loop {
            let next = match timeout(config.read_timeout, framed.next()).await {
                Ok(next) => next,
                Err(_) => {
                    warn!(%addr, "Read timeout");
                    break;
                }
            };

            let (response, request_line) = match next {
                None => {
                    debug!(%addr, "Client closed connection");
                    break;
                }
                Some(Ok(request)) => {
                    let response = finalize(handle(&request), Some(&request), &config);
                    (response, request.request_line())
                }
                Some(Err(HttpProtocolError::Io(e))) => return Err(e.into()),
                Some(Err(HttpProtocolError::IncompleteRequest)) => {
                    debug!(%addr, "Client closed connection mid-request");
                    break;
                }
                Some(Err(e)) => {
                    warn!(%addr, error = %e, "Rejecting request");
                    let response = finalize(Response::error(e.status(), &e.to_string()), None, &config);
                    (response, "-".to_string())
                }
            };

            let status = response.status;
            let size = response.body.len();
            let close = response.close;

            match timeout(config.write_timeout, framed.send(response)).await {
                Ok(Ok(())) => {
                    info!("[Echo] \"{}\" {} {}", request_line, status.as_u16(), size);
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    warn!(%addr, "Write timeout");
                    break;
                }
            }

            if close {
                if status.is_client_error() || status.is_server_error() {
                    linger_close(framed, addr).await;
                }
                break;
            }
        }

        Ok(())
    }
}

/// Half-closes a connection whose request was refused, then discards what the
/// client is still sending
///
/// Dropping a socket with unread bytes makes the kernel answer with a reset,
/// which can destroy the error response before the client reads it.
async fn linger_close(framed: Framed<TcpStream, HttpCodec>, addr: SocketAddr) {
    let mut stream = framed.into_inner();
    if let Err(e) = stream.shutdown().await {
        debug!(%addr, error = %e, "Failed to shut down write half");
        return;
    }

    let drain = async {
        let mut buffer = [0u8; 8192];
        let mut drained = 0;
        while drained < LINGER_MAX_BYTES {
            match stream.read(&mut buffer).await {
                Ok(0) | Err(_) => break,
                Ok(n) => drained += n,
            }
        }
        drained
    };

    match timeout(LINGER_TIMEOUT, drain).await {
        Ok(drained) => debug!(%addr, drained, "Rejected connection drained"),
        Err(_) => debug!(%addr, "Rejected connection still sending, dropping it"),
    }
}

impl EchoServerTrait for HttpEchoServer {
    /// Binds the configured address and serves until shut down
    async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    fn shutdown_signal(&self) -> tokio::sync::broadcast::Sender<()> {
        self.shutdown_signal.as_ref().clone()
    }
}

/// Adds the listener's own headers and settles whether the connection stays open
///
/// `request` is `None` when the request could not be decoded; such
/// connections are always closed.
fn finalize(mut response: Response, request: Option<&Request>, config: &HttpConfig) -> Response {
    let keep_alive = !response.close && request.is_some_and(Request::keep_alive);
    response.close = !keep_alive;

    let mut headers = Vec::with_capacity(response.headers.len() + 3);
    if let Some(server_name) = &config.server_name {
        headers.push(("Server".to_string(), server_name.clone()));
    }
    headers.push(("Date".to_string(), http_date()));
    headers.append(&mut response.headers);

    if !keep_alive {
        headers.push(("Connection".to_string(), "close".to_string()));
    } else if request.is_some_and(|r| r.version == Version::HTTP_10) {
        headers.push(("Connection".to_string(), "keep-alive".to_string()));
    }

    response.headers = headers;
    response
}

/// Current time as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
fn http_date() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
