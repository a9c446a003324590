use crate::Result;
use crate::http::{HttpConfig, HttpEchoServer};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Spawns an HTTP echo server on an ephemeral loopback port for tests
///
/// The listener is bound before the server task starts, so the returned
/// address accepts connections as soon as this function returns.
/// The caller owns the server handle and is expected to abort it.
pub async fn spawn_test_server(
    mut config: HttpConfig,
) -> Result<(JoinHandle<Result<()>>, SocketAddr)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    config.bind_addr = addr;

    let server = HttpEchoServer::new(config);
    let server_handle = tokio::spawn(async move { server.serve(listener).await });

    Ok((server_handle, addr))
}
