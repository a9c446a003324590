use crate::Result;
use std::future::Future;

/// Common trait for echo servers
///
/// Defines the lifecycle every server exposes to the process entry point:
/// run until shut down, and hand out a sender to trigger that shutdown.
pub trait EchoServerTrait {
    /// Starts the echo server and listens for connections
    fn run(&self) -> impl Future<Output = Result<()>> + Send;

    /// Returns a shutdown signal sender that can be used to gracefully shutdown the server
    fn shutdown_signal(&self) -> tokio::sync::broadcast::Sender<()>;
}
