use color_eyre::eyre::{Result, WrapErr};
use jsonecho::{EchoServerTrait, HttpConfig, HttpEchoServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jsonecho=info")),
        )
        .init();

    let config = HttpConfig::default();
    info!(address = %config.bind_addr, max_connections = config.max_connections, "Starting HTTP echo server");

    let server = HttpEchoServer::new(config);
    server.run().await.wrap_err("Failed to run HTTP echo server")?;

    Ok(())
}
