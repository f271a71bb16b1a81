//! pathway server.
//!
//! Serves the static routes of a config file through the routing core.
//!
//! ```text
//! pathway [--config pathway.toml]
//!     → config::load_config
//!     → http::mount_static_routes into a RouterBuilder
//!     → Router (printed as a route table)
//!     → http::HttpServer until Ctrl+C
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use pathway::config::{load_config, PathwayConfig};
use pathway::http::{mount_static_routes, HttpServer};
use pathway::observability::logging;
use pathway::RouterBuilder;

#[derive(Parser)]
#[command(name = "pathway")]
#[command(about = "Serve config-declared routes through the pathway router", long_about = None)]
struct Cli {
    /// Path to a TOML config file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => PathwayConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!("pathway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.server.bind_address,
        request_timeout_secs = config.server.request_timeout_secs,
        routes = config.routes.len(),
        "Configuration loaded"
    );

    let mut builder = RouterBuilder::with_config(config.router.clone());
    mount_static_routes(&mut builder, &config.routes)?;
    let router = Arc::new(builder.build()?);
    tracing::info!("Route table:\n{}", router);

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let server = HttpServer::new(router, config.server.clone());
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
