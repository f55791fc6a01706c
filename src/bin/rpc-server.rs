//! Demo RPC server binary.
//!
//! Serves the demo action registry until interrupted. The bind address is
//! taken from `WS_RPC_ADDR` (default `127.0.0.1:8000`).

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use ws_rpc::functions::demo_registry;
use ws_rpc::server::{ Server, ServerOptions };

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber
        ::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let bind_address = std::env
        ::var("WS_RPC_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8000".to_string())
        .parse()?;

    let registry = Arc::new(demo_registry());
    let server = Server::bind(registry, ServerOptions { bind_address }).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("server shutting down");
        }
    }

    Ok(())
}
