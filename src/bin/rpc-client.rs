//! Demo RPC client binary.
//!
//! Makes a few calls against a running server and prints the responses. The
//! server URL is taken from `WS_RPC_URL` (default `ws://127.0.0.1:8000`).

use serde_json::json;
use tracing_subscriber::EnvFilter;
use ws_rpc::RpcClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber
        ::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let url = std::env::var("WS_RPC_URL").unwrap_or_else(|_| "ws://127.0.0.1:8000".to_string());
    let mut client = RpcClient::connect(&url).await?;

    for (action, params) in [
        ("add_numbers", json!({ "a": 10, "b": 20 })),
        ("multiply_numbers", json!({ "a": 3, "b": 7 })),
        ("echo", json!({ "message": "hello" })),
    ] {
        let params = params.as_object().cloned().unwrap_or_default();
        let response = client.call(action, params).await?;
        println!("{}: {}", action, serde_json::to_string(&response)?);
    }

    client.close().await?;
    Ok(())
}
