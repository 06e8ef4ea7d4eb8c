//! Polaris mock REST server.
//!
//! Serves the proposal tool endpoints under `/pst/api` from an in-memory
//! store seeded with the optical telescope catalog.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin polaris-mock-server
//! PORT=9000 RUST_LOG=debug cargo run --bin polaris-mock-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8084)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;

use tracing::info;

use polaris_core::http::{create_router, AppState, API_PREFIX};
use polaris_core::logging::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("Starting Polaris mock server");

    let state = AppState::local()?;
    let app = create_router(state);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8084);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}{}", addr, API_PREFIX);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
