//! Gezicht · Face-Recreation Training Backend
//!
//! - Axum HTTP + WebSocket API
//! - Optional remote content store integration (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT          : u16 (default 3000)
//!   CONTENT_PROJECT_ID  : enables the remote content store if present
//!   CONTENT_DATASET    : default "production"
//!   CONTENT_API_VERSION  : default "2024-10-01"
//!   CONTENT_TOKEN    : optional read token for private datasets
//!   CONTENT_CONFIG_PATH  : path to TOML config (local course/module bank)
//!   LOG_LEVEL    : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod seeds;
mod catalog;
mod exercise;
mod state;
mod protocol;
mod logic;
mod content;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (in-memory stores, remote content client).
  let state = Arc::new(AppState::new());

  // Warm the catalog from the remote store in the background; seeds and the
  // local bank serve requests until (and in case) that completes.
  if state.content.is_some() {
    let state = state.clone();
    tokio::spawn(async move {
      match state.refresh_from_remote().await {
        Ok(count) => info!(target: "catalog", count, "Startup course refresh done"),
        Err(e) => error!(target: "catalog", error = %e, "Startup course refresh failed; serving bank/seed content"),
      }
    });
  }

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "gezicht_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
