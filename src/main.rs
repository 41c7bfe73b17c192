//! Quiz Game Backend
//!
//! - Axum HTTP + WebSocket API driving a single quiz session
//! - Questions generated by an OpenAI-compatible chat endpoint, or served from a
//!   built-in bank in offline mode
//! - Static front-end fallback (./static/index.html)
//!
//! Important env variables (a .env file is read first):
//!   PORT                : u16 (default 3000)
//!   OPENAI_API_KEY      : required unless offline
//!   OPENAI_BASE_URL     : default "https://api.openai.com/v1"
//!   OPENAI_MODEL        : default "gpt-4o-mini"
//!   OPENAI_TIMEOUT_SECS : HTTP timeout for the provider call (default 60)
//!   OPENAI_JSON_MODE    : "1" to request a JSON object response
//!   QUIZ_OFFLINE        : "1" to use the built-in question bank
//!   QUIZ_CONFIG_PATH    : path to TOML config (prompts + game settings)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod provider;
mod session;
mod view;
mod seeds;
mod openai;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let dotenv_loaded = dotenv::dotenv().is_ok();
  telemetry::init_tracing();
  info!(target: "quiz_backend", dotenv_loaded, "Starting quiz backend");

  // Without an API key (and not offline) there is nothing to play; stop here.
  let state = match AppState::from_env() {
    Ok(state) => Arc::new(state),
    Err(e) => {
      error!(target: "quiz_backend", error = %e, "Startup aborted");
      return Err(e.into());
    }
  };

  let app = build_router(state);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "quiz_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "quiz_backend", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(target: "quiz_backend", error = %e, "Failed to listen for Ctrl+C");
    std::future::pending::<()>().await;
  }
  info!(target: "quiz_backend", "Shutdown signal received");
}
