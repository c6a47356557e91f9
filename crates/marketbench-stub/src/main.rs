// SPDX-License-Identifier: BUSL-1.1
//! Reference marketplace server for local negative-suite runs.
//!
//! Seeds accounts from `MARKETBENCH_STUB_USERS` (`name:password,...`,
//! default `alice:alice-pw,bob:bob-pw`) and listens on
//! `MARKETBENCH_STUB_PORT` (default 8000).

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use marketbench_stub::AppState;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("MARKETBENCH_STUB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8000);

    let state = AppState::new();
    let users = std::env::var("MARKETBENCH_STUB_USERS")
        .unwrap_or_else(|_| "alice:alice-pw,bob:bob-pw".to_string());
    for (name, password) in users.split(',').filter_map(|pair| pair.split_once(':')) {
        let id = state.register_user(name.trim(), password.trim());
        tracing::info!(user_id = id, account = name.trim(), "seeded account");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("marketbench-stub listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    marketbench_stub::serve(listener, state).await
}
