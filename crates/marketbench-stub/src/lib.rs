// SPDX-License-Identifier: BUSL-1.1
//! # marketbench-stub — reference marketplace
//!
//! In-memory implementation of the marketplace endpoints the negative cases
//! target (`/login`, `/settings`, `/sell`, `/buy`, `/ship`) plus `/items/:id`
//! for inspecting side effects. Rejections use the same status codes and
//! domain messages as the production application.
//!
//! Storage is in-memory (DashMap) with no persistence — data is lost on
//! restart.

pub mod routes;
pub mod store;

pub use routes::router;
pub use store::AppState;

/// Serve the marketplace on an already bound listener.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state).into_make_service()).await
}
