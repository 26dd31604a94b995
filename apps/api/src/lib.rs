//! # Gearbox POS HTTP API
//!
//! Library surface for the API service, split out so black-box tests can
//! build the router without binding a socket.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /sales              cart body → finalized sale (201)              │
//! │  POST /sales/:id/refund   full reversal (200)                           │
//! │  GET  /sales/:id          one sale with lines                           │
//! │  GET  /sales              all sales, newest first                       │
//! │  GET  /products           catalog read contract                         │
//! │  GET  /health             liveness                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use axum::{Extension, Router};

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use state::AppState;

/// Builds the full HTTP router over the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    routes::router().layer(Extension(state))
}
