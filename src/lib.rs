//! Library crate for age-guess-back, exposing modules for binaries and integration tests.

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod dto;
pub mod error;
pub mod media;
pub mod routes;
pub mod services;
pub mod state;

use config::AppConfig;
use state::SharedState;

/// Build the top-level router and attach cross-cutting middleware layers.
pub fn build_router(state: SharedState, config: &AppConfig) -> Router<()> {
    routes::router(state, &config.media_dir, &config.static_dir)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
