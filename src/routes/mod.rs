use std::path::Path;

use axum::Router;
use tower_http::services::ServeDir;

use crate::state::SharedState;

pub mod docs;
pub mod game;
pub mod health;
pub mod media;
pub mod player;

/// Compose all route trees, wiring in shared state, media, static assets and documentation.
pub fn router(state: SharedState, media_dir: &Path, static_dir: &Path) -> Router<()> {
    let api_router = health::router()
        .merge(player::router())
        .merge(game::router());

    let docs_router = docs::router(state.clone());

    api_router
        .merge(docs_router)
        .with_state(state)
        .merge(media::router(media_dir))
        .fallback_service(ServeDir::new(static_dir))
}
