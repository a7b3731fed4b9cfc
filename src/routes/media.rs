use std::path::Path;

use axum::{
    Router,
    http::{HeaderValue, header::CACHE_CONTROL},
};
use tower_http::{services::ServeDir, set_header::SetResponseHeader};

/// URLs carry a per-round version token, so the bytes behind them never change.
const IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Serve media files from `media_dir` under `/media`.
///
/// `ServeDir` refuses paths escaping the root and answers 404 for missing files.
pub fn router(media_dir: &Path) -> Router<()> {
    let files = SetResponseHeader::overriding(
        ServeDir::new(media_dir),
        CACHE_CONTROL,
        HeaderValue::from_static(IMMUTABLE),
    );
    Router::new().nest_service("/media", files)
}
