use serde::Serialize;
use utoipa::ToSchema;

/// Liveness payload returned by `/healthcheck`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok", or "degraded" when the media root cannot be read.
    pub status: String,
    /// Media items currently eligible for play.
    pub eligible_media: usize,
}

impl HealthResponse {
    /// Media root readable; `eligible_media` items can be served.
    pub fn ok(eligible_media: usize) -> Self {
        Self {
            status: "ok".into(),
            eligible_media,
        }
    }

    /// Media root missing or unreadable.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".into(),
            eligible_media: 0,
        }
    }
}
