use std::sync::Arc;

use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the media root is readable and how much media is playable.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let resolver = Arc::clone(state.session().resolver());
    let probe = tokio::task::spawn_blocking(move || {
        resolver
            .is_available()
            .then(|| resolver.eligible().len())
    })
    .await;

    match probe {
        Ok(Some(count)) => HealthResponse::ok(count),
        Ok(None) => {
            warn!("media root unreadable (degraded mode)");
            HealthResponse::degraded()
        }
        Err(err) => {
            warn!(error = %err, "media probe task failed");
            HealthResponse::degraded()
        }
    }
}
