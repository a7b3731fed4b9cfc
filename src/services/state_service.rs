//! The snapshot read path. Polling it is also what moves the game forward.

use crate::{dto::state::StateResponse, state::SharedState};

/// Tick the session and project its current state for clients.
pub async fn get_state(state: &SharedState) -> StateResponse {
    let snapshot = state.session().snapshot().await;
    StateResponse::from_snapshot(snapshot, state.baby_name())
}
