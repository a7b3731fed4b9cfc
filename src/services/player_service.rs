//! Player identity: registration and renaming.

use crate::{
    dto::player::{RegisterRequest, RegisterResponse, UsernameRequest, UsernameResponse},
    error::ServiceError,
    state::SharedState,
};

/// Issue an identity to a new player, or rename a returning one.
pub async fn register(state: &SharedState, request: RegisterRequest) -> RegisterResponse {
    state
        .session()
        .register_or_update_player(
            request.player_id.as_deref(),
            request.desired_username.as_deref(),
        )
        .await
        .into()
}

/// Rename a known player and return the leaderboard reflecting it.
pub async fn change_username(
    state: &SharedState,
    request: UsernameRequest,
) -> Result<UsernameResponse, ServiceError> {
    let (_player, leaderboard) = state
        .session()
        .rename_player(&request.player_id, &request.username)
        .await
        .ok_or_else(|| ServiceError::NotFound(format!("player `{}` not found", request.player_id)))?;

    Ok(UsernameResponse {
        ok: true,
        leaderboard: leaderboard.into_iter().map(Into::into).collect(),
    })
}
