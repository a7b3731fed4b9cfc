use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::player::{RegisterRequest, RegisterResponse, UsernameRequest, UsernameResponse},
    error::AppError,
    services::player_service,
    state::SharedState,
};

/// Routes managing player identity.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/username", post(change_username))
}

/// Issue an identity, or rename a returning player.
#[utoipa::path(
    post,
    path = "/api/register",
    tag = "player",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Player identity", body = RegisterResponse),
        (status = 400, description = "Malformed player id")
    )
)]
pub async fn register(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<RegisterRequest>>,
) -> Json<RegisterResponse> {
    Json(player_service::register(&state, payload).await)
}

/// Rename a known player.
#[utoipa::path(
    post,
    path = "/api/username",
    tag = "player",
    request_body = UsernameRequest,
    responses(
        (status = 200, description = "Renamed; refreshed leaderboard", body = UsernameResponse),
        (status = 400, description = "Missing or malformed fields"),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn change_username(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<UsernameRequest>>,
) -> Result<Json<UsernameResponse>, AppError> {
    let response = player_service::change_username(&state, payload).await?;
    Ok(Json(response))
}
