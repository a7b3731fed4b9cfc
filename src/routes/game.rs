use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::{
        player::{AcceptedResponse, GuessRequest, NewGameResponse, OkResponse, PlayerActionRequest},
        state::StateResponse,
    },
    error::AppError,
    services::{game_service, state_service},
    state::SharedState,
};

/// Routes driving the game: lifecycle, round actions and state polling.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/newgame", post(new_game))
        .route("/api/join", post(join))
        .route("/api/guess", post(guess))
        .route("/api/ready", post(ready))
        .route("/api/state", get(get_state))
}

/// Reset scores and start a fresh game at round 1.
#[utoipa::path(
    post,
    path = "/api/newgame",
    tag = "game",
    responses((status = 200, description = "Game started", body = NewGameResponse))
)]
pub async fn new_game(State(state): State<SharedState>) -> Json<NewGameResponse> {
    Json(game_service::new_game(&state).await)
}

/// Count a player as participating in the current game.
#[utoipa::path(
    post,
    path = "/api/join",
    tag = "game",
    request_body = PlayerActionRequest,
    responses(
        (status = 200, description = "Player joined", body = OkResponse),
        (status = 400, description = "Malformed player id")
    )
)]
pub async fn join(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<PlayerActionRequest>>,
) -> Json<OkResponse> {
    Json(game_service::join(&state, &payload.player_id).await)
}

/// Submit or overwrite a guess for the current round.
#[utoipa::path(
    post,
    path = "/api/guess",
    tag = "game",
    request_body = GuessRequest,
    responses(
        (status = 200, description = "Accepted, or not accepted with a reason", body = AcceptedResponse),
        (status = 400, description = "Missing or non-numeric guess")
    )
)]
pub async fn guess(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<GuessRequest>>,
) -> Result<Json<AcceptedResponse>, AppError> {
    let response = game_service::submit_guess(&state, payload).await?;
    Ok(Json(response))
}

/// Vote to reveal the current round early.
#[utoipa::path(
    post,
    path = "/api/ready",
    tag = "game",
    request_body = PlayerActionRequest,
    responses(
        (status = 200, description = "Accepted, or not accepted with a reason", body = AcceptedResponse),
        (status = 400, description = "Malformed player id")
    )
)]
pub async fn ready(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<PlayerActionRequest>>,
) -> Json<AcceptedResponse> {
    Json(game_service::mark_ready(&state, &payload.player_id).await)
}

/// Poll the session; this is also what advances rounds.
#[utoipa::path(
    get,
    path = "/api/state",
    tag = "game",
    responses((status = 200, description = "Current session snapshot", body = StateResponse))
)]
pub async fn get_state(State(state): State<SharedState>) -> Json<StateResponse> {
    Json(state_service::get_state(&state).await)
}
