//! Game lifecycle and round actions. Every call goes through the session
//! controller, which ticks the round clock before acting.

use serde_json::Value;
use tracing::debug;

use crate::{
    dto::player::{AcceptedResponse, GuessRequest, NewGameResponse, OkResponse},
    error::ServiceError,
    state::SharedState,
};

/// Reset the session and start round 1.
pub async fn new_game(state: &SharedState) -> NewGameResponse {
    let game_id = state.session().start_new_game().await;
    NewGameResponse { ok: true, game_id }
}

/// Mark a player as taking part in the current game.
pub async fn join(state: &SharedState, player_id: &str) -> OkResponse {
    state.session().join(player_id).await;
    OkResponse { ok: true }
}

/// Submit a guess. Gating rejections are reported in the body, not as errors.
pub async fn submit_guess(
    state: &SharedState,
    request: GuessRequest,
) -> Result<AcceptedResponse, ServiceError> {
    let raw = parse_guess(&request.guess_days)?;
    let outcome = state.session().submit_guess(&request.player_id, raw).await;
    Ok(match outcome {
        Ok(recorded) => {
            debug!(player_id = %request.player_id, guess_days = recorded, "guess recorded");
            AcceptedResponse::accepted()
        }
        Err(rejection) => {
            debug!(player_id = %request.player_id, reason = %rejection, "guess rejected");
            rejection.into()
        }
    })
}

/// Signal readiness to reveal the current round early.
pub async fn mark_ready(state: &SharedState, player_id: &str) -> AcceptedResponse {
    match state.session().mark_ready(player_id).await {
        Ok(()) => AcceptedResponse::accepted(),
        Err(rejection) => rejection.into(),
    }
}

/// Interpret a guess given as a JSON integer, a JSON float (truncated) or a
/// whole-number string.
///
/// Range clamping happens in the round itself; anything else, fractional
/// strings included, is refused.
pub fn parse_guess(raw: &Value) -> Result<i64, ServiceError> {
    let invalid = || ServiceError::InvalidInput("guess_days must be a number of days".into());
    match raw {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(truncate))
            .ok_or_else(invalid),
        Value::String(text) => parse_whole_number(text.trim()).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Signed decimal integer, saturating outside the `i64` range.
fn parse_whole_number(text: &str) -> Option<i64> {
    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    Some(if text.starts_with('-') { i64::MIN } else { i64::MAX })
}

/// Saturating float to integer conversion, truncating toward zero.
fn truncate(value: f64) -> i64 {
    value.trunc() as i64
}
