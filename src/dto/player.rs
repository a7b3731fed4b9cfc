//! Request and response bodies for player actions.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::{phase::RejectionReason, validation::validate_player_id},
    state::{roster::Player, session::Rejection},
};

/// Register a new player, or rename an existing one.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct RegisterRequest {
    /// Previously issued identifier; a fresh one is minted when absent or unknown.
    #[serde(default)]
    #[validate(custom(function = "validate_player_id"))]
    pub player_id: Option<String>,
    /// Name to apply to an existing player.
    #[serde(default)]
    pub desired_username: Option<String>,
}

/// Identity issued to a player.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub player_id: String,
    pub username: String,
}

/// Rename a known player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UsernameRequest {
    #[validate(custom(function = "validate_player_id"))]
    pub player_id: String,
    #[validate(length(min = 1, message = "username must not be empty"))]
    pub username: String,
}

/// Rename acknowledgement with the refreshed ranking.
#[derive(Debug, Serialize, ToSchema)]
pub struct UsernameResponse {
    pub ok: bool,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Body shared by the join and ready actions.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PlayerActionRequest {
    #[validate(custom(function = "validate_player_id"))]
    pub player_id: String,
}

/// Guess submission.
///
/// `guess_days` may be a JSON integer, a float (truncated) or a numeric string.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct GuessRequest {
    #[validate(custom(function = "validate_player_id"))]
    pub player_id: String,
    #[serde(default)]
    #[schema(value_type = i64)]
    pub guess_days: serde_json::Value,
}

/// Outcome of a guess or ready signal.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct AcceptedResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectionReason>,
}

impl AcceptedResponse {
    /// The action took effect.
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }
}

impl From<Rejection> for AcceptedResponse {
    fn from(value: Rejection) -> Self {
        Self {
            accepted: false,
            reason: Some(value.into()),
        }
    }
}

/// Plain acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct OkResponse {
    pub ok: bool,
}

/// Acknowledgement of a new game, carrying its identifier.
#[derive(Debug, Serialize, ToSchema)]
pub struct NewGameResponse {
    pub ok: bool,
    pub game_id: String,
}

/// One leaderboard row.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub player_id: String,
    pub username: String,
    pub score: u32,
}

impl From<Player> for LeaderboardEntry {
    fn from(player: Player) -> Self {
        Self {
            player_id: player.id,
            username: player.display_name,
            score: player.score,
        }
    }
}

impl From<Player> for RegisterResponse {
    fn from(player: Player) -> Self {
        Self {
            player_id: player.id,
            username: player.display_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_validates_optional_id() {
        assert!(RegisterRequest::default().validate().is_ok());

        let bad = RegisterRequest {
            player_id: Some(String::new()),
            desired_username: None,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn empty_username_is_rejected() {
        let request = UsernameRequest {
            player_id: "p1".into(),
            username: String::new(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn accepted_response_omits_reason() {
        let json = serde_json::to_value(AcceptedResponse::accepted()).unwrap();
        assert_eq!(json, serde_json::json!({ "accepted": true }));

        let json = serde_json::to_value(AcceptedResponse::from(Rejection::RoundOver)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "accepted": false, "reason": "round_over" })
        );
    }
}
