use serde::Serialize;
use utoipa::ToSchema;

use crate::state::session::{Rejection, VisiblePhase};

/// Round phase exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PublicPhase {
    /// Guesses are open.
    Guessing,
    /// The answer and results are shown.
    Reveal,
}

impl From<VisiblePhase> for PublicPhase {
    fn from(value: VisiblePhase) -> Self {
        match value {
            VisiblePhase::Guessing => PublicPhase::Guessing,
            VisiblePhase::Reveal => PublicPhase::Reveal,
        }
    }
}

/// Reason a guess or ready signal was not accepted.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// No game is running.
    NoActiveGame,
    /// The round is revealing its answer.
    Reveal,
    /// The guessing deadline already passed.
    RoundOver,
}

impl From<Rejection> for RejectionReason {
    fn from(value: Rejection) -> Self {
        match value {
            Rejection::NoActiveGame => RejectionReason::NoActiveGame,
            Rejection::Reveal => RejectionReason::Reveal,
            Rejection::RoundOver => RejectionReason::RoundOver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_serialize_as_snake_case() {
        let encoded = serde_json::to_string(&[
            RejectionReason::from(Rejection::NoActiveGame),
            RejectionReason::from(Rejection::Reveal),
            RejectionReason::from(Rejection::RoundOver),
        ])
        .unwrap();
        assert_eq!(encoded, r#"["no_active_game","reveal","round_over"]"#);
    }

    #[test]
    fn reasons_match_rejection_display() {
        for rejection in [Rejection::NoActiveGame, Rejection::Reveal, Rejection::RoundOver] {
            let encoded = serde_json::to_value(RejectionReason::from(rejection)).unwrap();
            assert_eq!(encoded, serde_json::Value::String(rejection.to_string()));
        }
    }
}
