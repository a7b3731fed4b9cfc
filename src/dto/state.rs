//! Snapshot payload polled by every client.

use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::{epoch_ms, phase::PublicPhase, player::LeaderboardEntry},
    media::MediaType,
    state::{
        round::RoundResult,
        session::{PendingView, ReadinessView, RevealView, SessionSnapshot},
    },
};

/// Full state returned by `GET /api/state`.
#[derive(Debug, Serialize, ToSchema)]
pub struct StateResponse {
    pub server_time_ms: i64,
    pub game: GameStateDto,
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Whose age is being guessed.
    pub baby_name: String,
}

/// Game block of the snapshot. Absent values serialize as `null`.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameStateDto {
    pub active: bool,
    pub game_id: String,
    pub round_number: u32,
    pub total_rounds: u32,
    pub rounds_remaining: u32,
    pub turn_duration_seconds: i64,
    /// Deadline of the current phase (guessing or reveal).
    pub turn_ends_at_ms: Option<i64>,
    /// Cache-busted media URL for the current round.
    pub media_url: Option<String>,
    pub media_type: Option<MediaType>,
    pub phase: Option<PublicPhase>,
    /// Present only during the reveal phase.
    pub reveal: Option<RevealDto>,
    /// Present only during the guessing phase.
    pub ready: Option<ReadyDto>,
    /// Next round's media, once chosen, for prefetching.
    pub pending: Option<PendingDto>,
}

/// Answer and results for the round being revealed.
#[derive(Debug, Serialize, ToSchema)]
pub struct RevealDto {
    pub true_age_days: Option<u32>,
    pub results: IndexMap<String, RoundResultDto>,
    pub reveal_ends_at_ms: i64,
}

/// A single player's result.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct RoundResultDto {
    pub guess_days: u32,
    pub diff: u32,
    pub points: u32,
}

/// Early-reveal progress.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyDto {
    /// Ready players that are also active.
    pub count: usize,
    /// Active players.
    pub total: usize,
    pub ready_player_ids: Vec<String>,
    pub active_player_ids: Vec<String>,
}

/// Upcoming round media.
#[derive(Debug, Serialize, ToSchema)]
pub struct PendingDto {
    pub media_url: String,
    pub media_type: MediaType,
    pub turn_duration_seconds: i64,
}

impl StateResponse {
    /// Project a session snapshot for the wire.
    pub fn from_snapshot(snapshot: SessionSnapshot, baby_name: &str) -> Self {
        let (media_url, media_type) = match snapshot.media {
            Some(media) => (Some(media.url), Some(media.media_type)),
            None => (None, None),
        };

        Self {
            server_time_ms: epoch_ms(snapshot.now),
            game: GameStateDto {
                active: snapshot.active,
                game_id: snapshot.session_id,
                round_number: snapshot.round_number,
                total_rounds: snapshot.total_rounds,
                rounds_remaining: snapshot.rounds_remaining,
                turn_duration_seconds: snapshot.turn_duration.whole_seconds(),
                turn_ends_at_ms: snapshot.deadline.map(epoch_ms),
                media_url,
                media_type,
                phase: snapshot.phase.map(Into::into),
                reveal: snapshot.reveal.map(Into::into),
                ready: snapshot.readiness.map(Into::into),
                pending: snapshot.pending.map(Into::into),
            },
            leaderboard: snapshot.leaderboard.into_iter().map(Into::into).collect(),
            baby_name: baby_name.to_owned(),
        }
    }
}

impl From<RoundResult> for RoundResultDto {
    fn from(value: RoundResult) -> Self {
        Self {
            guess_days: value.guess_days,
            diff: value.diff,
            points: value.points,
        }
    }
}

impl From<RevealView> for RevealDto {
    fn from(value: RevealView) -> Self {
        Self {
            true_age_days: value.true_age_days,
            results: value
                .results
                .into_iter()
                .map(|(id, result)| (id, result.into()))
                .collect(),
            reveal_ends_at_ms: epoch_ms(value.ends_at),
        }
    }
}

impl From<ReadinessView> for ReadyDto {
    fn from(value: ReadinessView) -> Self {
        Self {
            count: value.count,
            total: value.total,
            ready_player_ids: value.ready_player_ids,
            active_player_ids: value.active_player_ids,
        }
    }
}

impl From<PendingView> for PendingDto {
    fn from(value: PendingView) -> Self {
        Self {
            media_url: value.media.url,
            media_type: value.media.media_type,
            turn_duration_seconds: value.duration.whole_seconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::session::{MediaView, VisiblePhase};
    use time::{Duration, macros::datetime};

    fn idle_snapshot() -> SessionSnapshot {
        SessionSnapshot {
            now: datetime!(2025-01-01 00:00:01 UTC),
            active: false,
            session_id: "g1".into(),
            round_number: 0,
            total_rounds: 50,
            rounds_remaining: 50,
            turn_duration: Duration::seconds(10),
            deadline: None,
            media: None,
            phase: None,
            reveal: None,
            readiness: None,
            pending: None,
            leaderboard: Vec::new(),
        }
    }

    #[test]
    fn idle_snapshot_serializes_nulls() {
        let json =
            serde_json::to_value(StateResponse::from_snapshot(idle_snapshot(), "the baby")).unwrap();
        assert_eq!(json["server_time_ms"], 1_735_689_601_000i64);
        assert_eq!(json["baby_name"], "the baby");
        let game = &json["game"];
        assert_eq!(game["active"], false);
        assert_eq!(game["game_id"], "g1");
        assert!(game["media_url"].is_null());
        assert!(game["phase"].is_null());
        assert!(game["reveal"].is_null());
        assert!(game["ready"].is_null());
        assert!(game["pending"].is_null());
    }

    #[test]
    fn reveal_snapshot_carries_results() {
        let ends_at = datetime!(2025-01-01 00:00:06 UTC);
        let mut results = IndexMap::new();
        results.insert(
            "p".to_string(),
            RoundResult {
                guess_days: 25,
                diff: 5,
                points: 95,
            },
        );
        let snapshot = SessionSnapshot {
            active: true,
            round_number: 1,
            rounds_remaining: 49,
            deadline: Some(ends_at),
            media: Some(MediaView {
                url: "/media/a.jpg?v=g1-1".into(),
                media_type: MediaType::Image,
            }),
            phase: Some(VisiblePhase::Reveal),
            reveal: Some(RevealView {
                true_age_days: Some(30),
                results,
                ends_at,
            }),
            ..idle_snapshot()
        };

        let json = serde_json::to_value(StateResponse::from_snapshot(snapshot, "Mila")).unwrap();
        let game = &json["game"];
        assert_eq!(game["phase"], "reveal");
        assert_eq!(game["media_type"], "image");
        assert_eq!(game["turn_ends_at_ms"], 1_735_689_606_000i64);
        assert_eq!(game["reveal"]["true_age_days"], 30);
        assert_eq!(
            game["reveal"]["results"]["p"],
            serde_json::json!({ "guess_days": 25, "diff": 5, "points": 95 })
        );
    }
}
