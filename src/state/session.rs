//! The single game session and the controller that serialises access to it.
//!
//! There is no background timer. Every operation takes the session lock, runs
//! [`GameSession::tick`] to apply whatever transition the clock has made due,
//! and only then performs its own effect. Media is picked from an in-memory
//! [`MediaCatalog`] snapshot, so no disk I/O happens under the lock.

use std::{collections::HashSet, fmt, sync::Arc};

use indexmap::IndexMap;
use rand::{Rng, seq::IndexedRandom};
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    media::{MediaCatalog, MediaItem, MediaResolver, MediaType, versioned_url},
    state::{
        clock::Clock,
        roster::{Player, PlayerId, Roster},
        round::{DueTransition, Round, RoundPhase, RoundResult, RoundStateMachine, due_transition},
    },
};

/// Timing and length of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSettings {
    /// Rounds per game.
    pub total_rounds: u32,
    /// Guessing window for photos.
    pub image_duration: Duration,
    /// Guessing window for videos.
    pub video_duration: Duration,
    /// Length of the reveal phase.
    pub reveal_duration: Duration,
}

impl GameSettings {
    /// Guessing window for a given media type.
    pub fn duration_for(&self, media_type: MediaType) -> Duration {
        match media_type {
            MediaType::Image => self.image_duration,
            MediaType::Video => self.video_duration,
        }
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            total_rounds: 50,
            image_duration: Duration::seconds(10),
            video_duration: Duration::seconds(20),
            reveal_duration: Duration::seconds(5),
        }
    }
}

/// Why a guess or ready signal was not accepted. Callers re-poll and retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No game is running.
    NoActiveGame,
    /// The current round is already revealing its answer.
    Reveal,
    /// The guessing deadline passed before the round was revealed.
    RoundOver,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NoActiveGame => f.write_str("no_active_game"),
            Rejection::Reveal => f.write_str("reveal"),
            Rejection::RoundOver => f.write_str("round_over"),
        }
    }
}

/// Next round's media, chosen ahead of time so clients can prefetch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPick {
    /// Selected media.
    pub media: MediaItem,
    /// Guessing window the round will use.
    pub duration: Duration,
}

/// Phase as exposed to readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisiblePhase {
    /// Guesses are open.
    Guessing,
    /// Answer and results are shown.
    Reveal,
}

/// Media reference handed to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaView {
    /// Cache-busted URL.
    pub url: String,
    /// Photo or video.
    pub media_type: MediaType,
}

/// Reveal-phase payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealView {
    /// True age, absent for rounds without media.
    pub true_age_days: Option<u32>,
    /// Per-player results for the round.
    pub results: IndexMap<PlayerId, RoundResult>,
    /// End of the reveal window.
    pub ends_at: OffsetDateTime,
}

/// Guessing-phase readiness payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessView {
    /// Ready players that are also active.
    pub count: usize,
    /// Active players.
    pub total: usize,
    /// Everyone who signalled readiness this round.
    pub ready_player_ids: Vec<PlayerId>,
    /// Players counted for early reveal.
    pub active_player_ids: Vec<PlayerId>,
}

/// Prefetch payload for the upcoming round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingView {
    /// Media to prefetch.
    pub media: MediaView,
    /// Guessing window of the upcoming round.
    pub duration: Duration,
}

/// Point-in-time view of the session; the only read path for clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Server time the snapshot was taken at.
    pub now: OffsetDateTime,
    /// Whether a game is running.
    pub active: bool,
    /// Identifier of the current game; changes on every reset.
    pub session_id: String,
    /// Current 1-based round, 0 before the first round.
    pub round_number: u32,
    /// Rounds in this game.
    pub total_rounds: u32,
    /// Rounds left after the current one.
    pub rounds_remaining: u32,
    /// Guessing window of the current round.
    pub turn_duration: Duration,
    /// Deadline of the current phase.
    pub deadline: Option<OffsetDateTime>,
    /// Current round media.
    pub media: Option<MediaView>,
    /// Current phase.
    pub phase: Option<VisiblePhase>,
    /// Present only while revealing.
    pub reveal: Option<RevealView>,
    /// Present only while guessing.
    pub readiness: Option<ReadinessView>,
    /// Present once the next round's media has been chosen.
    pub pending: Option<PendingView>,
    /// Ranked players.
    pub leaderboard: Vec<Player>,
}

/// Aggregate root for the one game this process hosts.
#[derive(Debug, Clone)]
pub struct GameSession {
    settings: GameSettings,
    active: bool,
    session_id: String,
    total_rounds: u32,
    round_index: u32,
    rounds: RoundStateMachine,
    roster: Roster,
    used_media: HashSet<String>,
    pending: Option<PendingPick>,
}

impl GameSession {
    /// Idle session with no game running.
    pub fn new(settings: GameSettings) -> Self {
        Self {
            settings,
            active: false,
            session_id: fresh_session_id(),
            total_rounds: settings.total_rounds,
            round_index: 0,
            rounds: RoundStateMachine::new(),
            roster: Roster::new(),
            used_media: HashSet::new(),
            pending: None,
        }
    }

    /// Whether a game is running.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Identifier of the current game.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Current 1-based round index, 0 before the first round.
    pub fn round_index(&self) -> u32 {
        self.round_index
    }

    /// Rounds left after the current one.
    pub fn rounds_remaining(&self) -> u32 {
        self.total_rounds.saturating_sub(self.round_index)
    }

    /// Round bookkeeping.
    pub fn rounds(&self) -> &RoundStateMachine {
        &self.rounds
    }

    /// Player registry.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Media already chosen during this game.
    pub fn used_media(&self) -> &HashSet<String> {
        &self.used_media
    }

    /// Prefetched pick for the next round.
    pub fn pending(&self) -> Option<&PendingPick> {
        self.pending.as_ref()
    }

    /// Apply the transition the clock has made due, if any.
    ///
    /// At most one transition is applied per call: each one sets a deadline in
    /// the future relative to `now`.
    pub fn tick(&mut self, now: OffsetDateTime, catalog: &[MediaItem]) -> Option<DueTransition> {
        if !self.active {
            return None;
        }
        let due = due_transition(now, self.rounds.current()?, self.total_rounds)?;
        match due {
            DueTransition::Reveal => self.reveal(now, catalog, false),
            DueTransition::NextRound => self.start_next_round(now, catalog),
            DueTransition::Finish => {
                self.active = false;
                info!(session_id = %self.session_id, rounds = self.round_index, "game finished");
            }
        }
        Some(due)
    }

    /// Reset every per-game structure and open round 1.
    pub fn start_new_game(&mut self, now: OffsetDateTime, catalog: &[MediaItem]) -> &str {
        self.session_id = fresh_session_id();
        self.total_rounds = self.settings.total_rounds;
        self.round_index = 0;
        self.rounds = RoundStateMachine::new();
        self.roster.reset_scores();
        self.used_media.clear();
        self.pending = None;
        self.active = true;
        info!(
            session_id = %self.session_id,
            total_rounds = self.total_rounds,
            "new game started"
        );
        self.start_next_round(now, catalog);
        &self.session_id
    }

    /// Create a player on first reference or rename a known one.
    ///
    /// Unknown or missing ids get a freshly minted identity; a desired name is
    /// only applied to players that already exist.
    pub fn register_or_update_player(
        &mut self,
        player_id: Option<&str>,
        desired_name: Option<&str>,
    ) -> Player {
        match player_id.filter(|id| self.roster.contains(id)) {
            Some(id) => {
                if let Some(name) = desired_name.filter(|name| !name.is_empty()) {
                    self.roster.rename(id, name);
                }
                self.roster.ensure(id).clone()
            }
            None => {
                let player = self.roster.register_new();
                debug!(player_id = %player.id, name = %player.display_name, "player registered");
                player
            }
        }
    }

    /// Rename a known player.
    pub fn rename_player(&mut self, player_id: &str, name: &str) -> Option<Player> {
        self.roster.rename(player_id, name).cloned()
    }

    /// Mark a player as participating in the current game.
    pub fn join(&mut self, player_id: &str) -> Player {
        let player = self.roster.ensure(player_id).clone();
        self.rounds.join(player_id);
        debug!(player_id = %player_id, "player joined");
        player
    }

    /// Record a guess for the current round.
    pub fn submit_guess(
        &mut self,
        now: OffsetDateTime,
        player_id: &str,
        raw_guess: i64,
    ) -> Result<u32, Rejection> {
        self.guessing_round(now)?;
        self.roster.ensure(player_id);
        self.rounds
            .record_guess(player_id, raw_guess)
            .ok_or(Rejection::Reveal)
    }

    /// Signal readiness to reveal early; reveals at once when every active player is ready.
    pub fn mark_ready(
        &mut self,
        now: OffsetDateTime,
        catalog: &[MediaItem],
        player_id: &str,
    ) -> Result<(), Rejection> {
        self.guessing_round(now)?;
        self.roster.ensure(player_id);
        self.rounds.mark_ready(player_id);
        if self.rounds.everyone_ready() {
            self.reveal(now, catalog, true);
        }
        Ok(())
    }

    /// Ranked players.
    pub fn leaderboard(&self) -> Vec<Player> {
        self.roster.rank()
    }

    /// Build the client-facing view.
    pub fn snapshot(&self, now: OffsetDateTime) -> SessionSnapshot {
        let round = self.rounds.current();
        let media = round.and_then(|round| {
            round.media.as_ref().map(|media| MediaView {
                url: versioned_url(&media.path, &self.session_id, self.round_index),
                media_type: media.media_type,
            })
        });

        SessionSnapshot {
            now,
            active: self.active,
            session_id: self.session_id.clone(),
            round_number: self.round_index,
            total_rounds: self.total_rounds,
            rounds_remaining: self.rounds_remaining(),
            turn_duration: round.map_or(self.settings.image_duration, |round| round.duration),
            deadline: round.map(Round::deadline),
            media,
            phase: round.map(|round| match round.phase {
                RoundPhase::Guessing => VisiblePhase::Guessing,
                RoundPhase::Reveal { .. } => VisiblePhase::Reveal,
            }),
            reveal: round.and_then(|round| self.reveal_view(round)),
            readiness: round.and_then(|round| self.readiness_view(round)),
            pending: self.pending.as_ref().map(|pick| PendingView {
                media: MediaView {
                    url: versioned_url(&pick.media.path, &self.session_id, self.round_index + 1),
                    media_type: pick.media.media_type,
                },
                duration: pick.duration,
            }),
            leaderboard: self.leaderboard(),
        }
    }

    fn reveal_view(&self, round: &Round) -> Option<RevealView> {
        let RoundPhase::Reveal { ends_at } = round.phase else {
            return None;
        };
        Some(RevealView {
            true_age_days: round.media.as_ref().map(|media| media.age_days),
            results: self.rounds.results(round.index).cloned().unwrap_or_default(),
            ends_at,
        })
    }

    fn readiness_view(&self, round: &Round) -> Option<ReadinessView> {
        if !round.is_guessing() {
            return None;
        }
        let active = self.rounds.active();
        let ready: Vec<PlayerId> = self
            .rounds
            .ready(round.index)
            .map(|ready| ready.iter().cloned().collect())
            .unwrap_or_default();
        Some(ReadinessView {
            count: ready.iter().filter(|id| active.contains(*id)).count(),
            total: active.len(),
            ready_player_ids: ready,
            active_player_ids: active.iter().cloned().collect(),
        })
    }

    /// Gate shared by guesses and ready signals; the caller has already ticked.
    fn guessing_round(&self, now: OffsetDateTime) -> Result<&Round, Rejection> {
        if !self.active {
            return Err(Rejection::NoActiveGame);
        }
        let round = self.rounds.current().ok_or(Rejection::NoActiveGame)?;
        if !round.is_guessing() {
            return Err(Rejection::Reveal);
        }
        if now > round.guessing_ends_at {
            return Err(Rejection::RoundOver);
        }
        Ok(round)
    }

    fn reveal(&mut self, now: OffsetDateTime, catalog: &[MediaItem], early: bool) {
        let outcome = self
            .rounds
            .finalize(now, self.settings.reveal_duration, &mut self.roster);
        for player in &outcome.kicked {
            info!(player_id = %player, round = self.round_index, "player dropped after missed rounds");
        }
        info!(
            round = self.round_index,
            early,
            scored = outcome.scored,
            "round revealed"
        );
        self.ensure_pending_pick(catalog);
    }

    fn start_next_round(&mut self, now: OffsetDateTime, catalog: &[MediaItem]) {
        self.round_index += 1;
        let (media, duration) = match self.pending.take() {
            Some(pick) => (Some(pick.media), pick.duration),
            None => {
                let media = self.pick_media(catalog);
                let duration = media.as_ref().map_or(self.settings.image_duration, |media| {
                    self.settings.duration_for(media.media_type)
                });
                (media, duration)
            }
        };

        match &media {
            Some(item) => info!(
                round = self.round_index,
                media_type = %item.media_type,
                duration_secs = duration.whole_seconds(),
                "round started"
            ),
            None => info!(round = self.round_index, "round started without eligible media"),
        }
        self.rounds.start_round(self.round_index, media, duration, now);
    }

    fn ensure_pending_pick(&mut self, catalog: &[MediaItem]) {
        if self.pending.is_some() {
            return;
        }
        if let Some(media) = self.pick_media(catalog) {
            let duration = self.settings.duration_for(media.media_type);
            self.pending = Some(PendingPick { media, duration });
        }
    }

    /// Choose media and mark it used right away, so a prefetched pick counts too.
    fn pick_media(&mut self, catalog: &[MediaItem]) -> Option<MediaItem> {
        let chosen = select_media(catalog, &self.used_media, &mut rand::rng())?;
        self.used_media.insert(chosen.path.clone());
        Some(chosen)
    }
}

/// Uniform pick among items not used yet, falling back to the whole set once all were used.
pub fn select_media<R: Rng + ?Sized>(
    eligible: &[MediaItem],
    used: &HashSet<String>,
    rng: &mut R,
) -> Option<MediaItem> {
    let fresh: Vec<&MediaItem> = eligible
        .iter()
        .filter(|item| !used.contains(&item.path))
        .collect();
    let chosen = if fresh.is_empty() {
        eligible.choose(rng)
    } else {
        fresh.choose(rng).copied()
    };
    chosen.cloned()
}

fn fresh_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Shared, lock-guarded handle on the session.
///
/// Each method holds the lock for the tick and its own effect, which is what
/// guarantees a round is finalized once and the next round is started once.
pub struct SessionController {
    session: Mutex<GameSession>,
    clock: Arc<dyn Clock>,
    catalog: Arc<MediaCatalog>,
}

impl SessionController {
    /// Build a controller around an idle session.
    pub fn new(settings: GameSettings, clock: Arc<dyn Clock>, resolver: Arc<dyn MediaResolver>) -> Self {
        Self {
            session: Mutex::new(GameSession::new(settings)),
            clock,
            catalog: Arc::new(MediaCatalog::new(resolver)),
        }
    }

    /// Resolver backing the media catalog.
    pub fn resolver(&self) -> &Arc<dyn MediaResolver> {
        self.catalog.resolver()
    }

    /// Rescan media on the blocking pool, returning the eligible count.
    pub async fn refresh_catalog(&self) -> usize {
        self.catalog.refresh().await
    }

    /// Run `op` under the session lock after applying any due transition.
    ///
    /// Only the first call waits for a media scan, and it does so before locking.
    async fn with_ticked<T>(
        &self,
        op: impl FnOnce(&mut GameSession, OffsetDateTime, &[MediaItem]) -> T,
    ) -> T {
        self.catalog.ensure_loaded().await;
        self.catalog.refresh_if_stale();

        let mut session = self.session.lock().await;
        let now = self.clock.now();
        let catalog = self.catalog.items();
        session.tick(now, &catalog);
        op(&mut *session, now, &catalog)
    }

    /// Reset and start a fresh game, returning its identifier.
    pub async fn start_new_game(&self) -> String {
        self.with_ticked(|session, now, catalog| session.start_new_game(now, catalog).to_owned())
            .await
    }

    /// Create a player or rename an existing one.
    pub async fn register_or_update_player(
        &self,
        player_id: Option<&str>,
        desired_name: Option<&str>,
    ) -> Player {
        self.with_ticked(|session, _, _| session.register_or_update_player(player_id, desired_name))
            .await
    }

    /// Rename a known player and return the refreshed leaderboard.
    pub async fn rename_player(&self, player_id: &str, name: &str) -> Option<(Player, Vec<Player>)> {
        self.with_ticked(|session, _, _| {
            let player = session.rename_player(player_id, name)?;
            Some((player, session.leaderboard()))
        })
        .await
    }

    /// Mark a player active for the current game.
    pub async fn join(&self, player_id: &str) -> Player {
        self.with_ticked(|session, _, _| session.join(player_id)).await
    }

    /// Submit a guess for the current round.
    pub async fn submit_guess(&self, player_id: &str, raw_guess: i64) -> Result<u32, Rejection> {
        self.with_ticked(|session, now, _| session.submit_guess(now, player_id, raw_guess))
            .await
    }

    /// Signal readiness to reveal early.
    pub async fn mark_ready(&self, player_id: &str) -> Result<(), Rejection> {
        self.with_ticked(|session, now, catalog| session.mark_ready(now, catalog, player_id))
            .await
    }

    /// Current state as seen by clients.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.with_ticked(|session, now, _| session.snapshot(now)).await
    }

    /// Ranked players.
    pub async fn leaderboard(&self) -> Vec<Player> {
        self.with_ticked(|session, _, _| session.leaderboard()).await
    }

    /// Inspect the session under the lock without ticking.
    pub async fn inspect<T>(&self, op: impl FnOnce(&GameSession) -> T) -> T {
        let session = self.session.lock().await;
        op(&*session)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::{Duration as StdDuration, Instant},
    };

    use super::*;
    use crate::{
        media::StaticMediaResolver,
        state::{clock::ManualClock, round::RoundResult},
    };

    fn settings(total_rounds: u32) -> GameSettings {
        GameSettings {
            total_rounds,
            ..GameSettings::default()
        }
    }

    fn controller(total_rounds: u32, items: Vec<MediaItem>) -> (SessionController, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let controller = SessionController::new(
            settings(total_rounds),
            clock.clone(),
            Arc::new(StaticMediaResolver::new(items)),
        );
        (controller, clock)
    }

    fn image(path: &str, age: u32) -> MediaItem {
        MediaItem::new(path, MediaType::Image, age)
    }

    #[tokio::test]
    async fn scoring_scenario_single_guesser() {
        let (controller, clock) = controller(2, vec![image("a.jpg", 30)]);
        controller.start_new_game().await;
        controller.join("p").await;

        assert_eq!(controller.submit_guess("p", 25).await, Ok(25));
        clock.advance(Duration::seconds(10));

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.phase, Some(VisiblePhase::Reveal));
        let reveal = snapshot.reveal.expect("reveal payload");
        assert_eq!(reveal.true_age_days, Some(30));
        assert_eq!(reveal.results.len(), 1);
        assert_eq!(
            reveal.results.get("p"),
            Some(&RoundResult {
                guess_days: 25,
                diff: 5,
                points: 95
            })
        );
        assert!(reveal.results.get("other").is_none());
        assert_eq!(snapshot.leaderboard[0].score, 95);
    }

    #[tokio::test]
    async fn last_round_ends_the_game_for_good() {
        let (controller, clock) = controller(1, vec![image("a.jpg", 30)]);
        controller.start_new_game().await;

        clock.advance(Duration::seconds(10));
        assert_eq!(controller.snapshot().await.phase, Some(VisiblePhase::Reveal));

        clock.advance(Duration::seconds(5));
        let snapshot = controller.snapshot().await;
        assert!(!snapshot.active);
        assert_eq!(snapshot.round_number, 1);

        for _ in 0..3 {
            clock.advance(Duration::seconds(60));
            let snapshot = controller.snapshot().await;
            assert!(!snapshot.active);
            assert_eq!(snapshot.round_number, 1);
        }
        assert_eq!(
            controller.submit_guess("p", 1).await,
            Err(Rejection::NoActiveGame)
        );
    }

    #[tokio::test]
    async fn late_guess_is_rejected_after_the_tick_reveals() {
        let (controller, clock) = controller(3, vec![image("a.jpg", 30)]);
        controller.start_new_game().await;

        clock.advance(Duration::seconds(10));
        assert_eq!(controller.submit_guess("p", 30).await, Err(Rejection::Reveal));
        let results = controller
            .inspect(|session| session.rounds().results(1).cloned())
            .await
            .expect("round 1 finalized");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn early_reveal_waits_for_all_active_players() {
        let (controller, _clock) = controller(3, vec![image("a.jpg", 30), image("b.jpg", 5)]);
        controller.start_new_game().await;
        controller.join("a").await;
        controller.join("b").await;

        controller.mark_ready("a").await.unwrap();
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.phase, Some(VisiblePhase::Guessing));
        let readiness = snapshot.readiness.unwrap();
        assert_eq!((readiness.count, readiness.total), (1, 2));

        controller.mark_ready("b").await.unwrap();
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.phase, Some(VisiblePhase::Reveal));
        assert!(snapshot.readiness.is_none());
        assert!(snapshot.pending.is_some(), "next pick prefetched on reveal");
        assert_eq!(controller.mark_ready("a").await, Err(Rejection::Reveal));
    }

    #[tokio::test]
    async fn ready_without_active_players_waits_for_timer() {
        let (controller, _clock) = controller(3, vec![image("a.jpg", 30)]);
        controller.start_new_game().await;

        controller.mark_ready("lurker").await.unwrap();
        assert_eq!(
            controller.snapshot().await.phase,
            Some(VisiblePhase::Guessing)
        );
    }

    #[tokio::test]
    async fn round_index_advances_once_per_reveal_cycle() {
        let (controller, clock) = controller(4, vec![image("a.jpg", 1), image("b.jpg", 2)]);
        controller.start_new_game().await;

        let mut last = controller.snapshot().await.round_number;
        assert_eq!(last, 1);
        for _ in 0..40 {
            clock.advance(Duration::seconds(3));
            let current = controller.snapshot().await.round_number;
            assert!(current == last || current == last + 1);
            last = current;
        }
        assert_eq!(last, 4);
        assert!(!controller.snapshot().await.active);
    }

    #[tokio::test]
    async fn prefetched_pick_is_used_for_next_round() {
        let (controller, clock) = controller(3, vec![image("a.jpg", 1), image("b.jpg", 2)]);
        controller.start_new_game().await;

        clock.advance(Duration::seconds(10));
        let revealed = controller.snapshot().await;
        let pending = revealed.pending.expect("pending pick");
        assert!(pending.media.url.ends_with(&format!("?v={}-2", revealed.session_id)));

        clock.advance(Duration::seconds(5));
        let next = controller.snapshot().await;
        assert_eq!(next.round_number, 2);
        assert!(next.pending.is_none());
        assert_eq!(next.media.map(|media| media.url), Some(pending.media.url));
    }

    #[tokio::test]
    async fn video_rounds_use_video_duration() {
        let (controller, _clock) = controller(
            2,
            vec![MediaItem::new("clip.mp4", MediaType::Video, 12)],
        );
        controller.start_new_game().await;
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.turn_duration, Duration::seconds(20));
        assert_eq!(snapshot.media.unwrap().media_type, MediaType::Video);
    }

    #[tokio::test]
    async fn rounds_without_media_still_run_a_timer() {
        let (controller, clock) = controller(2, Vec::new());
        controller.start_new_game().await;
        controller.join("p").await;
        controller.submit_guess("p", 12).await.unwrap();

        let snapshot = controller.snapshot().await;
        assert!(snapshot.media.is_none());
        assert_eq!(snapshot.deadline, Some(clock.now() + Duration::seconds(10)));

        clock.advance(Duration::seconds(10));
        let snapshot = controller.snapshot().await;
        let reveal = snapshot.reveal.unwrap();
        assert_eq!(reveal.true_age_days, None);
        assert!(reveal.results.is_empty());
        assert_eq!(snapshot.leaderboard[0].score, 0);
        assert!(snapshot.pending.is_none());
    }

    #[tokio::test]
    async fn new_game_resets_scores_and_identity() {
        let (controller, clock) = controller(2, vec![image("a.jpg", 30)]);
        let first = controller.start_new_game().await;
        controller.submit_guess("p", 30).await.unwrap();
        clock.advance(Duration::seconds(10));
        assert_eq!(controller.leaderboard().await[0].score, 100);

        let second = controller.start_new_game().await;
        assert_ne!(first, second);
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.round_number, 1);
        assert_eq!(snapshot.leaderboard.len(), 1);
        assert_eq!(snapshot.leaderboard[0].score, 0);
        controller
            .inspect(|session| {
                assert_eq!(session.used_media().len(), 1);
                assert!(session.rounds().results(1).is_none());
            })
            .await;
    }

    #[tokio::test]
    async fn register_mints_ids_and_renames_known_players() {
        let (controller, _clock) = controller(2, Vec::new());
        let fresh = controller.register_or_update_player(None, Some("Ignored")).await;
        assert_ne!(fresh.display_name, "Ignored");

        let renamed = controller
            .register_or_update_player(Some(&fresh.id), Some("  Auntie  "))
            .await;
        assert_eq!(renamed.id, fresh.id);
        assert_eq!(renamed.display_name, "Auntie");

        let unknown = controller
            .register_or_update_player(Some("made-up"), None)
            .await;
        assert_ne!(unknown.id, "made-up");
        assert!(controller.rename_player("nobody", "x").await.is_none());
    }

    #[test]
    fn selection_avoids_repeats_until_exhausted() {
        let items = vec![image("a", 1), image("b", 2), image("c", 3)];
        let mut used = HashSet::new();
        let mut rng = rand::rng();

        for _ in 0..3 {
            let pick = select_media(&items, &used, &mut rng).unwrap();
            assert!(used.insert(pick.path), "repeated before exhaustion");
        }
        assert!(select_media(&items, &used, &mut rng).is_some());
        assert!(select_media(&[], &used, &mut rng).is_none());
    }

    #[tokio::test]
    async fn five_round_game_uses_every_item_before_repeating() {
        let items = vec![image("a", 1), image("b", 2), image("c", 3)];
        for _ in 0..20 {
            let (controller, clock) = controller(5, items.clone());
            controller.start_new_game().await;
            let mut served = Vec::new();
            let mut last_round = 0;
            loop {
                let snapshot = controller.snapshot().await;
                if !snapshot.active {
                    break;
                }
                if snapshot.round_number != last_round {
                    last_round = snapshot.round_number;
                    let media = snapshot.media.expect("media every round");
                    served.push(media.url.split('?').next().unwrap().to_owned());
                }
                clock.advance(Duration::seconds(5));
            }
            assert_eq!(served.len(), 5);
            let mut first_three = served[..3].to_vec();
            first_three.sort();
            first_three.dedup();
            assert_eq!(first_three.len(), 3, "served {served:?}");
        }
    }

    /// Answers the first scan at once and sleeps through every later one.
    struct SlowResolver {
        items: Vec<MediaItem>,
        scans: AtomicUsize,
        delay: StdDuration,
    }

    impl MediaResolver for SlowResolver {
        fn eligible(&self) -> Vec<MediaItem> {
            if self.scans.fetch_add(1, Ordering::SeqCst) > 0 {
                std::thread::sleep(self.delay);
            }
            self.items.clone()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn slow_media_scan_does_not_hold_up_requests() {
        let resolver = Arc::new(SlowResolver {
            items: vec![image("a.jpg", 30), image("b.jpg", 40)],
            scans: AtomicUsize::new(0),
            delay: StdDuration::from_millis(800),
        });
        let controller = Arc::new(SessionController::new(
            settings(3),
            Arc::new(ManualClock::default()),
            resolver.clone(),
        ));
        controller.start_new_game().await;

        let rescan = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.refresh_catalog().await }
        });
        while resolver.scans.load(Ordering::SeqCst) < 2 {
            tokio::time::sleep(StdDuration::from_millis(1)).await;
        }

        let started = Instant::now();
        let snapshot = tokio::time::timeout(StdDuration::from_millis(400), controller.snapshot())
            .await
            .expect("snapshot served during a rescan");
        assert_eq!(snapshot.round_number, 1);
        controller.join("p").await;
        assert_eq!(controller.submit_guess("p", 12).await, Ok(12));
        assert!(started.elapsed() < StdDuration::from_millis(400));

        assert_eq!(rescan.await.unwrap(), 2);
    }

    async fn hammer(controller: &Arc<SessionController>, requests: usize) {
        let mut tasks = Vec::with_capacity(requests);
        for n in 0..requests {
            let controller = Arc::clone(controller);
            tasks.push(tokio::spawn(async move {
                match n % 3 {
                    0 => {
                        controller.snapshot().await;
                    }
                    1 => {
                        let _ = controller.submit_guess("p", 30).await;
                    }
                    _ => {
                        let _ = controller.mark_ready("p").await;
                    }
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_at_a_deadline_transition_once() {
        let (controller, clock) = controller(3, vec![image("a.jpg", 30), image("b.jpg", 40)]);
        let controller = Arc::new(controller);
        controller.start_new_game().await;
        controller.join("p").await;
        assert_eq!(controller.submit_guess("p", 25).await, Ok(25));

        clock.advance(Duration::seconds(10));
        hammer(&controller, 100).await;

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.round_number, 1);
        assert_eq!(snapshot.phase, Some(VisiblePhase::Reveal));
        assert_eq!(snapshot.leaderboard[0].score, 95);
        let pending = snapshot.pending.expect("one prefetched pick");
        let results = controller
            .inspect(|session| session.rounds().results(1).cloned())
            .await
            .expect("round 1 finalized");
        assert_eq!(results.len(), 1);
        assert_eq!(results["p"].points, 95);
        assert_eq!(controller.inspect(|session| session.used_media().len()).await, 2);

        clock.advance(Duration::seconds(5));
        hammer(&controller, 100).await;

        // Round 2 may have been revealed early by the ready votes, but only once.
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.round_number, 2);
        let round_two = controller
            .inspect(|session| session.rounds().results(2).cloned())
            .await;
        let extra = round_two
            .as_ref()
            .and_then(|results| results.get("p"))
            .map_or(0, |result| result.points);
        assert_eq!(snapshot.leaderboard[0].score, 95 + extra);
        let served = snapshot.media.expect("round 2 media").url;
        assert_eq!(served.split('?').next(), pending.media.url.split('?').next());
    }
}
