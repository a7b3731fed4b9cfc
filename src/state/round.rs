//! Per-round bookkeeping: phase, deadlines, guesses, readiness and misses.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use time::{Duration, OffsetDateTime};

use crate::{
    media::MediaItem,
    state::{
        roster::{PlayerId, Roster},
        scoring,
    },
};

/// Inclusive upper bound of an accepted guess, in days.
pub const MAX_GUESS_DAYS: u32 = 365;
/// Consecutive missed rounds after which an active player is dropped.
pub const MISS_LIMIT: u8 = 2;

/// Phase of the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Players may submit guesses until the guessing deadline.
    Guessing,
    /// Results are shown until `ends_at`.
    Reveal {
        /// End of the reveal window.
        ends_at: OffsetDateTime,
    },
}

/// The round currently being played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    /// 1-based round number.
    pub index: u32,
    /// Media shown this round; `None` when nothing eligible could be found.
    pub media: Option<MediaItem>,
    /// Length of the guessing window.
    pub duration: Duration,
    /// End of the guessing window.
    pub guessing_ends_at: OffsetDateTime,
    /// Current phase.
    pub phase: RoundPhase,
}

impl Round {
    /// Deadline relevant to the current phase.
    pub fn deadline(&self) -> OffsetDateTime {
        match self.phase {
            RoundPhase::Guessing => self.guessing_ends_at,
            RoundPhase::Reveal { ends_at } => ends_at,
        }
    }

    /// Whether guesses can still be recorded.
    pub fn is_guessing(&self) -> bool {
        matches!(self.phase, RoundPhase::Guessing)
    }
}

/// Transition that the clock has made due for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueTransition {
    /// The guessing deadline passed: score and reveal.
    Reveal,
    /// The reveal deadline passed and rounds remain.
    NextRound,
    /// The reveal deadline passed on the last round.
    Finish,
}

/// Decide which transition, if any, is due at `now`. Pure; applies nothing.
pub fn due_transition(now: OffsetDateTime, round: &Round, total_rounds: u32) -> Option<DueTransition> {
    match round.phase {
        RoundPhase::Guessing if now >= round.guessing_ends_at => Some(DueTransition::Reveal),
        RoundPhase::Reveal { ends_at } if now >= ends_at => {
            if round.index >= total_rounds {
                Some(DueTransition::Finish)
            } else {
                Some(DueTransition::NextRound)
            }
        }
        _ => None,
    }
}

/// Outcome of a single guess once the true age is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundResult {
    /// Guess as recorded (already clamped).
    pub guess_days: u32,
    /// Absolute error in days.
    pub diff: u32,
    /// Points awarded.
    pub points: u32,
}

/// What finalizing a round produced, for logging.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Finalized {
    /// Number of scored guesses.
    pub scored: usize,
    /// Players dropped from the active set by this round.
    pub kicked: Vec<PlayerId>,
}

/// Round bookkeeping for one game.
///
/// Guesses and readiness are only ever written for the current round, and
/// results for a round are written once, at the Guessing to Reveal edge.
#[derive(Debug, Default, Clone)]
pub struct RoundStateMachine {
    current: Option<Round>,
    guesses: HashMap<u32, IndexMap<PlayerId, u32>>,
    results: HashMap<u32, IndexMap<PlayerId, RoundResult>>,
    ready: HashMap<u32, BTreeSet<PlayerId>>,
    active: BTreeSet<PlayerId>,
    misses: HashMap<PlayerId, u8>,
}

impl RoundStateMachine {
    /// Empty machine with no current round.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current round, if the game has started.
    pub fn current(&self) -> Option<&Round> {
        self.current.as_ref()
    }

    /// Open a new round in the guessing phase with empty guess and ready sets.
    pub fn start_round(
        &mut self,
        index: u32,
        media: Option<MediaItem>,
        duration: Duration,
        now: OffsetDateTime,
    ) -> &Round {
        self.guesses.insert(index, IndexMap::new());
        self.ready.insert(index, BTreeSet::new());
        self.current.insert(Round {
            index,
            media,
            duration,
            guessing_ends_at: now.saturating_add(duration),
            phase: RoundPhase::Guessing,
        })
    }

    /// Record or overwrite a guess for the current round, clamping it to the valid range.
    ///
    /// Returns the stored value, or `None` when no round is accepting guesses.
    pub fn record_guess(&mut self, player: &str, guess_days: i64) -> Option<u32> {
        let round = self.current.as_ref().filter(|round| round.is_guessing())?;
        let clamped = clamp_guess(guess_days);
        self.guesses
            .entry(round.index)
            .or_default()
            .insert(player.to_owned(), clamped);
        Some(clamped)
    }

    /// Add a player to the current round's readiness set.
    pub fn mark_ready(&mut self, player: &str) -> bool {
        let Some(round) = self.current.as_ref().filter(|round| round.is_guessing()) else {
            return false;
        };
        self.ready
            .entry(round.index)
            .or_default()
            .insert(player.to_owned());
        true
    }

    /// Whether every active player is ready. An empty active set never qualifies.
    pub fn everyone_ready(&self) -> bool {
        let Some(round) = self.current.as_ref().filter(|round| round.is_guessing()) else {
            return false;
        };
        if self.active.is_empty() {
            return false;
        }
        self.ready
            .get(&round.index)
            .is_some_and(|ready| self.active.is_subset(ready))
    }

    /// Count the player as participating and clear their misses.
    pub fn join(&mut self, player: &str) {
        self.active.insert(player.to_owned());
        self.misses.insert(player.to_owned(), 0);
    }

    /// Score the current round and move it into the reveal phase.
    ///
    /// Rounds without media record no results and leave misses untouched.
    /// Calling this outside the guessing phase does nothing.
    pub fn finalize(&mut self, now: OffsetDateTime, reveal: Duration, roster: &mut Roster) -> Finalized {
        let Some(round) = self.current.as_mut().filter(|round| round.is_guessing()) else {
            return Finalized::default();
        };
        round.phase = RoundPhase::Reveal {
            ends_at: now.saturating_add(reveal),
        };
        let index = round.index;
        let Some(true_age) = round.media.as_ref().map(|media| media.age_days) else {
            return Finalized::default();
        };

        let guesses = self.guesses.get(&index).cloned().unwrap_or_default();
        let mut results = IndexMap::with_capacity(guesses.len());
        for (player, guess_days) in &guesses {
            let points = scoring::points(*guess_days, true_age);
            roster.award(player, points);
            results.insert(
                player.clone(),
                RoundResult {
                    guess_days: *guess_days,
                    diff: guess_days.abs_diff(true_age),
                    points,
                },
            );
        }
        let scored = results.len();
        self.results.entry(index).or_insert(results);

        let mut kicked = Vec::new();
        for player in self.active.clone() {
            let misses = self.misses.entry(player.clone()).or_default();
            if guesses.contains_key(&player) {
                *misses = 0;
                continue;
            }
            *misses = misses.saturating_add(1);
            if *misses >= MISS_LIMIT {
                self.active.remove(&player);
                kicked.push(player);
            }
        }

        Finalized { scored, kicked }
    }

    /// Results recorded for `index`, if that round has been scored.
    pub fn results(&self, index: u32) -> Option<&IndexMap<PlayerId, RoundResult>> {
        self.results.get(&index)
    }

    /// Guesses recorded for `index`.
    pub fn guesses(&self, index: u32) -> Option<&IndexMap<PlayerId, u32>> {
        self.guesses.get(&index)
    }

    /// Players who signalled readiness for `index`.
    pub fn ready(&self, index: u32) -> Option<&BTreeSet<PlayerId>> {
        self.ready.get(&index)
    }

    /// Players currently counted as participating.
    pub fn active(&self) -> &BTreeSet<PlayerId> {
        &self.active
    }

    /// Consecutive misses for a player.
    pub fn misses(&self, player: &str) -> u8 {
        self.misses.get(player).copied().unwrap_or(0)
    }
}

/// Clamp a raw guess into `0..=MAX_GUESS_DAYS`.
pub fn clamp_guess(raw: i64) -> u32 {
    u32::try_from(raw.clamp(0, i64::from(MAX_GUESS_DAYS))).unwrap_or(MAX_GUESS_DAYS)
}
