//! Player registry and the leaderboard derived from it.

use std::collections::HashMap;

use uuid::Uuid;

use crate::state::names::{generate_username, sanitize_username};

/// Opaque, client-supplied player identifier.
pub type PlayerId = String;

/// Player info tracked across games.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Identifier presented by the client.
    pub id: PlayerId,
    /// Display name shown on the leaderboard.
    pub display_name: String,
    /// Cumulative score for the current game.
    pub score: u32,
}

impl Player {
    fn new(id: PlayerId, display_name: String) -> Self {
        Self {
            id,
            display_name,
            score: 0,
        }
    }
}

/// Every player ever seen by this process, keyed by identifier.
///
/// Players survive game resets; only their scores are cleared.
#[derive(Debug, Default, Clone)]
pub struct Roster {
    players: HashMap<PlayerId, Player>,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a player.
    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    /// Whether the identifier is known.
    pub fn contains(&self, id: &str) -> bool {
        self.players.contains_key(id)
    }

    /// Number of registered players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// True when no player registered yet.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Return the player for `id`, provisioning one with a generated name when unknown.
    pub fn ensure(&mut self, id: &str) -> &mut Player {
        self.players
            .entry(id.to_owned())
            .or_insert_with(|| Player::new(id.to_owned(), generate_username()))
    }

    /// Register a brand-new player under a freshly minted identifier.
    pub fn register_new(&mut self) -> Player {
        let id = Uuid::new_v4().simple().to_string();
        let player = Player::new(id.clone(), generate_username());
        self.players.insert(id, player.clone());
        player
    }

    /// Rename an existing player. Returns `None` when the id is unknown.
    pub fn rename(&mut self, id: &str, desired: &str) -> Option<&Player> {
        let player = self.players.get_mut(id)?;
        player.display_name = sanitize_username(desired);
        Some(player)
    }

    /// Add points to a player's cumulative score. Unknown ids are ignored.
    pub fn award(&mut self, id: &str, points: u32) {
        if let Some(player) = self.players.get_mut(id) {
            player.score = player.score.saturating_add(points);
        }
    }

    /// Zero every score while keeping identities and names.
    pub fn reset_scores(&mut self) {
        for player in self.players.values_mut() {
            player.score = 0;
        }
    }

    /// Rank players by descending score, ties broken by case-insensitive name.
    pub fn rank(&self) -> Vec<Player> {
        let mut ranked: Vec<Player> = self.players.values().cloned().collect();
        ranked.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| {
                    a.display_name
                        .to_lowercase()
                        .cmp(&b.display_name.to_lowercase())
                })
                .then_with(|| a.id.cmp(&b.id))
        });
        ranked
    }
}
