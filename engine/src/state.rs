//! In-memory data model: `GameState` and everything it owns. Only the
//! Coordinator ever mutates this; the Broadcast Hub and Connection Layer
//! see it only through pre-serialized event payloads.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::config::GameConfig;

/// An immutable song record. Songs without a `year` never make it into
/// the pool — the Playback Adapter filters them out at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub year: i32,
    pub cover_reference: Option<String>,
}

impl Song {
    pub fn summary(&self) -> protocol::SongSummary {
        protocol::SongSummary {
            title: self.title.clone(),
            artist: self.artist.clone(),
            cover_reference: self.cover_reference.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub name: String,
    pub session_id: String,
    pub total_points: i64,
    pub is_admin: bool,
    pub connected: bool,
}

impl Player {
    pub fn summary(&self) -> protocol::PlayerSummary {
        protocol::PlayerSummary {
            name: self.name.clone(),
            total_points: self.total_points,
            is_admin: self.is_admin,
            connected: self.connected,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Guess {
    pub player_name: String,
    pub year: i32,
    pub bet_placed: bool,
    pub submitted_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundStatus {
    Active,
    Ended,
}

/// `Round → Song` by value (songs are cheap, immutable, and never
/// mutated once drawn), matching the "no cyclic references" ownership
/// rule: nothing here points back at a `Player` or `Connection`.
#[derive(Debug, Clone)]
pub struct Round {
    pub number: u32,
    pub song: Song,
    pub started_at: Instant,
    pub started_at_wall: DateTime<Utc>,
    pub deadline: Instant,
    pub status: RoundStatus,
    pub guesses: HashMap<String, Guess>,
    /// Players connected at the moment this round started. A player who
    /// joins mid-round is not added here, which is what excludes them
    /// from this round's eligible-player count and results.
    pub eligible_players: HashSet<String>,
}

impl Round {
    pub fn is_active(&self) -> bool {
        self.status == RoundStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Setup,
    Lobby,
    Active,
    Ended,
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GameStatus::Setup => "setup",
            GameStatus::Lobby => "lobby",
            GameStatus::Active => "active",
            GameStatus::Ended => "ended",
        };
        write!(f, "{s}")
    }
}

/// Top-level container, exclusively owned by the Coordinator.
pub struct GameState {
    pub config: GameConfig,
    pub status: GameStatus,
    pub players: Vec<Player>,
    pub available_songs: Vec<Song>,
    pub played_song_ids: HashSet<String>,
    pub current_round: Option<Round>,
    pub round_counter: u32,
    /// Minted fresh at `start_game`; the first WebSocket caller to
    /// present it is granted admin. `None` before the first `start_game`.
    pub admin_secret: Option<String>,
    /// The playback target's state captured by `snapshot_state` at
    /// `start_game`, restored by `stop_game` so the engine doesn't stomp on
    /// whatever was playing before the party started.
    pub playback_snapshot: Option<crate::playback::PlaybackStateToken>,
}

impl GameState {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            status: GameStatus::Setup,
            players: Vec::new(),
            available_songs: Vec::new(),
            played_song_ids: HashSet::new(),
            current_round: None,
            round_counter: 0,
            admin_secret: None,
            playback_snapshot: None,
        }
    }

    pub fn player_by_name(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn player_by_name_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.name == name)
    }

    pub fn player_by_session(&self, session_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.session_id == session_id)
    }

    /// Number of joined, still-connected players — the denominator for
    /// the "all eligible players submitted" round-ending condition.
    pub fn eligible_player_count(&self) -> usize {
        self.players.iter().filter(|p| p.connected).count()
    }

    /// Resolves a duplicate name by appending ` (k)`, smallest `k >= 2`
    /// that is not already taken.
    pub fn resolve_name(&self, requested: &str) -> String {
        if self.player_by_name(requested).is_none() {
            return requested.to_string();
        }
        let mut k = 2;
        loop {
            let candidate = format!("{requested} ({k})");
            if self.player_by_name(&candidate).is_none() {
                return candidate;
            }
            k += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str) -> Player {
        Player {
            name: name.to_string(),
            session_id: format!("sess-{name}"),
            total_points: 0,
            is_admin: false,
            connected: true,
        }
    }

    #[test]
    fn name_resolution_is_deterministic_on_existing_set() {
        let mut state = GameState::new(GameConfig::default());
        state.players.push(player("Sarah"));
        assert_eq!(state.resolve_name("Sarah"), "Sarah (2)");

        state.players.push(player("Sarah (2)"));
        assert_eq!(state.resolve_name("Sarah"), "Sarah (3)");
    }

    #[test]
    fn unique_name_passes_through() {
        let state = GameState::new(GameConfig::default());
        assert_eq!(state.resolve_name("Alex"), "Alex");
    }

    #[test]
    fn eligible_count_excludes_disconnected() {
        let mut state = GameState::new(GameConfig::default());
        state.players.push(player("Sarah"));
        let mut alex = player("Alex");
        alex.connected = false;
        state.players.push(alex);
        assert_eq!(state.eligible_player_count(), 1);
    }
}
