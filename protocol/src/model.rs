//! Payload-shape types shared by several events and by the admin API.

use serde::{Deserialize, Serialize};

/// A song as advertised to clients. Never carries the correct year while
/// a round is active — `round_started` omits it by construction (see
/// [`crate::event::RoundStartedData`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongSummary {
    pub title: String,
    pub artist: String,
    pub cover_reference: Option<String>,
}

/// One player's result row in `round_ended`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResultEntry {
    pub player_name: String,
    pub guess: i32,
    pub points_earned: i64,
    pub bet_placed: bool,
}

/// One row of the leaderboard, sorted by `total_points` descending with
/// alphabetical tie-break.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player_name: String,
    pub total_points: i64,
    pub rank: u32,
}

/// Player roster entry, used in reconnect snapshots and admin listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub name: String,
    pub total_points: i64,
    pub is_admin: bool,
    pub connected: bool,
}

/// Round summary included in a reconnect snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundSummary {
    pub number: u32,
    pub song: SongSummary,
    pub timer_duration_secs: u32,
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// Only present once the round has ended.
    pub correct_year: Option<i32>,
    pub has_submitted: bool,
}
