//! The closed set of server-pushed events and the envelope they travel in.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::model::{LeaderboardEntry, PlayerSummary, RoundResultEntry, RoundSummary, SongSummary};

/// `{ "type": "beatsy/event", "event_type": "<name>", "data": {...}, "timestamp": ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub event_type: &'static str,
    pub data: EventPayload,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl EventEnvelope {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            message_type: crate::EVENT_MESSAGE_TYPE,
            event_type: payload.event_type(),
            data: payload,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// One variant per row of the event catalog. `#[serde(untagged)]` keeps
/// each payload's JSON shape exactly as documented, since `event_type` on
/// the envelope already disambiguates which one a client received.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    PlayerJoined(PlayerJoinedData),
    PlayerReconnected(PlayerReconnectedData),
    BetPlaced(BetPlacedData),
    GuessSubmitted(GuessSubmittedData),
    RoundStarted(RoundStartedData),
    RoundEnded(RoundEndedData),
    GameReset(GameResetData),
    Error(ApiError),
}

impl EventPayload {
    pub fn event_type(&self) -> &'static str {
        match self {
            EventPayload::PlayerJoined(_) => "player_joined",
            EventPayload::PlayerReconnected(_) => "player_reconnected",
            EventPayload::BetPlaced(_) => "bet_placed",
            EventPayload::GuessSubmitted(_) => "guess_submitted",
            EventPayload::RoundStarted(_) => "round_started",
            EventPayload::RoundEnded(_) => "round_ended",
            EventPayload::GameReset(_) => "game_reset",
            EventPayload::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerJoinedData {
    pub player_name: String,
    pub total_players: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerReconnectedData {
    pub player_name: String,
    pub state_snapshot: ReconnectSnapshot,
}

/// Full state handed back only to the reconnecting client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectSnapshot {
    pub game_status: String,
    pub players: Vec<PlayerSummary>,
    pub current_round: Option<RoundSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetPlacedData {
    pub player_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessSubmittedData {
    pub player_name: String,
}

/// `year` is deliberately omitted — see the distilled spec's event catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundStartedData {
    pub round_number: u32,
    pub song: SongSummary,
    pub timer_duration_secs: u32,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundEndedData {
    pub correct_year: i32,
    pub results: Vec<RoundResultEntry>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResetData {
    /// Present only for the caller that performed `start_game`; other
    /// recipients receive an empty string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_secret: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_started_omits_year() {
        let payload = EventPayload::RoundStarted(RoundStartedData {
            round_number: 1,
            song: SongSummary {
                title: "Take On Me".into(),
                artist: "a-ha".into(),
                cover_reference: None,
            },
            timer_duration_secs: 30,
            started_at: chrono::Utc::now(),
        });
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("year"));
    }

    #[test]
    fn envelope_carries_fixed_message_type() {
        let envelope = EventEnvelope::new(EventPayload::GameReset(GameResetData {
            admin_secret: None,
        }));
        assert_eq!(envelope.message_type, "beatsy/event");
        assert_eq!(envelope.event_type, "game_reset");
    }
}
