//! The closed set of commands a WebSocket client may send, and their
//! inbound payload shapes. Each variant matches a row of the command
//! table: preconditions and effects live in the engine, not here.

use serde::{Deserialize, Serialize};

/// Optional per-field overrides accepted by `start_game`. Any field left
/// `None` keeps the previously configured value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfigOverrides {
    pub timer_duration_secs: Option<u32>,
    pub year_range_min: Option<i32>,
    pub year_range_max: Option<i32>,
    pub exact_points: Option<i64>,
    pub close_points: Option<i64>,
    pub near_points: Option<i64>,
    pub bet_multiplier: Option<i64>,
    pub playback_target_id: Option<String>,
    pub playlist_id: Option<String>,
}

/// `{ "type": "<command>", "data": { ... } }` inbound messages.
///
/// `admin_secret` rides along on the admin-only variants so a
/// WebSocket-connected admin can authorize itself with the device secret
/// minted at `start_game` (see the admin-authorization note in
/// `SPEC_FULL.md`); the Connection Layer's own "is this the admin
/// channel" flag is an independent, and sufficient on its own, way to
/// authorize the same commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientCommand {
    JoinGame {
        name: String,
    },
    Reconnect {
        session_id: String,
    },
    PlaceBet {
        name: String,
        bet: bool,
    },
    SubmitGuess {
        name: String,
        year: i32,
        bet: bool,
    },
    StartGame {
        #[serde(default)]
        config: GameConfigOverrides,
        #[serde(default)]
        admin_secret: Option<String>,
    },
    NextSong {
        #[serde(default)]
        admin_secret: Option<String>,
    },
    StopGame {
        #[serde(default)]
        admin_secret: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_game_round_trips() {
        let json = r#"{"type":"join_game","data":{"name":"Sarah"}}"#;
        let cmd: ClientCommand = serde_json::from_str(json).unwrap();
        assert!(matches!(cmd, ClientCommand::JoinGame { name } if name == "Sarah"));
    }

    #[test]
    fn unknown_type_fails_to_parse() {
        let json = r#"{"type":"teleport","data":{}}"#;
        let result: Result<ClientCommand, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn next_song_without_secret_defaults_to_none() {
        let json = r#"{"type":"next_song","data":{}}"#;
        let cmd: ClientCommand = serde_json::from_str(json).unwrap();
        assert!(matches!(cmd, ClientCommand::NextSong { admin_secret: None }));
    }
}
