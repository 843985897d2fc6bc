//! The closed set of messages the Coordinator's actor loop accepts.
//!
//! Every externally-triggered variant carries a `respond` channel so the
//! Connection Layer can `await` the result of the single mutation it
//! asked for, mirroring a request/response call despite the Coordinator
//! being a plain `mpsc` consumer. `DeadlineExpired` is the one variant
//! nothing outside the engine ever constructs — it's how the round
//! timer's cancellable wait reports back onto the same serialization
//! boundary as every other mutation.

use tokio::sync::oneshot;

use protocol::GameConfigOverrides;

use crate::error::EngineError;

pub type Responder<T> = oneshot::Sender<Result<T, EngineError>>;

#[derive(Debug)]
pub struct JoinOutcome {
    pub resolved_name: String,
    pub session_id: String,
    pub is_admin: bool,
}

#[derive(Debug)]
pub struct ReconnectOutcome {
    pub player_name: String,
    pub snapshot: protocol::ReconnectSnapshot,
}

#[derive(Debug)]
pub struct StartGameOutcome {
    pub admin_secret: String,
}

pub enum Command {
    JoinGame {
        name: String,
        is_admin_channel: bool,
        respond: Responder<JoinOutcome>,
    },
    Reconnect {
        session_id: String,
        respond: Responder<ReconnectOutcome>,
    },
    PlaceBet {
        name: String,
        bet: bool,
        respond: Responder<()>,
    },
    SubmitGuess {
        name: String,
        year: i32,
        bet: bool,
        respond: Responder<()>,
    },
    StartGame {
        config: GameConfigOverrides,
        admin_secret: Option<String>,
        is_admin_channel: bool,
        /// The WebSocket connection that issued this command, if any (the
        /// admin HTTP surface has none). Lets the Coordinator hand that one
        /// connection the minted secret directly and exclude it from the
        /// public `game_reset` broadcast, instead of delivering both to it.
        requesting_connection: Option<crate::broadcast_hub::ConnectionId>,
        respond: Responder<StartGameOutcome>,
    },
    NextSong {
        admin_secret: Option<String>,
        is_admin_channel: bool,
        respond: Responder<()>,
    },
    StopGame {
        admin_secret: Option<String>,
        is_admin_channel: bool,
        respond: Responder<()>,
    },
    /// Delivered by the round timer task when a round's deadline elapses
    /// without every eligible player having submitted. `round_number`
    /// guards against a stale timer firing after the round already ended
    /// some other way (all-submitted, `next_song`, `stop_game`).
    DeadlineExpired {
        round_number: u32,
    },
}

impl Command {
    /// Used by the Coordinator's tracing to describe an incoming command
    /// without dumping player-supplied strings into the log line.
    pub fn name(&self) -> &'static str {
        match self {
            Command::JoinGame { .. } => "join_game",
            Command::Reconnect { .. } => "reconnect",
            Command::PlaceBet { .. } => "place_bet",
            Command::SubmitGuess { .. } => "submit_guess",
            Command::StartGame { .. } => "start_game",
            Command::NextSong { .. } => "next_song",
            Command::StopGame { .. } => "stop_game",
            Command::DeadlineExpired { .. } => "deadline_expired",
        }
    }
}

/// Shared admin check for the three privileged commands: authorized if
/// the connection came in on the admin-flagged channel, or if the
/// presented secret matches the one minted at `start_game`.
pub fn authorize_admin(
    admin_secret: &Option<String>,
    is_admin_channel: bool,
    minted_secret: &Option<String>,
) -> bool {
    if is_admin_channel {
        return true;
    }
    match (admin_secret, minted_secret) {
        (Some(presented), Some(minted)) => presented == minted,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_channel_always_authorizes() {
        assert!(authorize_admin(&None, true, &None));
    }

    #[test]
    fn matching_secret_authorizes() {
        let minted = Some("abc123".to_string());
        assert!(authorize_admin(&Some("abc123".to_string()), false, &minted));
    }

    #[test]
    fn mismatched_secret_is_rejected() {
        let minted = Some("abc123".to_string());
        assert!(!authorize_admin(&Some("wrong".to_string()), false, &minted));
    }

    #[test]
    fn no_secret_presented_before_any_game_started_is_rejected() {
        assert!(!authorize_admin(&None, false, &None));
    }
}
