//! Wire protocol shared between the game server and its clients.
//!
//! Everything here is transport-agnostic JSON: commands arrive from a
//! player or admin client wrapped as `{ "type": ..., "data": ... }`, and
//! events are pushed to clients wrapped in a [`EventEnvelope`]. Keeping the
//! command and event sets closed (one variant per kind, one payload shape
//! each) means an unrecognized message is a structured error, never a
//! crash.

mod command;
mod error;
mod event;
mod model;

pub use command::{ClientCommand, GameConfigOverrides};
pub use error::{ApiError, ErrorCode};
pub use event::{
    BetPlacedData, EventEnvelope, EventPayload, GameResetData, GuessSubmittedData,
    PlayerJoinedData, PlayerReconnectedData, ReconnectSnapshot, RoundEndedData, RoundStartedData,
};
pub use model::{LeaderboardEntry, PlayerSummary, RoundResultEntry, RoundSummary, SongSummary};

/// Name every server-pushed message is wrapped under, per the event
/// catalog's `type` field (distinct from `event_type`, which names the
/// specific event).
pub const EVENT_MESSAGE_TYPE: &str = "beatsy/event";
