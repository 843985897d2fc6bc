//! Server-side game engine for a real-time, round-based party game.
//!
//! Five collaborating pieces, built bottom-up:
//!
//! - [`playback`] — the [`playback::PlaybackAdapter`] trait the engine uses
//!   to drive whatever music service the host platform integrates.
//! - [`scoring`] and [`round_engine`] — song selection, the round timer,
//!   and the proximity scoring formula.
//! - [`broadcast_hub`] — the client registry and per-connection fanout.
//! - [`coordinator`] — the single-writer actor that owns [`state::GameState`]
//!   and is the only thing in the crate allowed to mutate it.
//!
//! Everything outside this crate talks to the game through
//! [`coordinator::GameCoordinatorHandle`] and observes it through events
//! pushed by the [`broadcast_hub::BroadcastHub`]; nothing else is public
//! API surface.

mod broadcast_hub;
mod commands;
mod config;
mod coordinator;
mod error;
mod playback;
mod round_engine;
mod scoring;
mod state;

pub use broadcast_hub::{BroadcastHub, ConnectionId, OUTBOUND_QUEUE_CAPACITY};
pub use commands::{Command, JoinOutcome, ReconnectOutcome, StartGameOutcome};
pub use config::GameConfig;
pub use coordinator::{GameCoordinator, GameCoordinatorHandle, COMMAND_QUEUE_CAPACITY};
pub use error::EngineError;
pub use playback::{
    LoadedPlaylist, NullPlaybackAdapter, PlaybackAdapter, PlaybackStateToken, PlaybackTarget,
    TrackMetadata, PLAYBACK_CALL_TIMEOUT,
};
pub use state::{GameStatus, Player, Round, RoundStatus, Song};
