//! C5: the contract between the engine and whatever music service the
//! host platform actually integrates. This crate only ships the trait
//! and an in-memory stand-in used by tests and standalone runs; a real
//! binding is an external collaborator per the Non-goals.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{EngineError, engine_error};
use crate::state::Song;

/// An output device enumerated by the adapter.
#[derive(Debug, Clone)]
pub struct PlaybackTarget {
    pub id: String,
    pub friendly_name: String,
    pub state: String,
}

/// Post-play enrichment for metadata the playlist record omits.
#[derive(Debug, Clone)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub cover_reference: Option<String>,
}

/// Opaque, adapter-defined snapshot used to restore a playback target's
/// pre-game state. The engine never inspects its contents.
#[derive(Debug, Clone)]
pub struct PlaybackStateToken(pub Vec<u8>);

/// The result of loading a playlist: the year-filtered song pool plus how
/// many tracks were skipped for lacking a year.
pub struct LoadedPlaylist {
    pub songs: Vec<Song>,
    pub skipped_count: u32,
}

/// Calls must return within roughly 2s; implementations that cannot
/// guarantee this should enforce it internally (e.g. with
/// `tokio::time::timeout`) and map a timeout to
/// [`protocol::ErrorCode::PlaybackFailed`].
pub const PLAYBACK_CALL_TIMEOUT: Duration = Duration::from_secs(2);

#[async_trait]
pub trait PlaybackAdapter: Send + Sync {
    async fn list_playback_targets(&self) -> Result<Vec<PlaybackTarget>, EngineError>;

    /// Returns the full, filtered track list for `playlist_id`, paginating
    /// internally as needed.
    async fn load_playlist(&self, playlist_id: &str) -> Result<LoadedPlaylist, EngineError>;

    async fn play(&self, target_id: &str, song_id: &str) -> Result<(), EngineError>;

    async fn current_metadata(&self, target_id: &str) -> Result<TrackMetadata, EngineError>;

    async fn snapshot_state(&self, target_id: &str) -> Result<PlaybackStateToken, EngineError>;

    async fn restore_state(
        &self,
        target_id: &str,
        token: PlaybackStateToken,
    ) -> Result<(), EngineError>;
}

/// In-memory fixture adapter: one playlist, always succeeds. Useful for
/// tests and for running the engine without a real music-service binding.
pub struct NullPlaybackAdapter {
    playlists: HashMap<String, Vec<Song>>,
}

impl NullPlaybackAdapter {
    pub fn new() -> Self {
        Self {
            playlists: HashMap::new(),
        }
    }

    pub fn with_playlist(mut self, playlist_id: impl Into<String>, songs: Vec<Song>) -> Self {
        self.playlists.insert(playlist_id.into(), songs);
        self
    }
}

impl Default for NullPlaybackAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaybackAdapter for NullPlaybackAdapter {
    async fn list_playback_targets(&self) -> Result<Vec<PlaybackTarget>, EngineError> {
        Ok(vec![PlaybackTarget {
            id: "local".into(),
            friendly_name: "Local speaker".into(),
            state: "idle".into(),
        }])
    }

    async fn load_playlist(&self, playlist_id: &str) -> Result<LoadedPlaylist, EngineError> {
        let songs = self.playlists.get(playlist_id).cloned().unwrap_or_default();
        Ok(LoadedPlaylist {
            songs,
            skipped_count: 0,
        })
    }

    async fn play(&self, _target_id: &str, song_id: &str) -> Result<(), EngineError> {
        let known = self
            .playlists
            .values()
            .any(|songs| songs.iter().any(|s| s.id == song_id));
        if known {
            Ok(())
        } else {
            Err(engine_error!(PlaybackFailed, "unknown song id {song_id}"))
        }
    }

    async fn current_metadata(&self, _target_id: &str) -> Result<TrackMetadata, EngineError> {
        Ok(TrackMetadata {
            title: "Unknown".into(),
            artist: "Unknown".into(),
            album: None,
            cover_reference: None,
        })
    }

    async fn snapshot_state(&self, _target_id: &str) -> Result<PlaybackStateToken, EngineError> {
        Ok(PlaybackStateToken(Vec::new()))
    }

    async fn restore_state(
        &self,
        _target_id: &str,
        _token: PlaybackStateToken,
    ) -> Result<(), EngineError> {
        Ok(())
    }
}
