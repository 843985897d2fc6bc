//! The closed set of error codes a client can receive, plus the envelope
//! they travel in. Unknown inbound commands get [`ErrorCode::UnknownCommand`]
//! rather than a dropped connection.

use serde::{Deserialize, Serialize};

/// Every error a command can fail with, per the event catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidName,
    DuplicateNameResolved,
    SessionUnknown,
    NoActiveRound,
    AlreadySubmitted,
    LateSubmission,
    YearOutOfRange,
    NotAdmin,
    PlaylistEmpty,
    PoolExhausted,
    PlaybackFailed,
    UnknownCommand,
    RateLimited,
    QueueOverflow,
    GameEnded,
}

/// The `error` event payload sent to the originating client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
