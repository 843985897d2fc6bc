//! Internal error type for the engine. Every command handler returns
//! `Result<_, EngineError>`; the Connection Layer maps this straight onto
//! a [`protocol::ApiError`] and never lets it propagate as a panic.

use protocol::ErrorCode;

#[derive(Debug, Clone)]
pub struct EngineError {
    pub code: ErrorCode,
    pub message: String,
}

impl EngineError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for EngineError {}

impl From<EngineError> for protocol::ApiError {
    fn from(value: EngineError) -> Self {
        protocol::ApiError::new(value.code, value.message)
    }
}

macro_rules! engine_error {
    ($code:ident, $($arg:tt)*) => {
        $crate::error::EngineError::new(protocol::ErrorCode::$code, format!($($arg)*))
    };
}

pub(crate) use engine_error;
