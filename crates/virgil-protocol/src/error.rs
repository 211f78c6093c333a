//! Protocol error types.

use thiserror::Error;
use virgil_core::CodecError;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors from the text/byte entry points of the codec.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The payload parsed as JSON but violated the message schema.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The payload was not valid JSON at all.
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}
