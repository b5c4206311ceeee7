//! Error types for the tether-proto crate.

use thiserror::Error;

/// Errors that can occur while encoding or decoding gateway frames.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Failed to encode a message.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Failed to decode a message.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// The operation code is not one this client understands.
    #[error("unknown operation code: {0}")]
    UnknownOpCode(u8),

    /// Missing required field.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}
