//! Error types for tether.

use thiserror::Error;

/// Errors that can occur in bot operations.
#[derive(Debug, Error)]
pub enum BotError {
    /// Gateway connection failed.
    #[error("gateway connection failed: {0}")]
    GatewayConnection(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// REST request failed or returned a non-success status.
    #[error("rest request failed: {0}")]
    Rest(String),

    /// A command invocation could not be answered.
    #[error("command failed: {0}")]
    Command(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] tether_proto::ProtoError),
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        Self::Rest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_connection_error_display() {
        let err = BotError::GatewayConnection("connection refused".to_string());
        assert_eq!(
            err.to_string(),
            "gateway connection failed: connection refused"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = BotError::Config("invalid api_base".to_string());
        assert_eq!(err.to_string(), "configuration error: invalid api_base");
    }

    #[test]
    fn test_rest_error_display() {
        let err = BotError::Rest("401 Unauthorized".to_string());
        assert_eq!(err.to_string(), "rest request failed: 401 Unauthorized");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BotError = io_err.into();
        assert!(err.to_string().contains("io error"));
    }

    #[test]
    fn test_protocol_error_conversion() {
        let err: BotError = tether_proto::ProtoError::UnknownOpCode(9).into();
        assert_eq!(err.to_string(), "protocol error: unknown operation code: 9");
    }
}
