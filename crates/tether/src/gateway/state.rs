//! Connection state types.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// State of the gateway connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Supervisor not started yet.
    Disconnected,
    /// Dialing the gateway.
    Connecting,
    /// Hello received, identify sent, waiting for `READY`.
    Identifying,
    /// Hello received, resume sent, waiting for `RESUMED`.
    Resuming,
    /// Session live; read loop and heartbeat running.
    Established,
    /// Tearing down the current socket.
    Draining,
    /// Stopped after a local interrupt.
    Stopped,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Identifying => "identifying",
            Self::Resuming => "resuming",
            Self::Established => "established",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        };
        write!(f, "{name}")
    }
}

/// Atomic wrapper for connection state.
#[derive(Debug)]
pub struct AtomicConnectionState(AtomicU8);

impl AtomicConnectionState {
    /// Create a new atomic state.
    #[must_use]
    pub const fn new(state: ConnectionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    /// Load the current state.
    #[must_use]
    pub fn load(&self) -> ConnectionState {
        match self.0.load(Ordering::SeqCst) {
            0 => ConnectionState::Disconnected,
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Identifying,
            3 => ConnectionState::Resuming,
            4 => ConnectionState::Established,
            5 => ConnectionState::Draining,
            _ => ConnectionState::Stopped,
        }
    }

    /// Store a new state, logging the transition.
    pub fn store(&self, state: ConnectionState) {
        let previous = self.0.swap(state as u8, Ordering::SeqCst);
        if previous != state as u8 {
            tracing::debug!(state = %state, "connection state changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_enum() {
        assert_eq!(ConnectionState::Disconnected as u8, 0);
        assert_eq!(ConnectionState::Connecting as u8, 1);
        assert_eq!(ConnectionState::Identifying as u8, 2);
        assert_eq!(ConnectionState::Resuming as u8, 3);
        assert_eq!(ConnectionState::Established as u8, 4);
        assert_eq!(ConnectionState::Draining as u8, 5);
        assert_eq!(ConnectionState::Stopped as u8, 6);
    }

    #[test]
    fn test_atomic_connection_state() {
        let state = AtomicConnectionState::new(ConnectionState::Disconnected);
        assert_eq!(state.load(), ConnectionState::Disconnected);

        for next in [
            ConnectionState::Connecting,
            ConnectionState::Resuming,
            ConnectionState::Established,
            ConnectionState::Draining,
            ConnectionState::Stopped,
        ] {
            state.store(next);
            assert_eq!(state.load(), next);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionState::Established.to_string(), "established");
    }
}
