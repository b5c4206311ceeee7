//! Session identity kept across reconnects.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tether_proto::ConnectionProperties;

/// Shared handle to the session id assigned by `READY`.
///
/// A stored id means the next attempt after a drop resumes instead of
/// identifying.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    id: Arc<RwLock<Option<String>>>,
}

impl SessionState {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the session id.
    pub fn set(&self, session_id: impl Into<String>) {
        *self.id.write() = Some(session_id.into());
    }

    /// Current session id.
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.id.read().clone()
    }

    /// Drop the session so the next attempt identifies.
    pub fn invalidate(&self) {
        if self.id.write().take().is_some() {
            tracing::info!("session invalidated");
        }
    }
}

/// What the client presents when identifying or resuming.
#[derive(Clone)]
pub struct GatewayIdentity {
    /// Bot token.
    pub token: String,
    /// Intents bitfield sent with identify.
    pub intents: u64,
    /// Client properties sent with identify.
    pub properties: ConnectionProperties,
}

impl GatewayIdentity {
    /// Identity with default properties and no intents.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            intents: 0,
            properties: ConnectionProperties::default(),
        }
    }
}

impl fmt::Debug for GatewayIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayIdentity")
            .field("token", &"<redacted>")
            .field("intents", &self.intents)
            .field("properties", &self.properties)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let session = SessionState::new();
        assert!(session.get().is_none());

        session.set("abc123");
        assert_eq!(session.get().as_deref(), Some("abc123"));

        session.set("def456");
        assert_eq!(session.get().as_deref(), Some("def456"));

        session.invalidate();
        assert!(session.get().is_none());
    }

    #[test]
    fn test_clones_share_session() {
        let session = SessionState::new();
        session.clone().set("shared");
        assert_eq!(session.get().as_deref(), Some("shared"));
    }

    #[test]
    fn test_identity_debug_redacts_token() {
        let identity = GatewayIdentity::new("super-secret");
        let debug = format!("{identity:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
