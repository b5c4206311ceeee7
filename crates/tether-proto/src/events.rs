//! Dispatch event payloads, selected by the envelope's event name.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtoError;
use crate::interaction::Interaction;

/// Event name of the dispatch that completes an identify.
pub const READY: &str = "READY";
/// Event name of the dispatch that completes a resume.
pub const RESUMED: &str = "RESUMED";
/// Event name of an application command invocation.
pub const INTERACTION_CREATE: &str = "INTERACTION_CREATE";

/// Payload of the `READY` dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ready {
    /// Session identifier to use for later resumes.
    pub session_id: String,
    /// Gateway URL the server prefers for resumes, when it sends one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_gateway_url: Option<String>,
}

/// Application events carried by dispatch frames.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchEvent {
    /// A fresh session was established.
    Ready(Ready),
    /// A resume completed and missed events were replayed.
    Resumed,
    /// A user invoked an application command.
    InteractionCreate(Box<Interaction>),
    /// Any event this client does not act on.
    Other {
        /// Event name.
        name: String,
        /// Raw event payload.
        data: Value,
    },
}

impl DispatchEvent {
    /// Decode the payload of a dispatch named `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if a known event has an unexpected payload shape.
    pub fn decode(name: &str, data: Value) -> Result<Self, ProtoError> {
        match name {
            READY => serde_json::from_value(data)
                .map(Self::Ready)
                .map_err(|e| ProtoError::Decoding(format!("{READY}: {e}"))),
            RESUMED => Ok(Self::Resumed),
            INTERACTION_CREATE => serde_json::from_value(data)
                .map(|interaction| Self::InteractionCreate(Box::new(interaction)))
                .map_err(|e| ProtoError::Decoding(format!("{INTERACTION_CREATE}: {e}"))),
            _ => Ok(Self::Other {
                name: name.to_string(),
                data,
            }),
        }
    }

    /// The wire name of this event.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Ready(_) => READY,
            Self::Resumed => RESUMED,
            Self::InteractionCreate(_) => INTERACTION_CREATE,
            Self::Other { name, .. } => name,
        }
    }
}
