//! Outbound gateway commands.

use serde::{Deserialize, Serialize};

use crate::error::ProtoError;
use crate::opcode::OpCode;

/// Client description sent with identify.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionProperties {
    /// Operating system.
    pub os: String,
    /// Client library name.
    pub browser: String,
    /// Device name.
    pub device: String,
}

impl Default for ConnectionProperties {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            browser: "tether".to_string(),
            device: "tether".to_string(),
        }
    }
}

/// `d` payload of an identify frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identify {
    /// Bot token.
    pub token: String,
    /// Client description.
    pub properties: ConnectionProperties,
}

/// `d` payload of a resume frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resume {
    /// Bot token.
    pub token: String,
    /// Session to re-attach to.
    pub session_id: String,
    /// Last sequence number processed.
    pub seq: Option<u64>,
}

/// Frames the client sends to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCommand {
    /// Heartbeat carrying the last seen sequence, or `null` before the first dispatch.
    Heartbeat(Option<u64>),
    /// Fresh session handshake.
    Identify {
        /// Handshake payload.
        identify: Identify,
        /// Gateway intents bitfield. Serialized next to `op`, outside `d`.
        intents: u64,
    },
    /// Resume handshake.
    Resume(Resume),
}

#[derive(Serialize)]
struct Frame<'a, T: Serialize> {
    op: u8,
    d: &'a T,
    #[serde(skip_serializing_if = "Option::is_none")]
    intents: Option<u64>,
}

impl GatewayCommand {
    /// The operation code of this command.
    #[must_use]
    pub const fn opcode(&self) -> OpCode {
        match self {
            Self::Heartbeat(_) => OpCode::Heartbeat,
            Self::Identify { .. } => OpCode::Identify,
            Self::Resume(_) => OpCode::Resume,
        }
    }

    /// Serialize to a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        let op = self.opcode().code();
        let encoded = match self {
            Self::Heartbeat(seq) => serde_json::to_string(&Frame {
                op,
                d: seq,
                intents: None,
            }),
            Self::Identify { identify, intents } => serde_json::to_string(&Frame {
                op,
                d: identify,
                intents: Some(*intents),
            }),
            Self::Resume(resume) => serde_json::to_string(&Frame {
                op,
                d: resume,
                intents: None,
            }),
        };
        encoded.map_err(|e| ProtoError::Encoding(e.to_string()))
    }
}
