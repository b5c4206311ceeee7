//! Gateway operation codes.

use std::fmt;

use crate::error::ProtoError;

/// Operation code carried in the `op` field of every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Server → client application event with a sequence number.
    Dispatch = 0,
    /// Heartbeat. Sent by the client; a server-sent one requests an immediate heartbeat.
    Heartbeat = 1,
    /// Client → server fresh session handshake.
    Identify = 2,
    /// Client → server session resume handshake.
    Resume = 6,
    /// Server asks the client to reconnect and resume.
    Reconnect = 7,
    /// First frame on a new socket, carries the heartbeat interval.
    Hello = 10,
    /// Server acknowledges a heartbeat.
    HeartbeatAck = 11,
}

impl OpCode {
    /// The numeric wire value.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for OpCode {
    type Error = ProtoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Dispatch),
            1 => Ok(Self::Heartbeat),
            2 => Ok(Self::Identify),
            6 => Ok(Self::Resume),
            7 => Ok(Self::Reconnect),
            10 => Ok(Self::Hello),
            11 => Ok(Self::HeartbeatAck),
            other => Err(ProtoError::UnknownOpCode(other)),
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dispatch => "dispatch",
            Self::Heartbeat => "heartbeat",
            Self::Identify => "identify",
            Self::Resume => "resume",
            Self::Reconnect => "reconnect",
            Self::Hello => "hello",
            Self::HeartbeatAck => "heartbeat_ack",
        };
        write!(f, "{name}")
    }
}
