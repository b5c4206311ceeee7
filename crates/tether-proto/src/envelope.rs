//! Inbound envelope decoding.
//!
//! A frame is parsed exactly once into a [`RawEnvelope`]. The `d` payload is
//! only interpreted after the operation code has been looked at, through
//! [`RawEnvelope::into_payload`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtoError;
use crate::events::DispatchEvent;
use crate::opcode::OpCode;

/// The generic envelope shape shared by every gateway frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawEnvelope {
    /// Operation code.
    pub op: u8,
    /// Operation-specific payload.
    #[serde(default)]
    pub d: Value,
    /// Sequence number, present on dispatch frames only.
    #[serde(default)]
    pub s: Option<u64>,
    /// Event name, present on dispatch frames only.
    #[serde(default)]
    pub t: Option<String>,
}

/// Payload of a hello frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hello {
    /// Heartbeat cadence in milliseconds.
    pub heartbeat_interval: u64,
}

/// A decoded dispatch frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// Sequence number of this dispatch, if the server sent one.
    pub sequence: Option<u64>,
    /// The decoded application event.
    pub event: DispatchEvent,
}

/// Inbound frames, decoded by operation code.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayPayload {
    /// Connection greeting with the heartbeat interval.
    Hello(Hello),
    /// Application event.
    Dispatch(Dispatch),
    /// The server wants a heartbeat right now.
    HeartbeatRequest,
    /// The server acknowledged a heartbeat.
    HeartbeatAck,
    /// The server asks the client to reconnect and resume.
    ReconnectRequest,
}

impl RawEnvelope {
    /// Parse the outer envelope of a text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON object with a numeric `op`.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// The operation code, if it is one this client understands.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::UnknownOpCode`] for codes outside the known set.
    pub fn opcode(&self) -> Result<OpCode, ProtoError> {
        OpCode::try_from(self.op)
    }

    /// Decode the operation-specific payload.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown operation codes, for client-only codes
    /// (identify, resume) and for payloads that do not match the shape the
    /// operation requires.
    pub fn into_payload(self) -> Result<GatewayPayload, ProtoError> {
        match self.opcode()? {
            OpCode::Dispatch => {
                let name = self.t.ok_or(ProtoError::MissingField("t"))?;
                let event = DispatchEvent::decode(&name, self.d)?;
                Ok(GatewayPayload::Dispatch(Dispatch {
                    sequence: self.s,
                    event,
                }))
            }
            OpCode::Heartbeat => Ok(GatewayPayload::HeartbeatRequest),
            OpCode::Reconnect => Ok(GatewayPayload::ReconnectRequest),
            OpCode::Hello => {
                let hello: Hello = serde_json::from_value(self.d)
                    .map_err(|e| ProtoError::Decoding(format!("hello: {e}")))?;
                Ok(GatewayPayload::Hello(hello))
            }
            OpCode::HeartbeatAck => Ok(GatewayPayload::HeartbeatAck),
            op @ (OpCode::Identify | OpCode::Resume) => Err(ProtoError::Decoding(format!(
                "{op} is a client-only operation"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ready_dispatch() {
        let raw = RawEnvelope::from_json(
            r#"{"op":0,"t":"READY","s":1,"d":{"session_id":"abc123"}}"#,
        )
        .expect("parse");

        assert_eq!(raw.op, 0);
        assert_eq!(raw.s, Some(1));
        assert_eq!(raw.t.as_deref(), Some("READY"));

        match raw.into_payload().expect("decode") {
            GatewayPayload::Dispatch(Dispatch {
                sequence,
                event: DispatchEvent::Ready(ready),
            }) => {
                assert_eq!(sequence, Some(1));
                assert_eq!(ready.session_id, "abc123");
            }
            other => panic!("expected READY dispatch, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_hello() {
        let raw = RawEnvelope::from_json(r#"{"op":10,"d":{"heartbeat_interval":41250},"s":null,"t":null}"#)
            .expect("parse");
        assert_eq!(
            raw.into_payload().expect("decode"),
            GatewayPayload::Hello(Hello {
                heartbeat_interval: 41250
            })
        );
    }

    #[test]
    fn test_control_frames_without_payload() {
        let heartbeat = RawEnvelope::from_json(r#"{"op":1,"d":null}"#).expect("parse");
        assert_eq!(
            heartbeat.into_payload().expect("decode"),
            GatewayPayload::HeartbeatRequest
        );

        let ack = RawEnvelope::from_json(r#"{"op":11}"#).expect("parse");
        assert_eq!(ack.into_payload().expect("decode"), GatewayPayload::HeartbeatAck);

        let reconnect = RawEnvelope::from_json(r#"{"op":7,"d":null}"#).expect("parse");
        assert_eq!(
            reconnect.into_payload().expect("decode"),
            GatewayPayload::ReconnectRequest
        );
    }

    #[test]
    fn test_unknown_opcode_is_payload_error_not_parse_error() {
        let raw = RawEnvelope::from_json(r#"{"op":9,"d":false}"#).expect("outer parse succeeds");
        assert!(matches!(
            raw.into_payload(),
            Err(ProtoError::UnknownOpCode(9))
        ));
    }

    #[test]
    fn test_malformed_outer_envelope() {
        assert!(RawEnvelope::from_json("not json").is_err());
        assert!(RawEnvelope::from_json(r#"{"d":{}}"#).is_err());
        assert!(RawEnvelope::from_json(r#"{"op":"ten"}"#).is_err());
    }

    #[test]
    fn test_hello_without_interval() {
        let raw = RawEnvelope::from_json(r#"{"op":10,"d":{}}"#).expect("parse");
        assert!(matches!(raw.into_payload(), Err(ProtoError::Decoding(_))));
    }

    #[test]
    fn test_dispatch_without_event_name() {
        let raw = RawEnvelope::from_json(r#"{"op":0,"s":4,"d":{}}"#).expect("parse");
        assert!(matches!(
            raw.into_payload(),
            Err(ProtoError::MissingField("t"))
        ));
    }

    #[test]
    fn test_client_only_opcode_rejected() {
        let raw = RawEnvelope::from_json(r#"{"op":2,"d":{}}"#).expect("parse");
        assert!(raw.into_payload().is_err());
    }
}
