//! Gateway connection management.
//!
//! [`GatewaySupervisor`] owns the socket lifetime. Each connection attempt
//! runs three tasks sharing one [`DrainSignal`] and one cancellation token:
//! the read loop feeding the [`Router`], the writer, and the heartbeat
//! scheduler started on hello. Session id and sequence number live in
//! [`SessionState`] and [`SequenceTracker`] and survive reconnects.

mod backoff;
mod drain;
mod heartbeat;
mod router;
mod sequence;
mod session;
mod state;
mod supervisor;
mod writer;

pub use backoff::{dial_with_backoff, DialBackoff};
pub use drain::{DrainReason, DrainSignal, CLOSE_INVALID_SEQUENCE, CLOSE_SESSION_TIMED_OUT};
pub use heartbeat::{first_beat_delay, start_heartbeat, HeartbeatHandle, HeartbeatTrigger};
pub use router::{spawn_reader, Router};
pub use sequence::SequenceTracker;
pub use session::{GatewayIdentity, SessionState};
pub use state::{AtomicConnectionState, ConnectionState};
pub use supervisor::{GatewaySupervisor, DEFAULT_CLOSE_TIMEOUT};
pub use writer::{spawn_writer, Outbound, OUTBOUND_BUFFER};
