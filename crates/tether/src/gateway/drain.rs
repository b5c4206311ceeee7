//! Per-attempt drain signal.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Close code: the resume carried an invalid sequence.
pub const CLOSE_INVALID_SEQUENCE: u16 = 4007;
/// Close code: the session timed out.
pub const CLOSE_SESSION_TIMED_OUT: u16 = 4009;

/// Why an attempt is being torn down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainReason {
    /// Reading from the socket failed or the stream ended.
    ReadError(String),
    /// The server sent a close frame.
    ServerClosed(Option<u16>),
    /// The server asked for a reconnect (op 7).
    ReconnectRequested,
    /// Writing to the socket failed.
    WriteFailed,
    /// A frame was not a valid envelope.
    MalformedEnvelope,
    /// Local shutdown.
    LocalInterrupt,
}

impl DrainReason {
    /// Whether the session can no longer be resumed.
    #[must_use]
    pub const fn invalidates_session(&self) -> bool {
        matches!(
            self,
            Self::ServerClosed(Some(CLOSE_INVALID_SEQUENCE | CLOSE_SESSION_TIMED_OUT))
        )
    }
}

impl fmt::Display for DrainReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadError(e) => write!(f, "read error: {e}"),
            Self::ServerClosed(Some(code)) => write!(f, "server closed with code {code}"),
            Self::ServerClosed(None) => write!(f, "server closed"),
            Self::ReconnectRequested => write!(f, "reconnect requested"),
            Self::WriteFailed => write!(f, "write failed"),
            Self::MalformedEnvelope => write!(f, "malformed envelope"),
            Self::LocalInterrupt => write!(f, "local interrupt"),
        }
    }
}

/// One-shot signal shared by the tasks of a single connection attempt.
///
/// The first [`trigger`](Self::trigger) wins; later reasons are logged and
/// discarded.
#[derive(Debug, Clone, Default)]
pub struct DrainSignal {
    reason: Arc<Mutex<Option<DrainReason>>>,
    fired: CancellationToken,
}

impl DrainSignal {
    /// Create an unfired signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal. Returns `true` if this call fired it.
    pub fn trigger(&self, reason: DrainReason) -> bool {
        let mut slot = self.reason.lock();
        if let Some(first) = slot.as_ref() {
            tracing::debug!(first = %first, ignored = %reason, "attempt already draining");
            return false;
        }
        tracing::debug!(reason = %reason, "drain triggered");
        *slot = Some(reason);
        drop(slot);
        self.fired.cancel();
        true
    }

    /// Whether the signal has fired.
    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.fired.is_cancelled()
    }

    /// The honored reason, if fired.
    #[must_use]
    pub fn reason(&self) -> Option<DrainReason> {
        self.reason.lock().clone()
    }

    /// Wait until the signal fires and return the honored reason.
    pub async fn fired(&self) -> DrainReason {
        self.fired.cancelled().await;
        self.reason()
            .unwrap_or_else(|| DrainReason::ReadError("drain reason missing".to_string()))
    }
}
