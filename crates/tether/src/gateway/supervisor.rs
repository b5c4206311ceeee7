//! Connection supervisor: one socket at a time, reconnect on drop.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tether_proto::Interaction;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::backoff::{dial_with_backoff, DialBackoff};
use super::drain::{DrainReason, DrainSignal};
use super::router::{spawn_reader, Router};
use super::sequence::SequenceTracker;
use super::session::{GatewayIdentity, SessionState};
use super::state::{AtomicConnectionState, ConnectionState};
use super::writer::{spawn_writer, Outbound, OUTBOUND_BUFFER};
use crate::error::BotError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default bounded wait for the server's close acknowledgement.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_millis(1000);

/// How long a cancelled attempt task may take to exit before it is aborted.
const JOIN_GRACE: Duration = Duration::from_secs(1);

/// Keeps one gateway session alive across socket drops.
///
/// Session id and sequence outlive individual attempts, so a drop with a
/// live session resumes instead of identifying again.
#[derive(Debug)]
pub struct GatewaySupervisor {
    url: String,
    identity: Arc<GatewayIdentity>,
    backoff: DialBackoff,
    close_timeout: Duration,
    sequence: SequenceTracker,
    session: SessionState,
    state: Arc<AtomicConnectionState>,
    interactions: Option<mpsc::Sender<Interaction>>,
}

impl GatewaySupervisor {
    /// Create a supervisor for the given gateway URL.
    #[must_use]
    pub fn new(url: impl Into<String>, identity: GatewayIdentity) -> Self {
        Self {
            url: url.into(),
            identity: Arc::new(identity),
            backoff: DialBackoff::default(),
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            sequence: SequenceTracker::new(),
            session: SessionState::new(),
            state: Arc::new(AtomicConnectionState::new(ConnectionState::Disconnected)),
            interactions: None,
        }
    }

    /// Set the dial retry policy.
    #[must_use]
    pub fn with_dial_backoff(mut self, backoff: DialBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set how long a local interrupt waits for the close acknowledgement.
    #[must_use]
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Forward interactions to the given channel.
    ///
    /// The supervisor never waits on this channel; when it is full the
    /// interaction is dropped with a warning.
    #[must_use]
    pub fn with_interaction_handler(mut self, tx: mpsc::Sender<Interaction>) -> Self {
        self.interactions = Some(tx);
        self
    }

    /// Gateway URL being dialed.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state.load()
    }

    /// Shared sequence tracker.
    #[must_use]
    pub fn sequence(&self) -> SequenceTracker {
        self.sequence.clone()
    }

    /// Shared session state.
    #[must_use]
    pub fn session(&self) -> SessionState {
        self.session.clone()
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// Drops and server reconnect requests are handled internally. Returns
    /// `Ok` after a graceful close, or an error if dialing gave up.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), BotError> {
        let mut reconnecting = false;

        loop {
            self.state.store(ConnectionState::Connecting);

            let ws = tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    self.state.store(ConnectionState::Stopped);
                    info!("shutdown before connect");
                    return Ok(());
                }
                ws = self.dial() => match ws {
                    Ok(ws) => ws,
                    Err(e) => {
                        self.state.store(ConnectionState::Stopped);
                        return Err(e);
                    }
                },
            };

            let is_resume = reconnecting && self.session.get().is_some();
            info!(url = %self.url, is_resume, "connected to gateway");

            match self.run_attempt(ws, is_resume, &shutdown).await {
                None => {
                    self.state.store(ConnectionState::Stopped);
                    info!("gateway connection stopped");
                    return Ok(());
                }
                Some(reason) => {
                    if reason.invalidates_session() {
                        self.session.invalidate();
                        self.sequence.clear();
                    }
                    info!(reason = %reason, "gateway connection dropped, reconnecting");
                    reconnecting = true;
                }
            }
        }
    }

    async fn dial(&self) -> Result<WsStream, BotError> {
        dial_with_backoff(
            &self.backoff,
            || async {
                connect_async(self.url.as_str())
                    .await
                    .map(|(ws, _response)| ws)
            },
            |attempt, e, delay| match delay {
                Some(delay) => warn!(
                    attempt,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "gateway dial failed"
                ),
                None => warn!(attempt, error = %e, "gateway dial failed, giving up"),
            },
        )
        .await
        .map_err(|e| BotError::GatewayConnection(e.to_string()))
    }

    /// Drive one socket. Returns the drain reason, or `None` after a local
    /// interrupt.
    async fn run_attempt(
        &self,
        ws: WsStream,
        is_resume: bool,
        shutdown: &CancellationToken,
    ) -> Option<DrainReason> {
        let (sink, stream) = ws.split();
        let drain = DrainSignal::new();
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);

        let writer = spawn_writer(sink, rx, drain.clone(), cancel.clone());
        let router = Router::new(
            Arc::clone(&self.identity),
            self.sequence.clone(),
            self.session.clone(),
            Arc::clone(&self.state),
            is_resume,
            tx.clone(),
            drain.clone(),
            cancel.clone(),
        )
        .with_interaction_handler(self.interactions.clone());
        let mut reader = spawn_reader(stream, router, drain.clone(), cancel.clone());

        let outcome = tokio::select! {
            reason = drain.fired() => Some(reason),
            () = shutdown.cancelled() => None,
        };
        self.state.store(ConnectionState::Draining);

        let reader_result = match outcome {
            Some(_) => None,
            None => {
                drain.trigger(DrainReason::LocalInterrupt);
                let graceful = async {
                    if tx.send(Outbound::Close).await.is_err() {
                        debug!("writer gone before close");
                    }
                    (&mut reader).await
                };
                match tokio::time::timeout(self.close_timeout, graceful).await {
                    Ok(result) => {
                        debug!("close acknowledged");
                        Some(result)
                    }
                    Err(_) => {
                        warn!(
                            timeout_ms = self.close_timeout.as_millis() as u64,
                            "no close acknowledgement, dropping socket"
                        );
                        None
                    }
                }
            }
        };
        cancel.cancel();
        drop(tx);

        let router = match reader_result {
            Some(result) => Some(result),
            None => join_bounded(reader, "read loop").await,
        };
        match router {
            Some(Ok(router)) => {
                if tokio::time::timeout(JOIN_GRACE, router.join_heartbeat())
                    .await
                    .is_err()
                {
                    warn!("heartbeat task did not stop in time");
                }
            }
            Some(Err(e)) => warn!(error = %e, "read loop panicked"),
            None => {}
        }
        if let Some(Err(e)) = join_bounded(writer, "writer").await {
            warn!(error = %e, "writer task panicked");
        }

        outcome
    }
}

/// Wait up to [`JOIN_GRACE`] for a cancelled task, aborting it after that.
async fn join_bounded<T>(
    mut handle: JoinHandle<T>,
    task: &'static str,
) -> Option<Result<T, JoinError>> {
    match tokio::time::timeout(JOIN_GRACE, &mut handle).await {
        Ok(result) => Some(result),
        Err(_) => {
            warn!(task, "task did not stop after cancel, aborting");
            handle.abort();
            None
        }
    }
}
