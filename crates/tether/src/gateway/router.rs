//! Envelope routing and the per-attempt read loop.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tether_proto::{
    DispatchEvent, GatewayCommand, GatewayPayload, Identify, Interaction, OpCode, ProtoError,
    RawEnvelope, Resume,
};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::drain::{DrainReason, DrainSignal};
use super::heartbeat::{start_heartbeat, HeartbeatHandle};
use super::sequence::SequenceTracker;
use super::session::{GatewayIdentity, SessionState};
use super::state::{AtomicConnectionState, ConnectionState};
use super::writer::Outbound;

/// Routes decoded envelopes for one connection attempt.
#[derive(Debug)]
pub struct Router {
    identity: Arc<GatewayIdentity>,
    sequence: SequenceTracker,
    session: SessionState,
    state: Arc<AtomicConnectionState>,
    is_resume: bool,
    outbound: mpsc::Sender<Outbound>,
    interactions: Option<mpsc::Sender<Interaction>>,
    drain: DrainSignal,
    cancel: CancellationToken,
    heartbeat: Option<HeartbeatHandle>,
}

impl Router {
    /// Create a router for one attempt.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        identity: Arc<GatewayIdentity>,
        sequence: SequenceTracker,
        session: SessionState,
        state: Arc<AtomicConnectionState>,
        is_resume: bool,
        outbound: mpsc::Sender<Outbound>,
        drain: DrainSignal,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            identity,
            sequence,
            session,
            state,
            is_resume,
            outbound,
            interactions: None,
            drain,
            cancel,
            heartbeat: None,
        }
    }

    /// Forward `INTERACTION_CREATE` payloads to `tx`.
    #[must_use]
    pub fn with_interaction_handler(mut self, tx: Option<mpsc::Sender<Interaction>>) -> Self {
        self.interactions = tx;
        self
    }

    /// Whether the heartbeat task has been started.
    #[must_use]
    pub fn heartbeat_running(&self) -> bool {
        self.heartbeat.is_some()
    }

    /// Route one text frame.
    ///
    /// Returns a drain reason when the attempt must end.
    pub async fn route(&mut self, text: &str) -> Option<DrainReason> {
        let envelope = match RawEnvelope::from_json(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "malformed envelope");
                return Some(DrainReason::MalformedEnvelope);
            }
        };

        let op = envelope.op;
        let sequence = envelope.s;

        let outcome = match envelope.into_payload() {
            Ok(payload) => self.handle(payload).await,
            Err(ProtoError::UnknownOpCode(code)) => {
                debug!(op = code, "ignoring unknown op");
                None
            }
            Err(e) => {
                warn!(op, error = %e, "ignoring unexpected payload");
                None
            }
        };

        if op == OpCode::Dispatch.code() {
            if let Some(s) = sequence {
                self.sequence.set(s);
            }
        }

        outcome
    }

    async fn handle(&mut self, payload: GatewayPayload) -> Option<DrainReason> {
        match payload {
            GatewayPayload::Hello(hello) => {
                self.on_hello(Duration::from_millis(hello.heartbeat_interval))
                    .await
            }
            GatewayPayload::Dispatch(dispatch) => {
                self.on_dispatch(dispatch.event);
                None
            }
            GatewayPayload::HeartbeatRequest => {
                if let Some(heartbeat) = &self.heartbeat {
                    heartbeat.trigger().beat_now();
                    None
                } else {
                    debug!("heartbeat requested before hello");
                    self.send(GatewayCommand::Heartbeat(self.sequence.get()))
                        .await
                }
            }
            GatewayPayload::HeartbeatAck => {
                debug!("heartbeat acknowledged");
                None
            }
            GatewayPayload::ReconnectRequest => {
                info!("server requested reconnect");
                Some(DrainReason::ReconnectRequested)
            }
        }
    }

    async fn on_hello(&mut self, interval: Duration) -> Option<DrainReason> {
        if self.heartbeat.is_some() {
            warn!("ignoring repeated hello");
            return None;
        }
        if interval.is_zero() {
            warn!("ignoring hello with zero heartbeat interval");
            return None;
        }

        info!(interval_ms = interval.as_millis() as u64, "received hello");
        self.heartbeat = Some(start_heartbeat(
            interval,
            self.sequence.clone(),
            self.outbound.clone(),
            self.drain.clone(),
            self.cancel.clone(),
        ));

        let command = match self.session.get().filter(|_| self.is_resume) {
            Some(session_id) => {
                let seq = self.sequence.get();
                info!(session_id = %session_id, seq, "resuming session");
                self.state.store(ConnectionState::Resuming);
                GatewayCommand::Resume(Resume {
                    token: self.identity.token.clone(),
                    session_id,
                    seq,
                })
            }
            None => {
                info!("identifying");
                self.state.store(ConnectionState::Identifying);
                GatewayCommand::Identify {
                    identify: Identify {
                        token: self.identity.token.clone(),
                        properties: self.identity.properties.clone(),
                    },
                    intents: self.identity.intents,
                }
            }
        };

        self.send(command).await
    }

    fn on_dispatch(&self, event: DispatchEvent) {
        match event {
            DispatchEvent::Ready(ready) => {
                info!(session_id = %ready.session_id, "session ready");
                self.session.set(ready.session_id);
                self.state.store(ConnectionState::Established);
            }
            DispatchEvent::Resumed => {
                info!("session resumed");
                self.state.store(ConnectionState::Established);
            }
            DispatchEvent::InteractionCreate(interaction) => self.forward(*interaction),
            DispatchEvent::Other { name, .. } => debug!(event = %name, "unhandled dispatch"),
        }
    }

    fn forward(&self, interaction: Interaction) {
        let Some(tx) = &self.interactions else {
            debug!(interaction_id = %interaction.id, "no interaction handler installed");
            return;
        };
        match tx.try_send(interaction) {
            Ok(()) => {}
            Err(TrySendError::Full(interaction)) => {
                warn!(interaction_id = %interaction.id, "interaction queue full, dropping");
            }
            Err(TrySendError::Closed(interaction)) => {
                warn!(interaction_id = %interaction.id, "interaction handler gone, dropping");
            }
        }
    }

    async fn send(&self, command: GatewayCommand) -> Option<DrainReason> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => None,
            sent = self.outbound.send(Outbound::Command(command)) => {
                sent.is_err().then_some(DrainReason::WriteFailed)
            }
        }
    }

    /// Wait for the heartbeat task, if one was started.
    pub async fn join_heartbeat(self) {
        if let Some(heartbeat) = self.heartbeat {
            heartbeat.join().await;
        }
    }
}

/// Spawn the read loop for one attempt.
///
/// The loop feeds text frames to `router` until the stream ends, a frame
/// asks for a drain, or `cancel` fires. The router is handed back so the
/// caller can join its heartbeat task.
pub fn spawn_reader<S, E>(
    mut stream: S,
    mut router: Router,
    drain: DrainSignal,
    cancel: CancellationToken,
) -> JoinHandle<Router>
where
    S: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: Display + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                frame = stream.next() => frame,
            };

            match frame {
                Some(Ok(Message::Text(text))) => {
                    if let Some(reason) = router.route(&text).await {
                        drain.trigger(reason);
                        break;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    let code = frame.map(|f| u16::from(f.code));
                    info!(code, "server closed connection");
                    drain.trigger(DrainReason::ServerClosed(code));
                }
                Some(Ok(Message::Binary(_))) => debug!("ignoring binary frame"),
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "gateway read failed");
                    drain.trigger(DrainReason::ReadError(e.to_string()));
                    break;
                }
                None => {
                    drain.trigger(DrainReason::ReadError("stream ended".to_string()));
                    break;
                }
            }
        }
        router
    })
}
