//! Socket writer task.
//!
//! Every outbound frame of an attempt (heartbeat, identify, resume, close)
//! goes through one task that owns the write half of the socket.

use std::fmt::Display;

use futures::{Sink, SinkExt};
use tether_proto::GatewayCommand;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::drain::{DrainReason, DrainSignal};

/// Capacity of the per-attempt outbound queue.
pub const OUTBOUND_BUFFER: usize = 32;

/// A frame queued for the writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Serialize and send a gateway command.
    Command(GatewayCommand),
    /// Start the close handshake with a normal close code.
    Close,
}

/// Spawn the writer task for one attempt.
///
/// A failed write fires the drain signal and ends the task. The task also
/// ends when `cancel` fires, even mid-write, or every sender is dropped.
pub fn spawn_writer<S>(
    mut sink: S,
    mut rx: mpsc::Receiver<Outbound>,
    drain: DrainSignal,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display,
{
    tokio::spawn(async move {
        loop {
            let outbound = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                outbound = rx.recv() => match outbound {
                    Some(outbound) => outbound,
                    None => break,
                },
            };

            let message = match outbound {
                Outbound::Command(command) => match command.to_json() {
                    Ok(json) => {
                        debug!(op = %command.opcode(), "sending frame");
                        Message::Text(json.into())
                    }
                    Err(e) => {
                        warn!(op = %command.opcode(), error = %e, "failed to encode command");
                        continue;
                    }
                },
                Outbound::Close => {
                    debug!("sending close frame");
                    Message::Close(Some(CloseFrame {
                        code: CloseCode::Normal,
                        reason: "".into(),
                    }))
                }
            };

            let written = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                written = sink.send(message) => written,
            };
            if let Err(e) = written {
                warn!(error = %e, "gateway write failed");
                drain.trigger(DrainReason::WriteFailed);
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use futures::StreamExt;

    #[tokio::test]
    async fn test_writes_commands_in_order() {
        let (sink, mut written) = futures::channel::mpsc::unbounded::<Message>();
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        let drain = DrainSignal::new();
        let cancel = CancellationToken::new();
        let task = spawn_writer(sink, rx, drain.clone(), cancel.clone());

        tx.send(Outbound::Command(GatewayCommand::Heartbeat(None)))
            .await
            .unwrap();
        tx.send(Outbound::Command(GatewayCommand::Heartbeat(Some(7))))
            .await
            .unwrap();
        tx.send(Outbound::Close).await.unwrap();

        let first = written.next().await.unwrap();
        assert_eq!(first.to_text().unwrap(), r#"{"op":1,"d":null}"#);
        let second = written.next().await.unwrap();
        assert_eq!(second.to_text().unwrap(), r#"{"op":1,"d":7}"#);
        match written.next().await.unwrap() {
            Message::Close(Some(frame)) => assert_eq!(frame.code, CloseCode::Normal),
            other => panic!("expected close frame, got {other:?}"),
        }

        cancel.cancel();
        task.await.unwrap();
        assert!(!drain.is_fired());
    }

    #[tokio::test]
    async fn test_write_failure_fires_drain() {
        let (sink, written) = futures::channel::mpsc::unbounded::<Message>();
        drop(written);

        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        let drain = DrainSignal::new();
        let task = spawn_writer(sink, rx, drain.clone(), CancellationToken::new());

        tx.send(Outbound::Command(GatewayCommand::Heartbeat(Some(1))))
            .await
            .unwrap();
        task.await.unwrap();

        assert_eq!(drain.reason(), Some(DrainReason::WriteFailed));
    }

    #[tokio::test]
    async fn test_stops_when_senders_dropped() {
        let (sink, _written) = futures::channel::mpsc::unbounded::<Message>();
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        let task = spawn_writer(sink, rx, DrainSignal::new(), CancellationToken::new());

        drop(tx);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_interrupts_stalled_write() {
        // Bounded sink that nobody reads: the second frame never gets a slot.
        let (sink, _unread) = futures::channel::mpsc::channel::<Message>(0);
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        let drain = DrainSignal::new();
        let cancel = CancellationToken::new();
        let task = spawn_writer(sink, rx, drain.clone(), cancel.clone());

        tx.send(Outbound::Command(GatewayCommand::Heartbeat(None)))
            .await
            .unwrap();
        tx.send(Outbound::Close).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("writer kept waiting on the socket after cancel")
            .unwrap();
        assert!(!drain.is_fired());
    }
}
