//! Heartbeat scheduler.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tether_proto::GatewayCommand;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::drain::{DrainReason, DrainSignal};
use super::sequence::SequenceTracker;
use super::writer::Outbound;

/// Longest cadence the scheduler honors. Longer server intervals are clamped.
pub const MAX_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Delay before the first heartbeat: uniform in `[0, interval)`.
#[must_use]
pub fn first_beat_delay<R: Rng + ?Sized>(interval: Duration, rng: &mut R) -> Duration {
    let delay = interval.mul_f64(rng.r#gen::<f64>());
    if delay >= interval {
        interval.saturating_sub(Duration::from_nanos(1))
    } else {
        delay
    }
}

/// Requests an out-of-band heartbeat without touching the cadence.
#[derive(Debug, Clone, Default)]
pub struct HeartbeatTrigger(Arc<Notify>);

impl HeartbeatTrigger {
    /// Send a heartbeat as soon as the scheduler wakes up.
    pub fn beat_now(&self) {
        self.0.notify_one();
    }
}

/// Handle to a running heartbeat task.
#[derive(Debug)]
pub struct HeartbeatHandle {
    trigger: HeartbeatTrigger,
    task: JoinHandle<()>,
}

impl HeartbeatHandle {
    /// Trigger used for server-requested heartbeats.
    #[must_use]
    pub fn trigger(&self) -> &HeartbeatTrigger {
        &self.trigger
    }

    /// Wait for the task to finish. It finishes once the attempt is cancelled.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!(error = %e, "heartbeat task panicked");
        }
    }
}

/// Start the heartbeat loop for one attempt.
///
/// The first beat fires after a random delay below `interval`, then one beat
/// every `interval`. Each beat carries the tracker value at send time.
/// Intervals above [`MAX_HEARTBEAT_INTERVAL`] are clamped to it.
pub fn start_heartbeat(
    interval: Duration,
    sequence: SequenceTracker,
    outbound: mpsc::Sender<Outbound>,
    drain: DrainSignal,
    cancel: CancellationToken,
) -> HeartbeatHandle {
    if interval > MAX_HEARTBEAT_INTERVAL {
        warn!(
            interval_ms = interval.as_millis() as u64,
            max_ms = MAX_HEARTBEAT_INTERVAL.as_millis() as u64,
            "clamping heartbeat interval"
        );
    }
    let interval = interval.min(MAX_HEARTBEAT_INTERVAL);
    let jitter = first_beat_delay(interval, &mut rand::thread_rng());
    let trigger = HeartbeatTrigger::default();
    let notify = Arc::clone(&trigger.0);

    debug!(
        interval_ms = interval.as_millis() as u64,
        jitter_ms = jitter.as_millis() as u64,
        "starting heartbeat"
    );

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + jitter, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
                () = notify.notified() => debug!("heartbeat requested by server"),
            }

            let beat = Outbound::Command(GatewayCommand::Heartbeat(sequence.get()));
            let sent = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                sent = outbound.send(beat) => sent,
            };
            if sent.is_err() {
                drain.trigger(DrainReason::WriteFailed);
                break;
            }
        }
    });

    HeartbeatHandle { trigger, task }
}
