//! Last-seen dispatch sequence number.

use std::sync::Arc;

use parking_lot::Mutex;

/// Shared handle to the last sequence number seen in a dispatch envelope.
///
/// Cloning yields another handle to the same value. The read loop writes it,
/// the heartbeat task and the resume path read it.
#[derive(Debug, Clone, Default)]
pub struct SequenceTracker {
    last: Arc<Mutex<Option<u64>>>,
}

impl SequenceTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest sequence number.
    pub fn set(&self, sequence: u64) {
        let mut last = self.last.lock();
        if let Some(previous) = *last {
            if sequence < previous {
                tracing::warn!(previous, sequence, "sequence went backwards");
            }
        }
        *last = Some(sequence);
    }

    /// The latest sequence number, if any dispatch has been seen.
    #[must_use]
    pub fn get(&self) -> Option<u64> {
        *self.last.lock()
    }

    /// Forget the sequence. Used when the session is invalidated.
    pub fn clear(&self) {
        *self.last.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unset() {
        assert_eq!(SequenceTracker::new().get(), None);
    }

    #[test]
    fn test_reads_last_of_ordered_sets() {
        let tracker = SequenceTracker::new();
        for s in 1..=5 {
            tracker.set(s);
        }
        assert_eq!(tracker.get(), Some(5));
    }

    #[test]
    fn test_clones_share_state() {
        let tracker = SequenceTracker::new();
        let reader = tracker.clone();
        tracker.set(42);
        assert_eq!(reader.get(), Some(42));

        reader.clear();
        assert_eq!(tracker.get(), None);
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        let tracker = SequenceTracker::new();
        let writer = tracker.clone();

        let handle = std::thread::spawn(move || {
            for s in 1..=10_000 {
                writer.set(s);
            }
        });

        let mut seen = 0;
        while !handle.is_finished() {
            if let Some(s) = tracker.get() {
                assert!(s >= seen, "reader saw {s} after {seen}");
                seen = s;
            }
        }
        handle.join().unwrap();
        assert_eq!(tracker.get(), Some(10_000));
    }
}
