//! Upload progress reporting.
//!
//! Object stores report how much of an upload has been written as a
//! percentage. Observers read it from a `tokio::sync::watch` channel; the
//! reporter only ever publishes increasing values, so observers see a
//! monotonic 0 → 100 sequence.

use tokio::sync::watch;

/// Publishes upload progress as a percentage.
#[derive(Debug)]
pub struct ProgressReporter {
    tx: watch::Sender<u8>,
}

impl ProgressReporter {
    /// Create a reporter and the receiver that observes it.
    pub fn channel() -> (Self, watch::Receiver<u8>) {
        let (tx, rx) = watch::channel(0);
        (Self { tx }, rx)
    }

    /// A reporter nobody listens to.
    pub fn detached() -> Self {
        Self::channel().0
    }

    /// Current published percentage.
    pub fn current(&self) -> u8 {
        *self.tx.borrow()
    }

    /// Publish `percent` (clamped to 100) if it is greater than the last
    /// published value.
    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        self.tx.send_if_modified(|current| {
            if percent > *current {
                *current = percent;
                true
            } else {
                false
            }
        });
    }

    /// Publish progress for `written` out of `total` bytes.
    pub fn report_bytes(&self, written: u64, total: u64) {
        let percent = if total == 0 {
            100
        } else {
            ((written.min(total) * 100) / total) as u8
        };
        self.report(percent);
    }

    pub fn complete(&self) {
        self.report(100);
    }
}
