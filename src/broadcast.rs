//! Latest-frame fan-out to stream subscribers.
//!
//! DESIGN
//! ======
//! A single watch cell holds the newest published frame. Publishing replaces
//! the cell without looking at subscriber progress, so the render loop never
//! blocks on a slow viewer. Each subscriber pulls the latest value when its
//! connection is ready to send another part: a viewer that keeps up sees
//! every frame, a slow one skips straight to the newest, and a reconnecting
//! one starts from the current frame with no backlog. Dropping the
//! subscription is the entire cleanup path.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::frame::Frame;

// =============================================================================
// BROADCASTER
// =============================================================================

#[derive(Clone)]
pub struct FrameBroadcaster {
    tx: watch::Sender<Option<Arc<Frame>>>,
    next_seq: Arc<AtomicU64>,
}

impl FrameBroadcaster {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx, next_seq: Arc::new(AtomicU64::new(1)) }
    }

    /// Stamp the next sequence number onto `frame` and make it the current
    /// frame. Returns the stamped sequence number.
    pub fn publish(&self, mut frame: Frame) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        frame.seq = seq;
        self.tx.send_replace(Some(Arc::new(frame)));
        seq
    }

    /// Newest published frame, if any frame has been published yet.
    #[must_use]
    pub fn latest(&self) -> Option<Arc<Frame>> {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> FrameSubscription {
        FrameSubscription { rx: self.tx.subscribe(), delivered: None }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for FrameBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// One viewer's handle onto the frame feed. Dropping it releases everything.
pub struct FrameSubscription {
    rx: watch::Receiver<Option<Arc<Frame>>>,
    /// Sequence number of the last frame handed to this subscriber.
    delivered: Option<u64>,
}

impl FrameSubscription {
    /// Wait for a frame this subscriber has not delivered yet.
    ///
    /// The first call returns the current frame immediately, so a new or
    /// reconnecting viewer starts at the newest state. Later calls wait for
    /// a change and then return whatever is newest, skipping anything
    /// published in between. Returns `None` once the broadcaster is gone.
    pub async fn next_frame(&mut self) -> Option<Arc<Frame>> {
        loop {
            let current = self.rx.borrow_and_update().clone();
            if let Some(frame) = current {
                if self.delivered != Some(frame.seq) {
                    self.delivered = Some(frame.seq);
                    return Some(frame);
                }
            }
            if self.rx.changed().await.is_err() {
                return None;
            }
        }
    }
}

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod tests;
