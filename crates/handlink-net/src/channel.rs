//! Single-slot frame hand-off between the receiver task and the consumer
//!
//! The slot holds at most one frame. Publishing over an unconsumed frame
//! replaces it, so the network side never waits and the consumer always
//! sees the newest pose.

use handlink_core::LandmarkFrame;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Slot {
    frame: Option<LandmarkFrame>,
    closed: bool,
    published: u64,
    overwritten: u64,
}

/// Counters describing channel traffic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Frames accepted by `publish`
    pub published: u64,
    /// Frames replaced before the consumer took them
    pub overwritten: u64,
}

/// Most-recent-wins frame slot shared by the receiver and the consumer
#[derive(Debug, Clone, Default)]
pub struct FrameChannel {
    slot: Arc<Mutex<Slot>>,
}

impl FrameChannel {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the slot half-written
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `frame`, replacing any frame not yet taken
    ///
    /// Returns `false` if the channel is closed and the frame was dropped.
    pub fn publish(&self, frame: LandmarkFrame) -> bool {
        let mut slot = self.lock();
        if slot.closed {
            return false;
        }
        if slot.frame.replace(frame).is_some() {
            slot.overwritten += 1;
        }
        slot.published += 1;
        true
    }

    /// Remove and return the pending frame, if any
    pub fn take(&self) -> Option<LandmarkFrame> {
        self.lock().frame.take()
    }

    /// Whether a frame is waiting to be taken
    pub fn has_pending(&self) -> bool {
        self.lock().frame.is_some()
    }

    /// Drop any pending frame and refuse further publishes
    pub fn close(&self) {
        let mut slot = self.lock();
        slot.closed = true;
        slot.frame = None;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn stats(&self) -> ChannelStats {
        let slot = self.lock();
        ChannelStats {
            published: slot.published,
            overwritten: slot.overwritten,
        }
    }
}
