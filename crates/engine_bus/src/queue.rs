//! Frame queues.
//!
//! Two queues feed the frame drain: `current`, drained during this frame, and
//! `next`, rotated into `current` at the start of the next drain. Both are
//! appended to from any subscriber task and popped only by the tick loop. The
//! lock is never held while an event is being published.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::warn;

use crate::event::Event;

#[derive(Debug, Default)]
struct Queues {
    current: VecDeque<Event>,
    next: VecDeque<Event>,
    closed: bool,
}

/// The "this frame" and "next frame" queues of a tick loop.
#[derive(Debug, Default)]
pub struct FrameQueues {
    inner: Mutex<Queues>,
}

impl FrameQueues {
    /// Create empty, open queues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event` to the queue for the next frame.
    ///
    /// Returns `false` (and drops the event) if the queues are closed.
    pub fn push_next_frame(&self, event: Event) -> bool {
        let mut queues = self.inner.lock();
        if queues.closed {
            warn!(event = event.name(), "next-frame event dropped after shutdown");
            return false;
        }
        queues.next.push_back(event);
        true
    }

    /// Append `event` to the queue being drained this frame.
    ///
    /// Returns `false` (and drops the event) if the queues are closed.
    pub fn push_this_frame(&self, event: Event) -> bool {
        let mut queues = self.inner.lock();
        if queues.closed {
            warn!(event = event.name(), "this-frame event dropped after shutdown");
            return false;
        }
        queues.current.push_back(event);
        true
    }

    /// Make the next-frame queue current and start a fresh next-frame queue.
    ///
    /// Anything still in `current` (scheduled "this frame" outside a drain)
    /// stays queued behind the rotated events.
    pub fn rotate(&self) {
        let mut queues = self.inner.lock();
        let leftover = std::mem::take(&mut queues.current);
        queues.current = std::mem::take(&mut queues.next);
        queues.current.extend(leftover);
    }

    /// Pop the oldest event scheduled for this frame.
    pub fn pop_current(&self) -> Option<Event> {
        self.inner.lock().current.pop_front()
    }

    /// Number of events waiting in `(current, next)`.
    #[must_use]
    pub fn pending(&self) -> (usize, usize) {
        let queues = self.inner.lock();
        (queues.current.len(), queues.next.len())
    }

    /// Close both queues, discarding anything still queued. Returns how many
    /// events were discarded.
    pub fn close(&self) -> usize {
        let mut queues = self.inner.lock();
        queues.closed = true;
        let discarded = queues.current.len() + queues.next.len();
        queues.current.clear();
        queues.next.clear();
        discarded
    }

    /// Returns `true` once [`FrameQueues::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}
