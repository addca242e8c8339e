//! Envelopes and deliveries.
//!
//! Every publish creates one [`Envelope`] shared by all recipients. Each
//! recipient gets its own [`Delivery`] handle onto it. The envelope carries a
//! countdown barrier: the publisher waits until every delivery has been
//! acknowledged. A delivery acknowledges exactly once, either through
//! [`Delivery::done`] or when it is dropped, so early returns and error paths
//! in a handler cannot leave the publisher waiting.
//!
//! Follow-up events emitted through a delivery are kept in a slot per
//! subscriber and handed back to the publisher in subscriber registration
//! order, FIFO within one subscriber.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::trace;

use crate::event::Event;

/// One in-flight event shared by all of its recipients.
#[derive(Debug)]
pub(crate) struct Envelope {
    event: Event,
    sequence: u64,
    pending: AtomicUsize,
    settled: Notify,
    follow_ups: Mutex<Vec<Vec<Event>>>,
    poisoned: Mutex<Option<usize>>,
}

impl Envelope {
    /// Create an envelope expecting `recipients` acknowledgments.
    pub(crate) fn new(event: Event, sequence: u64, recipients: usize) -> Self {
        Self {
            event,
            sequence,
            pending: AtomicUsize::new(recipients),
            settled: Notify::new(),
            follow_ups: Mutex::new(vec![Vec::new(); recipients]),
            poisoned: Mutex::new(None),
        }
    }

    pub(crate) fn event(&self) -> &Event {
        &self.event
    }

    fn acknowledge(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            // A stored permit wakes the publisher even if it is not yet waiting.
            self.settled.notify_one();
        }
    }

    /// Resolve once every recipient has acknowledged.
    pub(crate) async fn settled(&self) {
        while self.pending.load(Ordering::Acquire) != 0 {
            self.settled.notified().await;
        }
    }

    /// The subscriber index that panicked while holding this envelope.
    pub(crate) fn poisoned_by(&self) -> Option<usize> {
        *self.poisoned.lock()
    }

    /// Drain follow-ups in subscriber registration order.
    pub(crate) fn take_follow_ups(&self) -> Vec<Event> {
        let slots = std::mem::take(&mut *self.follow_ups.lock());
        slots.into_iter().flatten().collect()
    }
}

/// A subscriber's handle on one published event.
///
/// Carries the event, the "emit immediate follow-up" queue and the
/// acknowledgment. Dropping the delivery acknowledges it.
#[derive(Debug)]
pub struct Delivery {
    envelope: Arc<Envelope>,
    subscriber: usize,
}

impl Delivery {
    pub(crate) fn new(envelope: Arc<Envelope>, subscriber: usize) -> Self {
        Self {
            envelope,
            subscriber,
        }
    }

    /// The delivered event.
    #[must_use]
    pub fn event(&self) -> &Event {
        self.envelope.event()
    }

    /// Bus-wide publish sequence number of this event.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.envelope.sequence
    }

    /// Queue `event` to be published immediately after the current event,
    /// before anything published later is delivered.
    pub fn emit(&self, event: Event) {
        trace!(
            sequence = self.envelope.sequence,
            subscriber = self.subscriber,
            follow_up = event.name(),
            "immediate follow-up queued"
        );
        self.envelope.follow_ups.lock()[self.subscriber].push(event);
    }

    /// Mark the handler that held this delivery as failed. The publisher
    /// turns this into a protocol violation once the barrier settles.
    pub fn poison(&self) {
        self.envelope.poisoned.lock().get_or_insert(self.subscriber);
    }

    /// Acknowledge the delivery.
    pub fn done(self) {
        drop(self);
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.poison();
        }
        self.envelope.acknowledge();
    }
}
