//! The event bus.
//!
//! [`EventBus::publish`] delivers one event to every subscriber and resolves
//! only once the event, and every immediate follow-up it caused, has been
//! fully handled by everyone:
//!
//! 1. Wrap the event in an envelope whose barrier counts the subscribers.
//! 2. Send a [`Delivery`] to each inbox in registration order. A full inbox
//!    makes the publisher wait (backpressure).
//! 3. Wait for every delivery to be acknowledged.
//! 4. Publish each follow-up the same way, depth first, in subscriber
//!    registration order and FIFO within one subscriber.
//!
//! No two events are ever in flight at once, so every subscriber observes the
//! same total order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use engine_component::protocol_violation;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::config::BusConfig;
use crate::envelope::{Delivery, Envelope};
use crate::error::BusError;
use crate::event::Event;

/// The sending half of one subscriber's inbox.
#[derive(Debug)]
struct Inbox {
    name: String,
    sender: mpsc::Sender<Delivery>,
}

/// A subscriber's private inbox.
#[derive(Debug)]
pub struct Subscription {
    name: String,
    index: usize,
    receiver: mpsc::Receiver<Delivery>,
}

impl Subscription {
    /// Wait for the next delivery. `None` means the bus was closed and no
    /// more events will arrive.
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.receiver.recv().await
    }

    /// The subscriber's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registration index; follow-ups are ordered by it.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Fan-out event bus with a completion barrier per event.
#[derive(Debug)]
pub struct EventBus {
    config: BusConfig,
    inboxes: Vec<Inbox>,
    started: AtomicBool,
    closed: bool,
    sequence: AtomicU64,
}

impl EventBus {
    /// Create a bus with no subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ZeroCapacity`] if the configured inbox capacity is
    /// zero, which would deadlock the first publish.
    pub fn new(config: BusConfig) -> Result<Self, BusError> {
        config.validate()?;
        Ok(Self {
            config,
            inboxes: Vec::new(),
            started: AtomicBool::new(false),
            closed: false,
            sequence: AtomicU64::new(0),
        })
    }

    /// Register a subscriber and return its inbox.
    ///
    /// The subscriber set is fixed once publishing starts.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::AlreadyStarted`] after the first publish and
    /// [`BusError::Closed`] after [`EventBus::close`].
    pub fn subscribe(&mut self, name: impl Into<String>) -> Result<Subscription, BusError> {
        let name = name.into();
        if self.closed {
            return Err(BusError::Closed(name));
        }
        if self.started.load(Ordering::Acquire) {
            return Err(BusError::AlreadyStarted(name));
        }

        let (sender, receiver) = mpsc::channel(self.config.inbox_capacity);
        let index = self.inboxes.len();
        self.inboxes.push(Inbox {
            name: name.clone(),
            sender,
        });
        debug!(subscriber = name, index, "subscriber registered");

        Ok(Subscription {
            name,
            index,
            receiver,
        })
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inboxes.len()
    }

    /// Total number of events published so far, follow-ups included.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// Returns `true` once the first event has been published.
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Deliver `event` to every subscriber, then its follow-ups, and resolve
    /// once all of it has settled.
    ///
    /// Follow-ups are walked depth first with an explicit stack, so chains of
    /// any length run in constant stack space.
    ///
    /// A subscriber that hung up or panicked while handling the event is a
    /// protocol violation.
    pub async fn publish(&self, event: Event) {
        self.started.store(true, Ordering::Release);
        if self.closed {
            warn!(event = event.name(), "publish on a closed bus ignored");
            return;
        }

        let mut pending: Vec<std::vec::IntoIter<Event>> = vec![vec![event].into_iter()];
        while let Some(level) = pending.last_mut() {
            let Some(event) = level.next() else {
                pending.pop();
                continue;
            };
            let follow_ups = self.deliver(event).await;
            if !follow_ups.is_empty() {
                pending.push(follow_ups.into_iter());
            }
        }
    }

    /// Fan `event` out, wait for the barrier and return its follow-ups.
    async fn deliver(&self, event: Event) -> Vec<Event> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let name = event.name();
        let envelope = Arc::new(Envelope::new(event, sequence, self.inboxes.len()));
        trace!(sequence, event = name, subscribers = self.inboxes.len(), "publishing");

        for (index, inbox) in self.inboxes.iter().enumerate() {
            let delivery = Delivery::new(Arc::clone(&envelope), index);
            if inbox.sender.send(delivery).await.is_err() {
                protocol_violation(format_args!(
                    "subscriber `{}` hung up before {name} #{sequence}",
                    inbox.name
                ));
            }
        }

        envelope.settled().await;

        if let Some(index) = envelope.poisoned_by() {
            protocol_violation(format_args!(
                "subscriber `{}` failed while handling {name} #{sequence}",
                self.inboxes[index].name
            ));
        }

        let follow_ups = envelope.take_follow_ups();
        if !follow_ups.is_empty() {
            trace!(sequence, event = name, count = follow_ups.len(), "follow-ups queued");
        }
        follow_ups
    }

    /// Close every inbox. Subscribers see end-of-stream once they have
    /// drained what was already delivered.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let subscribers = self.inboxes.len();
        self.inboxes.clear();
        info!(subscribers, published = self.published(), "event bus closed");
    }

    /// Returns `true` once [`EventBus::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
