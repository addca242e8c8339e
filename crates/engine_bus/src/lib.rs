//! # engine_bus
//!
//! The synchronisation engine of the event-driven ECS.
//!
//! Every published event is delivered to every subscriber, and the publisher
//! waits until all of them have acknowledged it. Follow-up events emitted
//! while handling an event are published, recursively, before the triggering
//! publish returns. The result is one total order of events observed by all
//! systems.
//!
//! This crate provides:
//!
//! - [`Event`] / [`UserEvent`] — the closed lifecycle vocabulary plus open,
//!   system-defined event kinds.
//! - [`EventBus`] / [`Subscription`] — fan-out delivery with a completion
//!   barrier per event.
//! - [`Delivery`] — a subscriber's handle on one event: read it, emit
//!   follow-ups, acknowledge.
//! - [`FrameQueues`] — the "this frame" / "next frame" queues drained by the
//!   tick loop.
//! - [`BusConfig`] / [`BusError`] — configuration and setup errors.

pub mod bus;
pub mod config;
pub mod envelope;
pub mod error;
pub mod event;
pub mod queue;

pub use bus::{EventBus, Subscription};
pub use config::BusConfig;
pub use envelope::Delivery;
pub use error::BusError;
pub use event::{Event, EventKind, UserEvent, UserPayload};
pub use queue::FrameQueues;
