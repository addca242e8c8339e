//! # engine_system
//!
//! System runtime library for the event-bus engine.
//!
//! This crate provides:
//!
//! - [`System`] — the contract every subscriber implements.
//! - [`SystemRunner`] / [`SystemHandle`] — drive a system on its own task and
//!   take it back after shutdown.
//! - [`Commands`] / [`EntityRegistry`] — schedule events for later, create and
//!   destroy entities, stop the loop.
//! - [`BehaviorSystem`] — per-entity frame behaviour over an interest set.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use engine_bus::{BusConfig, Delivery, Event, EventBus};
//! use engine_system::{System, SystemRunner};
//!
//! struct Logger;
//!
//! impl System for Logger {
//!     fn name(&self) -> &str {
//!         "logger"
//!     }
//!
//!     async fn handle(&mut self, delivery: &Delivery) {
//!         println!("{:?}", delivery.event());
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut bus = EventBus::new(BusConfig::default()).unwrap();
//!     let handle = SystemRunner::new(Logger, bus.subscribe("logger").unwrap()).spawn();
//!     bus.publish(Event::Setup).await;
//!     bus.close();
//!     handle.join().await.unwrap();
//! }
//! ```

use std::future::Future;

use engine_bus::Delivery;

pub mod behavior;
pub mod context;
pub mod entities;
pub mod error;
pub mod runner;

pub use behavior::BehaviorSystem;
pub use context::{Commands, RunFlag};
pub use entities::EntityRegistry;
pub use error::SystemError;
pub use runner::{SystemHandle, SystemRunner};

/// A bus subscriber.
///
/// `handle` is called once per delivered event, one at a time, in delivery
/// order. The event counts as handled when the returned future resolves;
/// until then the publisher waits. Follow-ups go through
/// [`Delivery::emit`]. Panicking inside `handle` is a protocol violation and
/// brings the loop down.
pub trait System: Send + 'static {
    /// Name used for the subscription and in logs.
    fn name(&self) -> &str;

    /// Handle one delivered event.
    fn handle(&mut self, delivery: &Delivery) -> impl Future<Output = ()> + Send;
}
