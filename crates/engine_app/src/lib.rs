//! # engine_app
//!
//! Frame scheduler for the event-bus engine.
//!
//! This crate provides:
//!
//! - [`TickLoop`] — owns the bus and the frame queues and drives every frame
//!   through its Begin, Drain and End phases.
//! - [`SystemRegistry`] — bookkeeping of the systems attached to a loop.
//! - [`EngineConfig`] — bus and tick settings, loadable from a JSON file.

pub mod config;
pub mod registry;
pub mod tick;

pub use config::{ConfigError, EngineConfig};
pub use registry::{SystemInfo, SystemRegistry};
pub use tick::{TickConfig, TickLoop};
