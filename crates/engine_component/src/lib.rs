//! # engine_component
//!
//! The "E" and "C" of the engine: entity identity, component kinds, the
//! untyped bundle an entity is created with, and the projection of that
//! bundle into a system's strongly typed view.
//!
//! This crate provides:
//!
//! - [`Component`] trait — the contract all entity data must satisfy.
//! - [`Entity`] — lightweight `u64` entity identifiers.
//! - [`EntityAllocator`] — strictly increasing, shareable ID allocator.
//! - [`ComponentBundle`] — kind → value map built at entity creation.
//! - [`Interest`] / [`InterestSet`] — all-or-nothing projection of bundles
//!   into system-private shapes.
//! - [`protocol_violation`] — the terminating path for wiring bugs.

pub mod bundle;
pub mod component;
pub mod entity;
pub mod interest;
pub mod violation;

pub use bundle::ComponentBundle;
pub use component::{Component, ComponentTypeId, fnv1a_64};
pub use entity::{Entity, EntityAllocator};
pub use interest::{Interest, InterestSet, project};
pub use violation::protocol_violation;
