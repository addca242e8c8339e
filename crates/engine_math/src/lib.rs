//! # engine_math
//!
//! Math types for the event-bus engine. Re-exports [`glam`] for linear
//! algebra and defines engine-specific spatial types that implement
//! [`Component`](engine_component::Component).

pub mod transform;

// Re-export glam types for convenience.
pub use glam::{DAffine2, DMat2, DVec2};

pub use transform::Transform2D;
