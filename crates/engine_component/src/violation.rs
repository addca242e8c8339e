//! Protocol violations.
//!
//! A protocol violation is a wiring bug between systems: an event that names
//! an entity the handling system never projected, a component kind collision,
//! a subscriber that hung up mid-run. Continuing would leave shared state
//! inconsistent, so these terminate instead of returning an error. Release
//! builds are compiled with `panic = "abort"`.

use std::fmt::Display;

use tracing::error;

/// Log `message` and terminate.
#[track_caller]
pub fn protocol_violation(message: impl Display) -> ! {
    let location = std::panic::Location::caller();
    error!(%location, "protocol violation: {message}");
    panic!("protocol violation: {message}");
}
