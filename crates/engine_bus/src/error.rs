//! Bus error types.

/// Errors raised while wiring up a bus.
///
/// Failures during delivery are not represented here: a subscriber that
/// breaks the delivery protocol is a protocol violation and terminates.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// Inboxes must hold at least one delivery.
    #[error("inbox capacity must be greater than zero")]
    ZeroCapacity,

    /// The subscriber set is fixed once publishing has begun.
    #[error("cannot subscribe `{0}` after the bus has started publishing")]
    AlreadyStarted(String),

    /// The bus has been closed.
    #[error("cannot subscribe `{0}` to a closed bus")]
    Closed(String),
}
