//! System runtime errors.

/// Errors observed when collecting a system after shutdown.
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    /// The system's task panicked.
    #[error("system `{0}` panicked")]
    Panicked(String),

    /// The system's task was cancelled before it finished.
    #[error("system `{0}` was cancelled")]
    Cancelled(String),
}
