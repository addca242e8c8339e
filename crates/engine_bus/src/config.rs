//! Bus configuration.

use serde::{Deserialize, Serialize};

use crate::error::BusError;

/// Default number of deliveries an inbox can buffer.
pub const DEFAULT_INBOX_CAPACITY: usize = 10;

/// Configuration for an [`EventBus`](crate::EventBus).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Capacity of every subscriber inbox. Must be greater than zero.
    pub inbox_capacity: usize,
}

impl BusConfig {
    /// Override the inbox capacity.
    #[must_use]
    pub fn with_inbox_capacity(mut self, capacity: usize) -> Self {
        self.inbox_capacity = capacity;
        self
    }

    /// Check that the configuration can produce a working bus.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ZeroCapacity`] if `inbox_capacity` is zero.
    pub fn validate(&self) -> Result<(), BusError> {
        if self.inbox_capacity == 0 {
            return Err(BusError::ZeroCapacity);
        }
        Ok(())
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
        }
    }
}
