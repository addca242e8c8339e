//! System registry: tracks the systems attached to a tick loop.
//!
//! Every attached system owns one bus subscription. The registry remembers
//! the subscription index and runner instance of each, in registration order,
//! which is also the order follow-ups are concatenated in.

use uuid::Uuid;

/// Information about one attached system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    /// The system's human-readable name.
    pub name: String,
    /// The system's subscription index on the bus.
    pub index: usize,
    /// Instance ID of the system's runner.
    pub instance_id: Uuid,
}

/// Registry of all systems attached to a tick loop.
#[derive(Debug, Default)]
pub struct SystemRegistry {
    /// Systems in registration order.
    systems: Vec<SystemInfo>,
}

impl SystemRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
        }
    }

    /// Record an attached system.
    pub fn register(&mut self, info: SystemInfo) {
        self.systems.push(info);
    }

    /// Returns an iterator over all systems in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &SystemInfo> {
        self.systems.iter()
    }

    /// Returns the number of attached systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }
}
