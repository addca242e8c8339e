//! Components of the sandbox world.

use engine_component::Component;
use engine_math::DVec2;

use crate::dialog::DialogScript;

/// Money held by an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wallet {
    pub balance: i64,
}

impl Component for Wallet {
    fn type_name() -> &'static str {
        "Wallet"
    }
}

/// Velocity of a moving body, in units per second.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Physics {
    pub velocity: DVec2,
}

impl Component for Physics {
    fn type_name() -> &'static str {
        "Physics"
    }
}

/// A short-lived circle that shrinks as it ages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Seconds left to live.
    pub lifetime: f64,
    pub radius: f64,
}

impl Particle {
    /// Lifetime of a fresh particle, in seconds.
    pub const LIFETIME: f64 = 0.25;
    /// Radius of a fresh particle.
    pub const RADIUS: f64 = 5.0;

    #[must_use]
    pub fn new() -> Self {
        Self {
            lifetime: Self::LIFETIME,
            radius: Self::RADIUS,
        }
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Particle {
    fn type_name() -> &'static str {
        "Particle"
    }
}

/// Marks the entity the autopilot steers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Player;

impl Component for Player {
    fn type_name() -> &'static str {
        "Player"
    }
}

/// Marks an entity that can start conversations with nearby interactives.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interactor;

impl Component for Interactor {
    fn type_name() -> &'static str {
        "Interactor"
    }
}

/// Something an interactor can talk to.
#[derive(Clone)]
pub struct Interactive {
    /// In-world name, e.g. `"Alice"`.
    pub name: String,
    /// Hint shown when in range, e.g. `"[space] Talk"`.
    pub prompt: String,
    /// The conversation started on interaction.
    pub script: DialogScript,
}

impl std::fmt::Debug for Interactive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interactive")
            .field("name", &self.name)
            .field("prompt", &self.prompt)
            .finish_non_exhaustive()
    }
}

impl Component for Interactive {
    fn type_name() -> &'static str {
        "Interactive"
    }
}

/// A line of text drawn in the world, e.g. a nameplate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub text: String,
}

impl Component for Label {
    fn type_name() -> &'static str {
        "Label"
    }
}
