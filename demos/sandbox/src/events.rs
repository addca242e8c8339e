//! User events exchanged between the sandbox systems.

use engine_bus::UserEvent;
use engine_component::Entity;
use engine_math::{DVec2, Transform2D};

/// Add `change` (possibly negative) to an entity's wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceChange {
    pub entity: Entity,
    pub change: i64,
}

impl UserEvent for BalanceChange {
    const NAME: &'static str = "BalanceChange";
}

/// Move an entity. Children of the entity move by the same offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Translate {
    pub entity: Entity,
    /// Relative offset, or the target position when `absolute` is set.
    pub offset: DVec2,
    pub absolute: bool,
}

impl Translate {
    /// Move by a relative offset.
    #[must_use]
    pub fn by(entity: Entity, offset: DVec2) -> Self {
        Self {
            entity,
            offset,
            absolute: false,
        }
    }

    /// Move to an absolute position.
    #[must_use]
    pub fn to(entity: Entity, position: DVec2) -> Self {
        Self {
            entity,
            offset: position,
            absolute: true,
        }
    }

    /// Apply the move to a copy of the entity's transform and return the
    /// relative offset it amounted to.
    pub fn apply(&self, transform: &mut Transform2D) -> DVec2 {
        let offset = if self.absolute {
            transform.offset_to(self.offset)
        } else {
            self.offset
        };
        transform.translate(offset);
        offset
    }
}

impl UserEvent for Translate {
    const NAME: &'static str = "Translate";
}

/// Make `entity` follow `parent`. [`Entity::INVALID`] detaches it. The
/// entity's current position is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetParent {
    pub entity: Entity,
    pub parent: Entity,
}

impl UserEvent for SetParent {
    const NAME: &'static str = "SetParent";
}

/// Add `velocity` to an entity's current velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApplyVelocity {
    pub entity: Entity,
    pub velocity: DVec2,
}

impl UserEvent for ApplyVelocity {
    const NAME: &'static str = "ApplyVelocity";
}

/// The interactor asks to talk to whatever is in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interact {
    pub interactor: Entity,
}

impl UserEvent for Interact {
    const NAME: &'static str = "Interact";
}

/// The interactor picks a choice of its open dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choose {
    pub interactor: Entity,
    pub choice: usize,
}

impl UserEvent for Choose {
    const NAME: &'static str = "Choose";
}

/// A dialog asks the interactor a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogPrompt {
    pub interactor: Entity,
    pub speaker: String,
    pub text: String,
    pub choices: Vec<String>,
}

impl UserEvent for DialogPrompt {
    const NAME: &'static str = "DialogPrompt";
}

/// The interactor's dialog is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogClosed {
    pub interactor: Entity,
    pub speaker: String,
}

impl UserEvent for DialogClosed {
    const NAME: &'static str = "DialogClosed";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_translate() {
        let mut transform = Transform2D::at(10.0, 10.0);
        let offset = Translate::by(Entity(1), DVec2::new(5.0, 0.0)).apply(&mut transform);
        assert_eq!(offset, DVec2::new(5.0, 0.0));
        assert_eq!(transform.position, DVec2::new(15.0, 10.0));
    }

    #[test]
    fn test_absolute_translate_reports_relative_offset() {
        let mut transform = Transform2D::at(10.0, 10.0);
        let offset = Translate::to(Entity(1), DVec2::new(0.0, 40.0)).apply(&mut transform);
        assert_eq!(offset, DVec2::new(-10.0, 30.0));
        assert_eq!(transform.position, DVec2::new(0.0, 40.0));
    }
}
