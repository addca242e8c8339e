//! Velocity integration with a floor and two walls.

use engine_bus::{Delivery, Event};
use engine_component::{InterestSet, interest};
use engine_math::{DVec2, Transform2D};
use engine_system::System;
use tracing::trace;

use crate::components::Physics;
use crate::events::{ApplyVelocity, Translate};

/// Fraction of velocity kept from one frame to the next.
const DAMPING: f64 = 0.93;
/// Fraction of vertical speed kept when bouncing off the floor.
const FLOOR_BOUNCE: f64 = 0.5;

/// The playable area. Bodies are kept `margin` away from the floor and the
/// side walls; there is no ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub margin: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            width: 1024.0,
            margin: 20.0,
        }
    }
}

interest! {
    #[derive(Debug)]
    pub struct Body {
        pub transform: Transform2D,
        pub physics: Physics,
    }
}

/// Moves every body by its velocity once per frame.
///
/// Movement goes out as [`Translate`] follow-ups of `BeginFrame`; the system
/// keeps its own copy of each position in step by watching those events.
#[derive(Debug, Default)]
pub struct PhysicsSystem {
    bodies: InterestSet<Body>,
    bounds: Bounds,
}

impl PhysicsSystem {
    #[must_use]
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bodies: InterestSet::new(),
            bounds,
        }
    }

    /// The bodies currently tracked.
    #[must_use]
    pub fn bodies(&self) -> &InterestSet<Body> {
        &self.bodies
    }

    fn step(&mut self, delta: f64, delivery: &Delivery) {
        let Bounds { width, margin } = self.bounds;
        for (entity, body) in self.bodies.iter_mut() {
            let velocity = &mut body.physics.velocity;
            let mut next = body.transform.position + *velocity * delta;

            if next.y < margin {
                velocity.y = -velocity.y * FLOOR_BOUNCE;
                next.y = margin;
            }
            if next.x > width - margin {
                velocity.x = -velocity.x;
                next.x = width - margin;
            }
            if next.x < margin {
                velocity.x = -velocity.x;
                next.x = margin;
            }
            *velocity *= DAMPING;

            let offset = next - body.transform.position;
            if offset != DVec2::ZERO {
                trace!(%entity, x = offset.x, y = offset.y, "moving");
                delivery.emit(Event::user(Translate::by(entity, offset)));
            }
        }
    }
}

impl System for PhysicsSystem {
    fn name(&self) -> &str {
        "physics"
    }

    async fn handle(&mut self, delivery: &Delivery) {
        let event = delivery.event();
        if event.track(&mut self.bodies) {
            return;
        }
        if let Event::BeginFrame { delta } = *event {
            self.step(delta, delivery);
        } else if let Some(push) = event.downcast::<ApplyVelocity>() {
            let body = self.bodies.require_mut(push.entity, "apply velocity");
            body.physics.velocity += push.velocity;
        } else if let Some(translate) = event.downcast::<Translate>()
            && let Some(body) = self.bodies.get_mut(translate.entity)
        {
            translate.apply(&mut body.transform);
        }
    }
}
