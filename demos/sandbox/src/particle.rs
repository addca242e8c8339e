//! Short-lived particles that shrink and fall.

use engine_bus::{Delivery, Event};
use engine_component::{Entity, interest};
use engine_math::{DVec2, Transform2D};
use engine_system::{BehaviorSystem, Commands};

use crate::components::{Particle, Physics};
use crate::events::ApplyVelocity;

/// Downward acceleration applied to particles, in units per second squared.
pub const GRAVITY: f64 = 1500.0;

interest! {
    #[derive(Debug)]
    pub struct Spark {
        pub transform: Transform2D,
        pub physics: Physics,
        pub particle: Particle,
    }
}

/// Age one particle by `delta`. A particle destroys itself once its lifetime
/// runs out.
pub fn age(commands: &Commands, delivery: &Delivery, delta: f64, entity: Entity, spark: &mut Spark) {
    let particle = &mut spark.particle;
    let was_alive = particle.lifetime > 0.0;
    particle.lifetime -= delta;
    if particle.lifetime <= 0.0 {
        if was_alive {
            commands.destroy(entity);
        }
        return;
    }
    particle.radius = Particle::RADIUS * (particle.lifetime / Particle::LIFETIME);
    delivery.emit(Event::user(ApplyVelocity {
        entity,
        velocity: DVec2::new(0.0, -GRAVITY * delta),
    }));
}

/// Signature of [`age`].
pub type SparkBehavior = fn(&Commands, &Delivery, f64, Entity, &mut Spark);

/// The particle system: [`age`] for every spark, every frame.
pub type ParticleSystem = BehaviorSystem<Spark, SparkBehavior>;

/// Create the particle system.
#[must_use]
pub fn particle_system(commands: Commands) -> ParticleSystem {
    BehaviorSystem::new("particle", commands, age as SparkBehavior)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engine_bus::{BusConfig, EventBus, FrameQueues};
    use engine_component::{EntityAllocator, bundle};
    use engine_system::{RunFlag, SystemRunner};

    use super::*;
    use crate::physics::PhysicsSystem;

    #[tokio::test]
    async fn test_expired_particles_leave_every_set() {
        let queues = Arc::new(FrameQueues::new());
        let commands = Commands::new(
            Arc::clone(&queues),
            Arc::new(EntityAllocator::new()),
            RunFlag::new(),
        );
        let mut bus = EventBus::new(BusConfig::default()).unwrap();
        let particles =
            SystemRunner::new(particle_system(commands), bus.subscribe("particle").unwrap()).spawn();
        let physics =
            SystemRunner::new(PhysicsSystem::default(), bus.subscribe("physics").unwrap()).spawn();

        let spark = Entity(1);
        bus.publish(Event::entity_added(
            spark,
            bundle![
                Transform2D::at(100.0, 500.0),
                Physics::default(),
                Particle::new()
            ],
        ))
        .await;

        bus.publish(Event::BeginFrame { delta: 0.1 }).await;
        assert_eq!(queues.pending(), (0, 0));

        bus.publish(Event::BeginFrame { delta: 0.2 }).await;
        queues.rotate();
        let removed = queues.pop_current().unwrap();
        assert!(matches!(removed, Event::EntityRemoved { entity } if entity == spark));
        assert!(queues.pop_current().is_none());

        bus.publish(removed).await;
        bus.publish(Event::BeginFrame { delta: 0.1 }).await;
        bus.close();

        let particles = particles.join().await.unwrap();
        let physics = physics.join().await.unwrap();
        assert!(!particles.tracked().contains(spark));
        assert!(!physics.bodies().contains(spark));
    }

    #[tokio::test]
    async fn test_live_particles_shrink_and_fall() {
        let commands = Commands::new(
            Arc::new(FrameQueues::new()),
            Arc::new(EntityAllocator::new()),
            RunFlag::new(),
        );
        let mut bus = EventBus::new(BusConfig::default()).unwrap();
        let particles =
            SystemRunner::new(particle_system(commands), bus.subscribe("particle").unwrap()).spawn();
        let physics =
            SystemRunner::new(PhysicsSystem::default(), bus.subscribe("physics").unwrap()).spawn();

        let spark = Entity(1);
        bus.publish(Event::entity_added(
            spark,
            bundle![
                Transform2D::at(100.0, 500.0),
                Physics::default(),
                Particle::new()
            ],
        ))
        .await;
        bus.publish(Event::BeginFrame { delta: 0.1 }).await;
        bus.close();

        let particles = particles.join().await.unwrap();
        let physics = physics.join().await.unwrap();
        let particle = &particles.tracked().require(spark, "test").particle;
        assert!((particle.lifetime - (Particle::LIFETIME - 0.1)).abs() < 1e-9);
        assert!((particle.radius - Particle::RADIUS * 0.6).abs() < 1e-9);
        let body = physics.bodies().require(spark, "test");
        assert!((body.physics.velocity.y + GRAVITY * 0.1).abs() < 1e-9);
    }
}
