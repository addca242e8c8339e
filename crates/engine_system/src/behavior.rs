//! Per-entity frame behaviour.
//!
//! Many systems have the same shape: track every entity that carries some set
//! of components, and once per frame run a small function over each of them.
//! [`BehaviorSystem`] is that shape, with the function supplied as a closure.

use std::fmt;

use engine_bus::{Delivery, Event};
use engine_component::{Entity, Interest, InterestSet};
use tracing::trace;

use crate::System;
use crate::context::Commands;

/// Runs `behavior` for every tracked entity on each `BeginFrame`.
///
/// The closure receives the command handle, the `BeginFrame` delivery (for
/// immediate follow-ups), the frame delta in seconds, the entity and its
/// private state. Entities are visited in ascending id order.
pub struct BehaviorSystem<S, F> {
    name: String,
    commands: Commands,
    tracked: InterestSet<S>,
    behavior: F,
}

impl<S, F> BehaviorSystem<S, F>
where
    S: Interest,
    F: FnMut(&Commands, &Delivery, f64, Entity, &mut S) + Send + 'static,
{
    /// Create a behaviour system.
    #[must_use]
    pub fn new(name: impl Into<String>, commands: Commands, behavior: F) -> Self {
        Self {
            name: name.into(),
            commands,
            tracked: InterestSet::new(),
            behavior,
        }
    }

    /// The entities currently tracked, with their state.
    #[must_use]
    pub fn tracked(&self) -> &InterestSet<S> {
        &self.tracked
    }
}

impl<S, F> fmt::Debug for BehaviorSystem<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorSystem")
            .field("name", &self.name)
            .field("tracked", &self.tracked.len())
            .finish_non_exhaustive()
    }
}

impl<S, F> System for BehaviorSystem<S, F>
where
    S: Interest,
    F: FnMut(&Commands, &Delivery, f64, Entity, &mut S) + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&mut self, delivery: &Delivery) {
        let event = delivery.event();
        if event.track(&mut self.tracked) {
            return;
        }
        if let Event::BeginFrame { delta } = *event {
            let Self {
                name,
                commands,
                tracked,
                behavior,
            } = self;
            trace!(system = %name, entities = tracked.len(), delta, "running behaviour");
            for (entity, state) in tracked.iter_mut() {
                behavior(commands, delivery, delta, entity, state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engine_bus::{BusConfig, EventBus, FrameQueues};
    use engine_component::{Component, EntityAllocator, bundle};

    use super::*;
    use crate::context::RunFlag;
    use crate::runner::SystemRunner;

    #[derive(Debug, Clone)]
    struct Lifetime(f64);

    impl Component for Lifetime {
        fn type_name() -> &'static str {
            "Lifetime"
        }
    }

    fn commands() -> (Commands, Arc<FrameQueues>) {
        let queues = Arc::new(FrameQueues::new());
        let commands = Commands::new(
            Arc::clone(&queues),
            Arc::new(EntityAllocator::new()),
            RunFlag::new(),
        );
        (commands, queues)
    }

    #[tokio::test]
    async fn test_behavior_runs_per_tracked_entity() {
        let (commands, queues) = commands();
        let decay = BehaviorSystem::new(
            "decay",
            commands,
            |commands: &Commands, _: &Delivery, delta, entity, (life,): &mut (Lifetime,)| {
                life.0 -= delta;
                if life.0 <= 0.0 {
                    commands.destroy(entity);
                }
            },
        );

        let mut bus = EventBus::new(BusConfig::default()).unwrap();
        let handle = SystemRunner::new(decay, bus.subscribe("decay").unwrap()).spawn();

        bus.publish(Event::entity_added(Entity(1), bundle![Lifetime(1.0)])).await;
        bus.publish(Event::entity_added(Entity(2), bundle![Lifetime(3.0)])).await;
        bus.publish(Event::entity_added(Entity(3), bundle![])).await;
        bus.publish(Event::BeginFrame { delta: 2.0 }).await;
        bus.close();

        let decay = handle.join().await.unwrap();
        assert_eq!(decay.tracked().len(), 2);
        assert!((decay.tracked().require(Entity(2), "lifetime").0.0 - 1.0).abs() < 1e-9);

        queues.rotate();
        assert!(matches!(
            queues.pop_current(),
            Some(Event::EntityRemoved { entity: Entity(1) })
        ));
        assert!(queues.pop_current().is_none());
    }

    #[tokio::test]
    async fn test_removed_entities_stop_running() {
        let (commands, _queues) = commands();
        let counted = BehaviorSystem::new(
            "count",
            commands,
            |_: &Commands, _: &Delivery, _, _, (life,): &mut (Lifetime,)| life.0 += 1.0,
        );

        let mut bus = EventBus::new(BusConfig::default()).unwrap();
        let handle = SystemRunner::new(counted, bus.subscribe("count").unwrap()).spawn();

        bus.publish(Event::entity_added(Entity(1), bundle![Lifetime(0.0)])).await;
        bus.publish(Event::BeginFrame { delta: 0.0 }).await;
        bus.publish(Event::EntityRemoved { entity: Entity(1) }).await;
        bus.publish(Event::BeginFrame { delta: 0.0 }).await;
        bus.close();

        let counted = handle.join().await.unwrap();
        assert!(counted.tracked().is_empty());
    }
}
