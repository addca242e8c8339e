//! Handles a system keeps to act on the world outside its own handler.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use engine_bus::{Event, FrameQueues};
use engine_component::{ComponentBundle, Entity, EntityAllocator};
use tracing::info;

use crate::entities::EntityRegistry;

/// Shared "keep running" flag of a tick loop.
///
/// The tick loop checks it at the top of every frame; any holder can clear
/// it.
#[derive(Debug, Clone)]
pub struct RunFlag(Arc<AtomicBool>);

impl RunFlag {
    /// A flag in the running state.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Returns `true` until [`RunFlag::stop`] is called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Ask the tick loop to stop before its next frame.
    pub fn stop(&self) {
        if self.0.swap(false, Ordering::AcqRel) {
            info!("stop requested");
        }
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a system may do besides emitting immediate follow-ups:
/// schedule events for later in this frame or the next one, create and
/// destroy entities, and stop the loop.
///
/// Cheap to clone; every system gets its own copy.
#[derive(Debug, Clone)]
pub struct Commands {
    queues: Arc<FrameQueues>,
    entities: EntityRegistry,
    run: RunFlag,
}

impl Commands {
    /// Build a command handle over a tick loop's shared state.
    #[must_use]
    pub fn new(queues: Arc<FrameQueues>, allocator: Arc<EntityAllocator>, run: RunFlag) -> Self {
        let entities = EntityRegistry::new(allocator, Arc::clone(&queues));
        Self {
            queues,
            entities,
            run,
        }
    }

    /// Deliver `event` during the next frame's drain.
    pub fn schedule_next_frame(&self, event: Event) {
        self.queues.push_next_frame(event);
    }

    /// Deliver `event` later during the current frame's drain.
    ///
    /// Called outside a drain (from a `BeginFrame` or `EndFrame` handler) the
    /// event is delivered in the next drain, after that drain's next-frame
    /// events.
    pub fn schedule_this_frame(&self, event: Event) {
        self.queues.push_this_frame(event);
    }

    /// Create an entity; see [`EntityRegistry::create`].
    pub fn create(&self, components: ComponentBundle) -> Entity {
        self.entities.create(components)
    }

    /// Destroy an entity; see [`EntityRegistry::destroy`].
    pub fn destroy(&self, entity: Entity) {
        self.entities.destroy(entity);
    }

    /// The entity registry.
    #[must_use]
    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    /// The run flag of the owning tick loop.
    #[must_use]
    pub fn run_flag(&self) -> &RunFlag {
        &self.run
    }

    /// Ask the tick loop to stop.
    pub fn stop(&self) {
        self.run.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands() -> (Commands, Arc<FrameQueues>) {
        let queues = Arc::new(FrameQueues::new());
        let commands = Commands::new(
            Arc::clone(&queues),
            Arc::new(EntityAllocator::new()),
            RunFlag::new(),
        );
        (commands, queues)
    }

    #[test]
    fn test_run_flag_is_shared() {
        let flag = RunFlag::new();
        let other = flag.clone();
        assert!(flag.is_running());
        other.stop();
        assert!(!flag.is_running());
        other.stop();
        assert!(!flag.is_running());
    }

    #[test]
    fn test_scheduling_targets_the_right_queue() {
        let (commands, queues) = commands();
        commands.schedule_this_frame(Event::Setup);
        commands.schedule_next_frame(Event::Setup);
        commands.schedule_next_frame(Event::Setup);
        assert_eq!(queues.pending(), (1, 2));
    }

    #[test]
    fn test_clones_share_allocator_and_flag() {
        let (commands, _queues) = commands();
        let clone = commands.clone();
        let a = commands.create(ComponentBundle::new());
        let b = clone.create(ComponentBundle::new());
        assert_ne!(a, b);
        assert_eq!(commands.entities().created(), 2);

        clone.stop();
        assert!(!commands.run_flag().is_running());
    }
}
