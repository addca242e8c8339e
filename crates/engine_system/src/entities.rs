//! Entity registry.
//!
//! Creating or destroying an entity never touches subscriber state directly.
//! The registry assigns the identifier and schedules the matching lifecycle
//! event for the *next* frame, so systems only ever see fully constructed
//! entities, and only at frame boundaries.

use std::sync::Arc;

use engine_bus::{Event, FrameQueues};
use engine_component::{ComponentBundle, Entity, EntityAllocator};
use tracing::debug;

/// Creates and destroys entities by scheduling lifecycle events.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    allocator: Arc<EntityAllocator>,
    queues: Arc<FrameQueues>,
}

impl EntityRegistry {
    /// Create a registry that schedules onto `queues`.
    #[must_use]
    pub fn new(allocator: Arc<EntityAllocator>, queues: Arc<FrameQueues>) -> Self {
        Self { allocator, queues }
    }

    /// Allocate a new entity and schedule its `EntityAdded` event for the
    /// next frame. Does not wait for any subscriber.
    pub fn create(&self, components: ComponentBundle) -> Entity {
        let entity = self.allocator.allocate();
        debug!(%entity, components = components.len(), "entity created");
        self.queues.push_next_frame(Event::entity_added(entity, components));
        entity
    }

    /// Schedule an `EntityRemoved` event for the next frame.
    pub fn destroy(&self, entity: Entity) {
        debug!(%entity, "entity destroyed");
        self.queues.push_next_frame(Event::EntityRemoved { entity });
    }

    /// Number of entities created so far.
    #[must_use]
    pub fn created(&self) -> u64 {
        self.allocator.count()
    }
}
