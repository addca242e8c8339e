//! The event vocabulary carried by the bus.
//!
//! Built-in lifecycle events are variants of the closed [`Event`] enum. Any
//! other event a system wants to send is a [`UserEvent`], carried inside
//! [`Event::User`] and recovered by kind with [`Event::downcast`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use engine_component::{ComponentBundle, Entity, Interest, InterestSet, fnv1a_64, protocol_violation};
use serde::{Deserialize, Serialize};

/// Identity of an event kind, the FNV-1a 64-bit hash of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKind(pub u64);

impl EventKind {
    /// Kind of [`Event::Setup`].
    pub const SETUP: EventKind = EventKind::from_name("Setup");
    /// Kind of [`Event::BeginFrame`].
    pub const BEGIN_FRAME: EventKind = EventKind::from_name("BeginFrame");
    /// Kind of [`Event::EndFrame`].
    pub const END_FRAME: EventKind = EventKind::from_name("EndFrame");
    /// Kind of [`Event::EntityAdded`].
    pub const ENTITY_ADDED: EventKind = EventKind::from_name("EntityAdded");
    /// Kind of [`Event::EntityRemoved`].
    pub const ENTITY_REMOVED: EventKind = EventKind::from_name("EntityRemoved");

    /// Compute the kind for an event name.
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        Self(fnv1a_64(name))
    }

    /// The kind of user event `E`.
    #[must_use]
    pub const fn of<E: UserEvent>() -> Self {
        Self::from_name(E::NAME)
    }
}

/// A system-defined event payload.
///
/// ```rust
/// use engine_bus::{Event, UserEvent};
///
/// #[derive(Debug)]
/// struct Explode { radius: f32 }
///
/// impl UserEvent for Explode {
///     const NAME: &'static str = "Explode";
/// }
///
/// let event = Event::user(Explode { radius: 2.0 });
/// assert_eq!(event.downcast::<Explode>().map(|e| e.radius), Some(2.0));
/// ```
pub trait UserEvent: fmt::Debug + Send + Sync + 'static {
    /// Unique name of this event kind.
    const NAME: &'static str;
}

trait ErasedEvent: fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<E: UserEvent> ErasedEvent for E {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A type-erased [`UserEvent`] plus its kind.
#[derive(Clone)]
pub struct UserPayload {
    kind: EventKind,
    name: &'static str,
    value: Arc<dyn ErasedEvent>,
}

impl UserPayload {
    /// Kind of the carried event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Name of the carried event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Borrow the payload as `E` if it is of that kind.
    #[must_use]
    pub fn downcast<E: UserEvent>(&self) -> Option<&E> {
        if self.kind != EventKind::of::<E>() {
            return None;
        }
        match self.value.as_any().downcast_ref::<E>() {
            Some(event) => Some(event),
            None => protocol_violation(format_args!(
                "event kind `{}` is registered by two different types",
                self.name
            )),
        }
    }
}

impl fmt::Debug for UserPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.value, f)
    }
}

/// One event as seen by every subscriber.
#[derive(Debug, Clone)]
pub enum Event {
    /// Published exactly once before the first frame.
    Setup,
    /// A frame has started; `delta` is seconds since the previous frame.
    BeginFrame {
        /// Seconds elapsed since the previous frame started.
        delta: f64,
    },
    /// Every event of the frame has settled.
    EndFrame {
        /// Same delta as the matching [`Event::BeginFrame`].
        delta: f64,
    },
    /// An entity was created with the given components.
    EntityAdded {
        /// The new entity.
        entity: Entity,
        /// Components the entity was created with.
        components: Arc<ComponentBundle>,
    },
    /// An entity was destroyed.
    EntityRemoved {
        /// The removed entity.
        entity: Entity,
    },
    /// A system-defined event.
    User(UserPayload),
}

impl Event {
    /// Wrap a user event.
    #[must_use]
    pub fn user<E: UserEvent>(event: E) -> Self {
        Event::User(UserPayload {
            kind: EventKind::of::<E>(),
            name: E::NAME,
            value: Arc::new(event),
        })
    }

    /// Build an [`Event::EntityAdded`].
    #[must_use]
    pub fn entity_added(entity: Entity, components: ComponentBundle) -> Self {
        Event::EntityAdded {
            entity,
            components: Arc::new(components),
        }
    }

    /// Borrow the payload as user event `E`, if this is one.
    #[must_use]
    pub fn downcast<E: UserEvent>(&self) -> Option<&E> {
        match self {
            Event::User(payload) => payload.downcast::<E>(),
            _ => None,
        }
    }

    /// The kind of this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Setup => EventKind::SETUP,
            Event::BeginFrame { .. } => EventKind::BEGIN_FRAME,
            Event::EndFrame { .. } => EventKind::END_FRAME,
            Event::EntityAdded { .. } => EventKind::ENTITY_ADDED,
            Event::EntityRemoved { .. } => EventKind::ENTITY_REMOVED,
            Event::User(payload) => payload.kind,
        }
    }

    /// Human-readable name of this event's kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Event::Setup => "Setup",
            Event::BeginFrame { .. } => "BeginFrame",
            Event::EndFrame { .. } => "EndFrame",
            Event::EntityAdded { .. } => "EntityAdded",
            Event::EntityRemoved { .. } => "EntityRemoved",
            Event::User(payload) => payload.name,
        }
    }

    /// Apply entity lifecycle events to an interest set.
    ///
    /// `EntityAdded` projects the bundle into the set, `EntityRemoved` evicts.
    /// Returns `true` if the set changed.
    pub fn track<S: Interest>(&self, set: &mut InterestSet<S>) -> bool {
        match self {
            Event::EntityAdded { entity, components } => set.observe(*entity, components).is_some(),
            Event::EntityRemoved { entity } => set.evict(*entity).is_some(),
            _ => false,
        }
    }
}
