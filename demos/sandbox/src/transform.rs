//! Positions and parenting.
//!
//! The transform system owns the authoritative copy of every [`Transform2D`].
//! Moving an entity moves its children by the same offset: each child gets
//! its own [`Translate`] follow-up, so the whole subtree has moved before the
//! event that started it is complete.

use std::collections::{BTreeMap, BTreeSet};

use engine_bus::{Delivery, Event};
use engine_component::{Entity, InterestSet, protocol_violation};
use engine_math::Transform2D;
use engine_system::System;
use tracing::{debug, trace};

use crate::events::{SetParent, Translate};

/// Tracks transforms and propagates movement to children.
#[derive(Debug, Default)]
pub struct TransformSystem {
    transforms: InterestSet<(Transform2D,)>,
    children: BTreeMap<Entity, BTreeSet<Entity>>,
}

impl TransformSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current transform of `entity`.
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&Transform2D> {
        self.transforms.get(entity).map(|(transform,)| transform)
    }

    /// The entities directly parented to `entity`, in id order.
    pub fn children_of(&self, entity: Entity) -> impl Iterator<Item = Entity> + '_ {
        self.children.get(&entity).into_iter().flatten().copied()
    }

    /// Returns `true` if `ancestor` is `entity` or one of its parents.
    fn is_ancestor(&self, ancestor: Entity, entity: Entity) -> bool {
        let mut current = entity;
        while current.is_valid() {
            if current == ancestor {
                return true;
            }
            current = self.get(current).map_or(Entity::INVALID, |transform| transform.parent);
        }
        false
    }

    fn set_parent(&mut self, child: Entity, parent: Entity) {
        if child == parent {
            protocol_violation(format_args!("{child} cannot be its own parent"));
        }
        if self.is_ancestor(child, parent) {
            protocol_violation(format_args!("parenting {child} to {parent} would form a cycle"));
        }
        let (transform,) = self.transforms.require_mut(child, "set parent");
        let old = transform.parent;
        if old == parent {
            return;
        }
        transform.parent = parent;

        if old.is_valid()
            && let Some(siblings) = self.children.get_mut(&old)
        {
            siblings.remove(&child);
            if siblings.is_empty() {
                self.children.remove(&old);
            }
        }
        if parent.is_valid() {
            self.children.entry(parent).or_default().insert(child);
        }
        debug!(%child, %old, %parent, "parent changed");
    }

    fn added(&mut self, event: &Event, entity: Entity) {
        if !event.track(&mut self.transforms) {
            return;
        }
        // Link through `set_parent` so the children index stays in step.
        let (transform,) = self.transforms.require_mut(entity, "new transform");
        let parent = std::mem::replace(&mut transform.parent, Entity::INVALID);
        if parent.is_valid() {
            self.set_parent(entity, parent);
        }
    }

    fn removed(&mut self, entity: Entity) {
        if !self.transforms.contains(entity) {
            return;
        }
        self.set_parent(entity, Entity::INVALID);
        for orphan in self.children.remove(&entity).into_iter().flatten() {
            if let Some((transform,)) = self.transforms.get_mut(orphan) {
                transform.parent = Entity::INVALID;
            }
        }
        self.transforms.evict(entity);
    }

    fn translate(&mut self, translate: &Translate, delivery: &Delivery) {
        let (transform,) = self.transforms.require_mut(translate.entity, "translate");
        let offset = translate.apply(transform);
        trace!(entity = %translate.entity, x = offset.x, y = offset.y, "translated");
        for child in self.children_of(translate.entity) {
            delivery.emit(Event::user(Translate::by(child, offset)));
        }
    }
}

impl System for TransformSystem {
    fn name(&self) -> &str {
        "transform"
    }

    async fn handle(&mut self, delivery: &Delivery) {
        let event = delivery.event();
        match event {
            Event::EntityAdded { entity, .. } => self.added(event, *entity),
            Event::EntityRemoved { entity } => self.removed(*entity),
            _ => {
                if let Some(translate) = event.downcast::<Translate>() {
                    self.translate(translate, delivery);
                } else if let Some(set) = event.downcast::<SetParent>() {
                    self.set_parent(set.entity, set.parent);
                }
            }
        }
    }
}
