//! Interest sets: a system's private, strongly typed view of entities.
//!
//! A system declares the *shape* it cares about (a fixed set of required
//! component kinds) by implementing [`Interest`], either through a tuple of
//! components or a named struct generated by [`interest!`]. When an entity is
//! added, [`InterestSet::observe`] tries to build that shape from the entity's
//! bundle. The build is all-or-nothing: if any required kind is missing the
//! entity is simply not tracked. That is an expected outcome, not an error.

use std::collections::BTreeMap;
use std::collections::btree_map;

use tracing::trace;

use crate::bundle::ComponentBundle;
use crate::component::{Component, ComponentTypeId};
use crate::entity::Entity;
use crate::violation::protocol_violation;

/// A shape that can be projected out of a [`ComponentBundle`].
pub trait Interest: Sized + Send + 'static {
    /// The component kinds this shape requires, in declaration order.
    fn required() -> Vec<ComponentTypeId>;

    /// Build the shape from `bundle`, or `None` if any required kind is
    /// absent.
    fn project(bundle: &ComponentBundle) -> Option<Self>;
}

/// Project `bundle` into shape `S`.
#[must_use]
pub fn project<S: Interest>(bundle: &ComponentBundle) -> Option<S> {
    S::project(bundle)
}

macro_rules! impl_interest_for_tuple {
    ($($component:ident),+) => {
        impl<$($component: Component),+> Interest for ($($component,)+) {
            fn required() -> Vec<ComponentTypeId> {
                vec![$($component::component_type_id()),+]
            }

            fn project(bundle: &ComponentBundle) -> Option<Self> {
                Some(($(bundle.get::<$component>()?.clone(),)+))
            }
        }
    };
}

impl_interest_for_tuple!(A);
impl_interest_for_tuple!(A, B);
impl_interest_for_tuple!(A, B, C);
impl_interest_for_tuple!(A, B, C, D);
impl_interest_for_tuple!(A, B, C, D, E);
impl_interest_for_tuple!(A, B, C, D, E, F);
impl_interest_for_tuple!(A, B, C, D, E, F, G);
impl_interest_for_tuple!(A, B, C, D, E, F, G, H);

/// Declare a named interest shape.
///
/// Every field must be a [`Component`]; the generated [`Interest`] impl looks
/// each one up in the bundle by kind and clones it.
///
/// ```rust
/// use engine_component::{bundle, interest, Component, Interest};
///
/// #[derive(Debug, Clone)]
/// struct Wallet { balance: i64 }
/// impl Component for Wallet {
///     fn type_name() -> &'static str { "Wallet" }
/// }
///
/// interest! {
///     #[derive(Debug)]
///     pub struct Account {
///         pub wallet: Wallet,
///     }
/// }
///
/// let account = Account::project(&bundle![Wallet { balance: 3 }]).unwrap();
/// assert_eq!(account.wallet.balance, 3);
/// ```
#[macro_export]
macro_rules! interest {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )+
        }

        impl $crate::Interest for $name {
            fn required() -> ::std::vec::Vec<$crate::ComponentTypeId> {
                ::std::vec![$(<$ty as $crate::Component>::component_type_id()),+]
            }

            fn project(bundle: &$crate::ComponentBundle) -> ::std::option::Option<Self> {
                ::std::option::Option::Some(Self {
                    $($field: ::std::clone::Clone::clone(bundle.get::<$ty>()?),)+
                })
            }
        }
    };
}

/// A system-private map from entity to its projected shape.
///
/// Iteration is in ascending entity order so that anything a system emits
/// while walking its set is deterministic.
#[derive(Debug)]
pub struct InterestSet<S> {
    entries: BTreeMap<Entity, S>,
}

impl<S> Default for InterestSet<S> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<S: Interest> InterestSet<S> {
    /// Create an empty interest set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to project `bundle` into `S` and track it under `entity`.
    ///
    /// Returns the stored entry on a match, replacing any previous entry for
    /// the same entity. Returns `None` (and stores nothing) otherwise.
    pub fn observe(&mut self, entity: Entity, bundle: &ComponentBundle) -> Option<&mut S> {
        // Reject on kinds alone before cloning anything.
        let shape = if bundle.contains_all(&S::required()) {
            S::project(bundle)
        } else {
            None
        };
        let Some(shape) = shape else {
            trace!(%entity, shape = std::any::type_name::<S>(), "entity does not match shape");
            return None;
        };
        trace!(%entity, shape = std::any::type_name::<S>(), "entity tracked");
        let slot = match self.entries.entry(entity) {
            btree_map::Entry::Vacant(vacant) => vacant.insert(shape),
            btree_map::Entry::Occupied(mut occupied) => {
                occupied.insert(shape);
                occupied.into_mut()
            }
        };
        Some(slot)
    }

    /// Stop tracking `entity`. Idempotent.
    pub fn evict(&mut self, entity: Entity) -> Option<S> {
        self.entries.remove(&entity)
    }
}

impl<S> InterestSet<S> {
    /// Borrow the entry for `entity`.
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&S> {
        self.entries.get(&entity)
    }

    /// Mutably borrow the entry for `entity`.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut S> {
        self.entries.get_mut(&entity)
    }

    /// Borrow the entry for `entity`, treating absence as a wiring bug.
    #[track_caller]
    pub fn require(&self, entity: Entity, what: &str) -> &S {
        match self.entries.get(&entity) {
            Some(entry) => entry,
            None => protocol_violation(format_args!("{what}: {entity} is not tracked")),
        }
    }

    /// Mutably borrow the entry for `entity`, treating absence as a wiring
    /// bug.
    #[track_caller]
    pub fn require_mut(&mut self, entity: Entity, what: &str) -> &mut S {
        match self.entries.get_mut(&entity) {
            Some(entry) => entry,
            None => protocol_violation(format_args!("{what}: {entity} is not tracked")),
        }
    }

    /// Returns `true` if `entity` is tracked.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entries.contains_key(&entity)
    }

    /// Number of tracked entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entity is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tracked entities in ascending order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entries.keys().copied()
    }

    /// Iterate over tracked entries.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &S)> + '_ {
        self.entries.iter().map(|(entity, shape)| (*entity, shape))
    }

    /// Iterate mutably over tracked entries.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut S)> + '_ {
        self.entries.iter_mut().map(|(entity, shape)| (*entity, shape))
    }
}
