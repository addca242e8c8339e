//! Type-erased component bundles.
//!
//! A [`ComponentBundle`] is the set of components an entity is created with:
//! one value per component kind. It is built once, moved into the
//! `EntityAdded` event and then only read. Interest shapes pull typed copies
//! out of it with [`ComponentBundle::get`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::component::{Component, ComponentTypeId};
use crate::violation::protocol_violation;

/// One stored component value plus the name it was registered under.
#[derive(Clone)]
struct Slot {
    name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

/// Mapping from component kind to one component value.
#[derive(Clone, Default)]
pub struct ComponentBundle {
    slots: HashMap<ComponentTypeId, Slot>,
}

impl ComponentBundle {
    /// Create an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component, builder style.
    #[must_use]
    pub fn with<T: Component>(mut self, component: T) -> Self {
        self.insert(component);
        self
    }

    /// Add a component. A second value of the same kind replaces the first;
    /// that is a caller error and is logged.
    pub fn insert<T: Component>(&mut self, component: T) {
        let slot = Slot {
            name: T::type_name(),
            value: Arc::new(component),
        };
        if self.slots.insert(T::component_type_id(), slot).is_some() {
            warn!(
                component = T::type_name(),
                "duplicate component kind in bundle, keeping the last value"
            );
        }
    }

    /// Borrow the component of kind `T`, if present.
    ///
    /// A slot whose kind id matches but whose Rust type differs means two
    /// component types share a name, which is a protocol violation.
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<&T> {
        let slot = self.slots.get(&T::component_type_id())?;
        match slot.value.downcast_ref::<T>() {
            Some(value) => Some(value),
            None => protocol_violation(format_args!(
                "component kind `{}` is registered by two different types",
                slot.name
            )),
        }
    }

    /// Returns `true` if the bundle carries a component of the given kind.
    #[must_use]
    pub fn contains(&self, kind: ComponentTypeId) -> bool {
        self.slots.contains_key(&kind)
    }

    /// Returns `true` if the bundle carries every kind in `kinds`.
    #[must_use]
    pub fn contains_all(&self, kinds: &[ComponentTypeId]) -> bool {
        kinds.iter().all(|kind| self.contains(*kind))
    }

    /// Number of components in the bundle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the bundle has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for ComponentBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.slots.values().map(|slot| slot.name).collect();
        names.sort_unstable();
        f.debug_struct("ComponentBundle")
            .field("components", &names)
            .finish()
    }
}

/// Build a [`ComponentBundle`] from a list of components.
///
/// ```rust
/// use engine_component::{bundle, Component};
///
/// #[derive(Clone)]
/// struct Wallet(i64);
/// impl Component for Wallet {
///     fn type_name() -> &'static str { "Wallet" }
/// }
///
/// let components = bundle![Wallet(100)];
/// assert_eq!(components.get::<Wallet>().map(|w| w.0), Some(100));
/// ```
#[macro_export]
macro_rules! bundle {
    () => {
        $crate::ComponentBundle::new()
    };
    ($($component:expr),+ $(,)?) => {{
        let mut bundle = $crate::ComponentBundle::new();
        $(bundle.insert($component);)+
        bundle
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    impl Component for Position {
        fn type_name() -> &'static str {
            "Position"
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Wallet {
        balance: i64,
    }

    impl Component for Wallet {
        fn type_name() -> &'static str {
            "Wallet"
        }
    }

    #[derive(Debug, Clone)]
    struct Impostor;

    impl Component for Impostor {
        fn type_name() -> &'static str {
            "Wallet"
        }
    }

    #[test]
    fn test_get_present_and_absent() {
        let bundle = ComponentBundle::new().with(Position { x: 1.0, y: 2.0 });
        assert_eq!(bundle.get::<Position>(), Some(&Position { x: 1.0, y: 2.0 }));
        assert!(bundle.get::<Wallet>().is_none());
        assert_eq!(bundle.len(), 1);
    }

    #[test]
    fn test_duplicate_kind_last_write_wins() {
        let bundle = bundle![Wallet { balance: 1 }, Wallet { balance: 2 }];
        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle.get::<Wallet>().unwrap().balance, 2);
    }

    #[test]
    fn test_contains_all() {
        let bundle = bundle![Position { x: 0.0, y: 0.0 }, Wallet { balance: 5 }];
        assert!(bundle.contains_all(&[Position::component_type_id(), Wallet::component_type_id()]));
        assert!(!bundle.contains_all(&[ComponentTypeId::from_name("Physics")]));
        assert!(bundle.contains_all(&[]));
    }

    #[test]
    fn test_empty_macro() {
        let bundle = bundle![];
        assert!(bundle.is_empty());
    }

    #[test]
    fn test_debug_lists_sorted_names() {
        let bundle = bundle![Wallet { balance: 5 }, Position { x: 0.0, y: 0.0 }];
        assert_eq!(
            format!("{bundle:?}"),
            r#"ComponentBundle { components: ["Position", "Wallet"] }"#
        );
    }

    #[test]
    #[should_panic(expected = "registered by two different types")]
    fn test_name_collision_is_a_violation() {
        let bundle = bundle![Impostor];
        let _ = bundle.get::<Wallet>();
    }
}
