//! Core [`Component`] trait and kind identity.
//!
//! Every piece of data attached to an entity must implement [`Component`].
//! The trait requires `Clone + Send + Sync + 'static`: bundles are shared
//! across subscriber tasks and every subscriber clones the values it projects
//! into its own interest sets.
//!
//! ## Kind Identity
//!
//! [`ComponentTypeId`] is derived from the component's **string name** using
//! the FNV-1a 64-bit hash algorithm. Matching a bundle against an interest
//! shape is purely structural: two values are the same kind iff their names
//! hash to the same id.

use serde::{Deserialize, Serialize};

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Hash a name with FNV-1a 64-bit.
///
/// ```text
/// hash = 0xcbf29ce484222325          (offset basis)
/// for each byte in name.as_bytes():
///     hash = hash XOR byte
///     hash = hash * 0x00000100000001b3  (prime)
/// return hash
/// ```
#[must_use]
pub const fn fnv1a_64(name: &str) -> u64 {
    let bytes = name.as_bytes();
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// A unique identifier for a component kind, derived from its string name
/// using the FNV-1a 64-bit hash algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

impl ComponentTypeId {
    /// Compute the [`ComponentTypeId`] from a component's string name.
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        Self(fnv1a_64(name))
    }

    /// Compute the [`ComponentTypeId`] for a Rust component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self::from_name(T::type_name())
    }
}

impl std::fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// The core component trait.
///
/// # Examples
///
/// ```rust
/// use engine_component::Component;
///
/// #[derive(Debug, Clone)]
/// struct Wallet {
///     balance: i64,
/// }
///
/// impl Component for Wallet {
///     fn type_name() -> &'static str { "Wallet" }
/// }
/// ```
pub trait Component: Clone + Send + Sync + 'static {
    /// A human-readable name for this component kind.
    fn type_name() -> &'static str;

    /// Returns the [`ComponentTypeId`] for this component.
    fn component_type_id() -> ComponentTypeId {
        ComponentTypeId::from_name(Self::type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Health {
        current: f32,
        max: f32,
    }

    impl Component for Health {
        fn type_name() -> &'static str {
            "Health"
        }
    }

    #[derive(Debug, Clone)]
    struct Velocity {
        x: f32,
        y: f32,
    }

    impl Component for Velocity {
        fn type_name() -> &'static str {
            "Velocity"
        }
    }

    #[test]
    fn test_component_type_id_matches_from_name() {
        assert_eq!(Health::component_type_id(), ComponentTypeId::from_name("Health"));
        assert_eq!(ComponentTypeId::of::<Health>(), Health::component_type_id());
    }

    #[test]
    fn test_component_type_id_differs_between_types() {
        let _ = Velocity { x: 0.0, y: 0.0 };
        assert_ne!(Health::component_type_id(), Velocity::component_type_id());
    }

    #[test]
    fn test_fnv1a_known_vectors() {
        // FNV-1a 64-bit of the empty string is the offset basis itself.
        assert_eq!(fnv1a_64(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a_64("a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!(ComponentTypeId(0xff).to_string(), "0x00000000000000ff");
    }
}
