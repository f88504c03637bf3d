//! Service identity and lifetime
//!
//! These types define what can be registered and how it is keyed.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Marker trait for types that can live in the container.
///
/// This is automatically implemented for all types that are `Send + Sync + 'static`.
/// You never need to implement this manually.
pub trait Injectable: Send + Sync + 'static {}

// Blanket implementation - everything that's Send + Sync + 'static is Injectable
impl<T: Send + Sync + 'static> Injectable for T {}

/// Typed identity of a service.
///
/// Equality and hashing only look at the `TypeId`; the type name is carried
/// for messages and logs. Two types with the same short name in different
/// modules are different services.
#[derive(Clone, Copy)]
pub struct ServiceId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ServiceId {
    /// Identity of `T`
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The underlying `TypeId`
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Full type name, e.g. `my_app::logging::Logger`
    #[inline]
    pub fn name(&self) -> &'static str {
        self.type_name
    }

    /// Whether this is the identity of `T`
    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl PartialEq for ServiceId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ServiceId {}

impl Hash for ServiceId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceId({})", self.type_name)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// Service lifetime specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// Constructed on first resolve, then shared forever
    #[default]
    Singleton,

    /// New instance constructed on every resolve
    Transient,
}

impl Lifetime {
    /// Name used in log output
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Transient => "transient",
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implement [`Inject`](crate::Inject) for leaf services that have no
/// injected fields and no lifecycle hook.
///
/// ```rust
/// use service_provider::{injectable, Resolver, ServiceRegistry};
///
/// struct Clock;
/// struct Settings { verbose: bool }
///
/// injectable!(Clock, Settings);
///
/// let registry = ServiceRegistry::new();
/// registry
///     .register_singleton(|| Clock).unwrap()
///     .register_transient(|| Settings { verbose: true }).unwrap();
///
/// assert!(registry.resolve::<Settings>().unwrap().verbose);
/// ```
#[macro_export]
macro_rules! injectable {
    ($($type:ty),+ $(,)?) => {
        $(impl $crate::Inject for $type {})+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    mod a {
        pub struct Logger;
    }

    mod b {
        pub struct Logger;
    }

    #[test]
    fn test_same_short_name_is_distinct_identity() {
        let first = ServiceId::of::<a::Logger>();
        let second = ServiceId::of::<b::Logger>();

        assert_ne!(first, second);
        assert!(first.name().ends_with("a::Logger"));
        assert!(second.name().ends_with("b::Logger"));
    }

    #[test]
    fn test_identity_hashes_by_type() {
        let mut ids = HashSet::new();
        ids.insert(ServiceId::of::<a::Logger>());
        ids.insert(ServiceId::of::<a::Logger>());
        ids.insert(ServiceId::of::<b::Logger>());

        assert_eq!(ids.len(), 2);
        assert!(ServiceId::of::<a::Logger>().is::<a::Logger>());
    }

    #[test]
    fn test_default_lifetime() {
        assert_eq!(Lifetime::default(), Lifetime::Singleton);
        assert_eq!(Lifetime::Transient.to_string(), "transient");
    }
}
