//! Dependency annotations
//!
//! Maps `(owner type, field name)` to the service that satisfies the field.
//! Annotations are declared once per type, the first time the type is
//! registered, and read by the resolver once per field per construction.

use crate::{Inject, ServiceId};
use ahash::RandomState;
use dashmap::DashMap;
use once_cell::sync::{Lazy, OnceCell};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{trace, warn};

static METADATA: Lazy<MetadataStore> = Lazy::new(MetadataStore::new);

/// The process-wide annotation store used by every registry.
#[inline]
pub fn metadata() -> &'static MetadataStore {
    &METADATA
}

/// Store of field dependency annotations.
pub struct MetadataStore {
    annotations: DashMap<(ServiceId, &'static str), ServiceId, RandomState>,
    declared: DashMap<ServiceId, Arc<OnceCell<()>>, RandomState>,
}

impl MetadataStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            annotations: DashMap::with_hasher(RandomState::new()),
            declared: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Record that `field` on `owner` is satisfied by resolving `dependency`.
    ///
    /// Re-annotating a field replaces the previous dependency.
    pub fn annotate(&self, owner: ServiceId, field: &'static str, dependency: ServiceId) {
        let previous = self.annotations.insert((owner, field), dependency);

        #[cfg(feature = "logging")]
        match previous {
            Some(previous) if previous != dependency => warn!(
                target: "service_provider",
                owner = owner.name(),
                field,
                previous = previous.name(),
                dependency = dependency.name(),
                "Field annotation replaced with a different dependency"
            ),
            _ => trace!(
                target: "service_provider",
                owner = owner.name(),
                field,
                dependency = dependency.name(),
                "Field annotated"
            ),
        }

        #[cfg(not(feature = "logging"))]
        let _ = previous;
    }

    /// The dependency recorded for `field` on `owner`, if any
    #[inline]
    pub fn lookup(&self, owner: ServiceId, field: &'static str) -> Option<ServiceId> {
        self.annotations.get(&(owner, field)).map(|entry| *entry)
    }

    /// Run `T::annotate` unless it already ran for `T` on this store.
    ///
    /// Concurrent callers wait until the annotations are recorded. Returns
    /// `true` if this call declared the type.
    pub fn declare<T: Inject>(&self) -> bool {
        let cell = Arc::clone(self.declared.entry(ServiceId::of::<T>()).or_default().value());

        let mut declared = false;
        cell.get_or_init(|| {
            T::annotate(self);
            declared = true;
        });
        declared
    }

    /// Whether `owner` has been declared
    #[inline]
    pub fn is_declared(&self, owner: ServiceId) -> bool {
        self.declared
            .get(&owner)
            .is_some_and(|cell| cell.value().get().is_some())
    }

    /// Number of recorded annotations
    #[inline]
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Whether no annotation has been recorded
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

impl Default for MetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataStore")
            .field("annotations", &self.annotations.len())
            .field("declared", &self.declared.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Logger;
    struct Clock;
    struct Connection;

    #[test]
    fn test_annotate_and_lookup() {
        let store = MetadataStore::new();
        let owner = ServiceId::of::<Connection>();

        store.annotate(owner, "logger", ServiceId::of::<Logger>());

        assert_eq!(store.lookup(owner, "logger"), Some(ServiceId::of::<Logger>()));
        assert_eq!(store.lookup(owner, "clock"), None);
        assert_eq!(store.lookup(ServiceId::of::<Logger>(), "logger"), None);
    }

    #[test]
    fn test_last_annotation_wins() {
        let store = MetadataStore::new();
        let owner = ServiceId::of::<Connection>();

        store.annotate(owner, "dep", ServiceId::of::<Logger>());
        store.annotate(owner, "dep", ServiceId::of::<Clock>());

        assert_eq!(store.lookup(owner, "dep"), Some(ServiceId::of::<Clock>()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_declare_runs_once() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        struct Annotated;

        impl Inject for Annotated {
            fn annotate(store: &MetadataStore) {
                CALLS.fetch_add(1, Ordering::SeqCst);
                store.annotate(ServiceId::of::<Self>(), "clock", ServiceId::of::<Clock>());
            }
        }

        let store = MetadataStore::new();
        assert!(!store.is_declared(ServiceId::of::<Annotated>()));

        assert!(store.declare::<Annotated>());
        assert!(!store.declare::<Annotated>());

        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        assert!(store.is_declared(ServiceId::of::<Annotated>()));
        assert_eq!(
            store.lookup(ServiceId::of::<Annotated>(), "clock"),
            Some(ServiceId::of::<Clock>())
        );
    }
}
