//! Storage for registration records and constructed singletons
//!
//! Uses DashMap for lock-free concurrent access. Lookups hand out cloned
//! `Arc`s so no shard guard is ever held while a factory runs; resolution
//! re-enters the same maps recursively.

use crate::factory::Registration;
use crate::ServiceId;
use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::any::Any;
use std::sync::{Arc, Weak};

/// Shard count for a given expected capacity.
///
/// Default DashMap uses num_cpus * 4 shards which is overkill for
/// typical containers with <50 services.
fn shard_amount(capacity: usize) -> usize {
    if capacity <= 16 {
        8
    } else if capacity <= 64 {
        16
    } else {
        32
    }
}

/// Registration records keyed by identity. At most one record per identity.
pub(crate) struct Registrations {
    records: DashMap<ServiceId, Arc<Registration>, RandomState>,
}

impl Registrations {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shard_amount(capacity),
            ),
        }
    }

    /// Insert a record unless its identity is taken. Returns `false` and
    /// leaves the map untouched on collision.
    ///
    /// `on_insert` runs before the record becomes visible to lookups.
    #[inline]
    pub(crate) fn insert_new(&self, record: Registration, on_insert: impl FnOnce()) -> bool {
        match self.records.entry(record.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                on_insert();
                slot.insert(Arc::new(record));
                true
            }
        }
    }

    #[inline]
    pub(crate) fn get(&self, id: &ServiceId) -> Option<Arc<Registration>> {
        self.records.get(id).map(|record| Arc::clone(record.value()))
    }

    #[inline]
    pub(crate) fn contains(&self, id: &ServiceId) -> bool {
        self.records.contains_key(id)
    }

    pub(crate) fn ids(&self) -> Vec<ServiceId> {
        self.records.iter().map(|record| *record.key()).collect()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}

/// A cached singleton.
pub(crate) enum CachedInstance {
    /// Owned by the cache
    Shared(Arc<dyn Any + Send + Sync>),
    /// Owned elsewhere; used for the registry's own entry so the registry
    /// does not keep itself alive
    Borrowed(Weak<dyn Any + Send + Sync>),
}

impl CachedInstance {
    #[inline]
    pub(crate) fn get(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        match self {
            CachedInstance::Shared(instance) => Some(Arc::clone(instance)),
            CachedInstance::Borrowed(instance) => instance.upgrade(),
        }
    }
}

/// Identity to constructed singleton. Entries are filled at most once and
/// never removed.
pub(crate) struct SingletonCache {
    cells: DashMap<ServiceId, Arc<OnceCell<CachedInstance>>, RandomState>,
}

impl SingletonCache {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shard_amount(capacity),
            ),
        }
    }

    /// The cached instance, if the identity has been filled
    #[inline]
    pub(crate) fn get(&self, id: &ServiceId) -> Option<Arc<dyn Any + Send + Sync>> {
        self.cells
            .get(id)
            .and_then(|cell| cell.value().get().and_then(CachedInstance::get))
    }

    /// The once-cell for an identity, created empty on first use.
    ///
    /// Filling goes through the returned cell after the shard guard is
    /// released.
    #[inline]
    pub(crate) fn cell(&self, id: ServiceId) -> Arc<OnceCell<CachedInstance>> {
        Arc::clone(self.cells.entry(id).or_default().value())
    }

    /// Fill an identity up front. Returns `false` if it was already filled.
    pub(crate) fn seed(&self, id: ServiceId, instance: CachedInstance) -> bool {
        self.cell(id).set(instance).is_ok()
    }

    /// Number of filled entries
    pub(crate) fn len(&self) -> usize {
        self.cells.iter().filter(|cell| cell.value().get().is_some()).count()
    }
}

impl std::fmt::Debug for SingletonCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingletonCache")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Inject, Lifetime};

    struct TestService {
        value: i32,
    }
    impl Inject for TestService {}

    #[test]
    fn test_insert_rejects_duplicate_identity() {
        let records = Registrations::with_capacity(0);

        let singleton = Registration::with_factory(Lifetime::Singleton, || TestService { value: 1 });
        assert!(records.insert_new(singleton, || {}));

        let mut ran = false;
        let transient = Registration::with_factory(Lifetime::Transient, || TestService { value: 2 });
        assert!(!records.insert_new(transient, || ran = true));
        assert!(!ran);

        // First registration is intact
        let record = records.get(&ServiceId::of::<TestService>()).unwrap();
        assert_eq!(record.lifetime, Lifetime::Singleton);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_cache_fill_once() {
        let cache = SingletonCache::with_capacity(0);
        let id = ServiceId::of::<TestService>();

        assert!(cache.get(&id).is_none());

        let first = Arc::new(TestService { value: 42 });
        assert!(cache.seed(id, CachedInstance::Shared(first)));
        assert!(!cache.seed(id, CachedInstance::Shared(Arc::new(TestService { value: 0 }))));

        let cached = cache.get(&id).unwrap().downcast::<TestService>().ok().unwrap();
        assert_eq!(cached.value, 42);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_borrowed_entry_does_not_own() {
        let cache = SingletonCache::with_capacity(0);
        let id = ServiceId::of::<TestService>();

        let owner: Arc<dyn Any + Send + Sync> = Arc::new(TestService { value: 7 });
        cache.seed(id, CachedInstance::Borrowed(Arc::downgrade(&owner)));
        assert!(cache.get(&id).is_some());

        drop(owner);
        assert!(cache.get(&id).is_none());
    }

    #[test]
    fn test_shard_amount_scales() {
        assert_eq!(shard_amount(0), 8);
        assert_eq!(shard_amount(32), 16);
        assert_eq!(shard_amount(1000), 32);
    }
}
