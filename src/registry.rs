//! Service registry
//!
//! The `ServiceRegistry` holds registration records and the singleton cache.
//! Its public surface is registration only; resolution lives in the
//! [`Resolver`](crate::Resolver) extension trait.

use crate::factory::Registration;
use crate::metadata::metadata;
use crate::storage::{CachedInstance, Registrations, SingletonCache};
use crate::{DiError, Inject, Injectable, Lifetime, Result, ServiceId};
use std::any::Any;
use std::sync::{Arc, Weak};

#[cfg(feature = "logging")]
use tracing::debug;

/// Registry of services and their construction rules.
///
/// Always lives behind an `Arc`: it registers itself as a singleton on
/// creation so services can declare a dependency on it. That entry does not
/// own the registry.
///
/// # Examples
///
/// ```rust
/// use service_provider::{injectable, Resolver, ServiceRegistry};
///
/// struct Database { url: String }
/// injectable!(Database);
///
/// let registry = ServiceRegistry::new();
/// registry
///     .register_singleton(|| Database { url: "postgres://localhost".into() })
///     .unwrap();
///
/// let db = registry.resolve::<Database>().unwrap();
/// assert_eq!(db.url, "postgres://localhost");
/// ```
pub struct ServiceRegistry {
    pub(crate) records: Registrations,
    pub(crate) singletons: SingletonCache,
}

impl ServiceRegistry {
    /// Create a new registry.
    #[inline]
    pub fn new() -> Arc<Self> {
        Self::with_capacity(0)
    }

    /// Create a registry with pre-allocated capacity.
    ///
    /// Use this when you know approximately how many services will be registered.
    pub fn with_capacity(capacity: usize) -> Arc<Self> {
        let registry = Arc::new_cyclic(|this: &Weak<ServiceRegistry>| {
            let registry = ServiceRegistry {
                records: Registrations::with_capacity(capacity),
                singletons: SingletonCache::with_capacity(capacity),
            };

            let id = ServiceId::of::<ServiceRegistry>();
            let this: Weak<dyn Any + Send + Sync> = this.clone();
            registry.records.insert_new(Registration::provided(id), || {
                registry.singletons.seed(id, CachedInstance::Borrowed(this));
            });

            registry
        });

        #[cfg(feature = "logging")]
        debug!(
            target: "service_provider",
            capacity,
            "Creating new service registry"
        );

        registry
    }

    // =========================================================================
    // Registration Methods
    // =========================================================================

    /// Register a singleton service.
    ///
    /// `factory` runs on first resolve; the injected, initialised instance is
    /// then shared across all resolves. Constructor arguments are whatever
    /// the closure captures.
    ///
    /// Fails with [`DiError::AlreadyRegistered`] if `T` is already registered;
    /// the existing registration is left untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use service_provider::{injectable, DiError, ServiceRegistry};
    ///
    /// struct Cache { size: usize }
    /// injectable!(Cache);
    ///
    /// let registry = ServiceRegistry::new();
    /// registry.register_singleton(|| Cache { size: 1024 }).unwrap();
    ///
    /// let again = registry.register_singleton(|| Cache { size: 1 });
    /// assert!(matches!(again, Err(DiError::AlreadyRegistered { .. })));
    /// ```
    #[inline]
    pub fn register_singleton<T: Inject, F>(&self, factory: F) -> Result<&Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        metadata().declare::<T>();
        self.register(Registration::with_factory(Lifetime::Singleton, factory), None)?;
        Ok(self)
    }

    /// Register a transient service.
    ///
    /// `factory` runs on every resolve and each instance is injected and
    /// initialised on its own.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use service_provider::{injectable, Resolver, ServiceRegistry};
    /// use std::sync::atomic::{AtomicU64, Ordering};
    ///
    /// static COUNTER: AtomicU64 = AtomicU64::new(0);
    ///
    /// struct RequestId(u64);
    /// injectable!(RequestId);
    ///
    /// let registry = ServiceRegistry::new();
    /// registry
    ///     .register_transient(|| RequestId(COUNTER.fetch_add(1, Ordering::SeqCst)))
    ///     .unwrap();
    ///
    /// let id1 = registry.resolve::<RequestId>().unwrap();
    /// let id2 = registry.resolve::<RequestId>().unwrap();
    /// assert_ne!(id1.0, id2.0);
    /// ```
    #[inline]
    pub fn register_transient<T: Inject, F>(&self, factory: F) -> Result<&Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        metadata().declare::<T>();
        self.register(Registration::with_factory(Lifetime::Transient, factory), None)?;
        Ok(self)
    }

    /// Register an already constructed singleton.
    ///
    /// The instance is cached as-is: no field injection, no lifecycle hook.
    #[inline]
    pub fn register_instance<T: Injectable>(&self, instance: T) -> Result<&Self> {
        let instance = CachedInstance::Shared(Arc::new(instance));
        self.register(Registration::provided(ServiceId::of::<T>()), Some(instance))?;
        Ok(self)
    }

    fn register(&self, record: Registration, instance: Option<CachedInstance>) -> Result<()> {
        let id = record.id;

        #[cfg(feature = "logging")]
        let lifetime = record.lifetime;

        let inserted = self.records.insert_new(record, || {
            if let Some(instance) = instance {
                self.singletons.seed(id, instance);
            }
        });

        if !inserted {
            #[cfg(feature = "logging")]
            debug!(
                target: "service_provider",
                service = id.name(),
                "Rejecting duplicate registration"
            );
            return Err(DiError::already_registered(id));
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "service_provider",
            service = id.name(),
            lifetime = lifetime.as_str(),
            service_count = self.records.len(),
            "Registered service"
        );

        Ok(())
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// Check if a service is registered.
    #[inline]
    pub fn contains<T: Injectable>(&self) -> bool {
        self.records.contains(&ServiceId::of::<T>())
    }

    /// The lifetime `T` was registered with, if any.
    #[inline]
    pub fn lifetime_of<T: Injectable>(&self) -> Option<Lifetime> {
        self.records
            .get(&ServiceId::of::<T>())
            .map(|record| record.lifetime)
    }

    /// All registered identities, including the registry itself.
    pub fn registered(&self) -> Vec<ServiceId> {
        self.records.ids()
    }

    /// Number of registrations, including the registry itself.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always `false`: the registry registers itself.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.len() == 0
    }

    /// Number of singletons constructed (or supplied) so far.
    #[inline]
    pub fn cached_count(&self) -> usize {
        self.singletons.len()
    }
}

impl Inject for ServiceRegistry {}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("service_count", &self.len())
            .field("cached", &self.cached_count())
            .finish()
    }
}
