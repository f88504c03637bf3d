//! Resolution: construction, field injection, lifecycle hook, caching
//!
//! `Resolver` is the privileged side of [`ServiceRegistry`]: application code
//! normally goes through the [`ServiceProvider`](crate::ServiceProvider), while
//! setup code and tests import this trait to resolve against a registry
//! directly.

use crate::factory::Registration;
use crate::metadata::metadata;
use crate::storage::CachedInstance;
use crate::{DiError, Injectable, Result, ServiceId, ServiceRegistry};
use std::any::Any;
use std::cell::RefCell;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

thread_local! {
    // Services currently under construction on this thread, tagged with the
    // address of the registry constructing them.
    static RESOLVING: RefCell<Vec<(usize, ServiceId)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a service as under construction for as long as it lives.
///
/// Entering a service that is already on the stack for the same registry
/// is a dependency cycle.
struct ResolutionGuard;

impl ResolutionGuard {
    fn enter(registry: usize, id: ServiceId) -> Result<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&(registry, id)) {
                let path = stack
                    .iter()
                    .filter(|(owner, _)| *owner == registry)
                    .skip_while(|(_, entry)| *entry != id)
                    .map(|(_, entry)| entry.name())
                    .chain(std::iter::once(id.name()))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(DiError::circular(id, path));
            }
            stack.push((registry, id));
            Ok(ResolutionGuard)
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Resolution API of a registry.
pub trait Resolver {
    /// Resolve a service by identity.
    fn resolve_id(&self, id: ServiceId) -> Result<Arc<dyn Any + Send + Sync>>;

    /// Resolve a service by type.
    ///
    /// Singletons are constructed once and cached; transients are constructed
    /// on every call. Construction injects every annotated field (recursively
    /// resolving its dependency) and then runs the lifecycle hook.
    ///
    /// # Errors
    ///
    /// - [`DiError::NotRegistered`] if `T`, or a dependency, has no registration
    /// - [`DiError::CircularDependency`] if `T` transitively depends on itself
    /// - [`DiError::FieldTypeMismatch`] if an annotated field cannot hold its dependency
    #[inline]
    fn resolve<T: Injectable>(&self) -> Result<Arc<T>>
    where
        Self: Sized,
    {
        self.resolve_id(ServiceId::of::<T>())?
            .downcast::<T>()
            .map_err(|_| {
                DiError::Internal(format!(
                    "instance registered as {} has another type",
                    std::any::type_name::<T>()
                ))
            })
    }

    /// Resolve, returning `None` on any failure.
    #[inline]
    fn try_resolve<T: Injectable>(&self) -> Option<Arc<T>>
    where
        Self: Sized,
    {
        self.resolve::<T>().ok()
    }
}

impl Resolver for ServiceRegistry {
    fn resolve_id(&self, id: ServiceId) -> Result<Arc<dyn Any + Send + Sync>> {
        let Some(record) = self.records.get(&id) else {
            #[cfg(feature = "logging")]
            debug!(
                target: "service_provider",
                service = id.name(),
                "Service not registered"
            );
            return Err(DiError::not_registered(id));
        };

        if record.is_transient() {
            let _guard = ResolutionGuard::enter(self.address(), id)?;
            return self.construct(&record);
        }

        if let Some(instance) = self.singletons.get(&id) {
            #[cfg(feature = "logging")]
            trace!(
                target: "service_provider",
                service = id.name(),
                "Singleton resolved from cache"
            );
            return Ok(instance);
        }

        let _guard = ResolutionGuard::enter(self.address(), id)?;
        let cell = self.singletons.cell(id);
        let cached = cell.get_or_try_init(|| {
            self.construct(&record).map(CachedInstance::Shared)
        })?;

        cached.get().ok_or(DiError::ContainerDropped)
    }
}

impl ServiceRegistry {
    /// Stable address used to tag this registry on the resolution stack
    #[inline]
    fn address(&self) -> usize {
        self as *const Self as usize
    }

    /// Build, inject and initialise a fresh instance of `record`.
    fn construct(&self, record: &Registration) -> Result<Arc<dyn Any + Send + Sync>> {
        let id = record.id;

        #[cfg(feature = "logging")]
        trace!(
            target: "service_provider",
            service = id.name(),
            lifetime = record.lifetime.as_str(),
            "Constructing service"
        );

        // Supplied instances live in the cache; reaching here means the
        // owner is gone.
        let mut raw = record.build().ok_or(DiError::ContainerDropped)?;

        let annotations = metadata();
        for mut field in raw.fields() {
            let Some(dependency) = annotations.lookup(id, field.name()) else {
                continue;
            };

            #[cfg(feature = "logging")]
            trace!(
                target: "service_provider",
                service = id.name(),
                field = field.name(),
                dependency = dependency.name(),
                "Injecting field"
            );

            let instance = self.resolve_id(dependency)?;
            if !field.fill(instance) {
                return Err(DiError::FieldTypeMismatch {
                    owner: id.name(),
                    field: field.name(),
                    dependency: dependency.name(),
                });
            }
        }

        raw.on_constructed();

        #[cfg(feature = "logging")]
        debug!(
            target: "service_provider",
            service = id.name(),
            lifetime = record.lifetime.as_str(),
            "Service constructed"
        );

        Ok(raw.into_shared())
    }
}
