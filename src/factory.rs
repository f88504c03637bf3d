//! Registration records and type-erased factories
//!
//! A factory only builds the raw instance: constructor arguments applied,
//! dependency fields still empty. Injection, the lifecycle hook and caching
//! are the resolver's job, so the erased instance keeps the hooks the
//! resolver needs through [`RawInstance`].

use crate::{Field, Inject, Lifetime, ServiceId};
use std::any::Any;
use std::sync::Arc;

/// A freshly built instance whose dependencies are not yet injected.
pub(crate) trait RawInstance {
    /// Injection slots of the instance
    fn fields(&mut self) -> Vec<Field<'_>>;

    /// Run the lifecycle hook
    fn on_constructed(&mut self);

    /// Move the finished instance behind a shared pointer
    fn into_shared(self: Box<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Inject> RawInstance for T {
    #[inline]
    fn fields(&mut self) -> Vec<Field<'_>> {
        Inject::fields(self)
    }

    #[inline]
    fn on_constructed(&mut self) {
        Inject::on_constructed(self)
    }

    #[inline]
    fn into_shared(self: Box<Self>) -> Arc<dyn Any + Send + Sync> {
        Arc::new(*self) as Arc<dyn Any + Send + Sync>
    }
}

/// Type-erased raw-instance factory
pub(crate) type RawFactory = Box<dyn Fn() -> Box<dyn RawInstance> + Send + Sync>;

/// How a registration produces its instance
pub(crate) enum Construction {
    /// Call the factory, then inject and run the hook
    Factory(RawFactory),
    /// The instance was supplied at registration and lives in the singleton cache
    Provided,
}

/// A registration record: identity, lifetime and construction rule.
///
/// Immutable once created.
pub(crate) struct Registration {
    pub(crate) id: ServiceId,
    pub(crate) lifetime: Lifetime,
    pub(crate) construction: Construction,
}

impl Registration {
    /// Record for a service built by `factory` on resolve
    pub(crate) fn with_factory<T: Inject, F>(lifetime: Lifetime, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            id: ServiceId::of::<T>(),
            lifetime,
            construction: Construction::Factory(Box::new(move || {
                Box::new(factory()) as Box<dyn RawInstance>
            })),
        }
    }

    /// Record for a singleton whose instance was supplied up front
    pub(crate) fn provided(id: ServiceId) -> Self {
        Self {
            id,
            lifetime: Lifetime::Singleton,
            construction: Construction::Provided,
        }
    }

    /// Build a raw instance, if this record has a factory
    #[inline]
    pub(crate) fn build(&self) -> Option<Box<dyn RawInstance>> {
        match &self.construction {
            Construction::Factory(factory) => Some(factory()),
            Construction::Provided => None,
        }
    }

    #[inline]
    pub(crate) fn is_transient(&self) -> bool {
        self.lifetime == Lifetime::Transient
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("lifetime", &self.lifetime)
            .field(
                "provided",
                &matches!(self.construction, Construction::Provided),
            )
            .finish()
    }
}
