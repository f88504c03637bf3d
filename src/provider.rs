//! Application-facing service lookup
//!
//! The `ServiceProvider` resolves through the registry and, for types the
//! registry has never heard of, falls back on whatever the host application
//! published into its context store.

use crate::{ContextStore, DiError, Inject, Injectable, Resolver, Result, ServiceRegistry};
use std::sync::{Arc, Weak};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Facade over a registry and its context store.
///
/// Created by [`bootstrap`](crate::bootstrap). The provider does not own
/// either side: the context store owns both the provider and the registry,
/// so dropping the context frees the whole container.
///
/// # Examples
///
/// ```rust
/// use service_provider::{bootstrap, injectable, AppContext, ContextStore};
/// use std::sync::Arc;
///
/// struct Mailer;
/// injectable!(Mailer);
///
/// let context = AppContext::shared();
/// let provider = bootstrap(&context).unwrap();
/// provider.registry().unwrap().register_singleton(|| Mailer).unwrap();
///
/// // Values the host published are found as a fallback
/// context.publish("app#port", Arc::new(8080u16));
///
/// assert!(provider.get_service::<Mailer>().is_ok());
/// assert_eq!(*provider.get_service::<u16>().unwrap(), 8080);
/// assert!(provider.get_service::<String>().is_err());
/// ```
pub struct ServiceProvider {
    registry: Weak<ServiceRegistry>,
    context: Weak<dyn ContextStore>,
}

impl ServiceProvider {
    /// Create a provider over `registry` and `context`.
    pub fn new(registry: &Arc<ServiceRegistry>, context: &Arc<dyn ContextStore>) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            context: Arc::downgrade(context),
        }
    }

    pub(crate) fn from_weak(registry: Weak<ServiceRegistry>, context: Weak<dyn ContextStore>) -> Self {
        Self { registry, context }
    }

    /// Get a service instance.
    ///
    /// Resolves `T` through the registry. If that fails because `T`, or any
    /// service in its dependency chain, is not registered, the context
    /// store's published values are scanned and the first one whose type is
    /// `T` is returned.
    ///
    /// # Errors
    ///
    /// - [`DiError::ServiceNotFound`] if neither side has a `T`
    /// - [`DiError::ContainerDropped`] if the registry or context is gone
    /// - any other resolution error unchanged
    pub fn get_service<T: Injectable>(&self) -> Result<Arc<T>> {
        match self.registry()?.resolve::<T>() {
            Ok(service) => Ok(service),
            Err(DiError::NotRegistered { .. }) => self.find_in_context::<T>(),
            Err(err) => Err(err),
        }
    }

    /// Scan the context store for a published value of type `T`
    fn find_in_context<T: Injectable>(&self) -> Result<Arc<T>> {
        #[cfg(feature = "logging")]
        trace!(
            target: "service_provider",
            service = std::any::type_name::<T>(),
            "Falling back to context store"
        );

        let found = self
            .context()?
            .entries()
            .into_iter()
            .find_map(|(_, value)| value.downcast::<T>().ok());

        match found {
            Some(service) => Ok(service),
            None => {
                #[cfg(feature = "logging")]
                debug!(
                    target: "service_provider",
                    service = std::any::type_name::<T>(),
                    "Service not found in registry or context"
                );
                Err(DiError::service_not_found::<T>())
            }
        }
    }

    /// The registry this provider resolves through.
    #[inline]
    pub fn registry(&self) -> Result<Arc<ServiceRegistry>> {
        self.registry.upgrade().ok_or(DiError::ContainerDropped)
    }

    /// The context store this provider falls back on.
    #[inline]
    pub fn context(&self) -> Result<Arc<dyn ContextStore>> {
        self.context.upgrade().ok_or(DiError::ContainerDropped)
    }
}

impl Inject for ServiceProvider {}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("registry_alive", &(self.registry.strong_count() > 0))
            .field("context_alive", &(self.context.strong_count() > 0))
            .finish()
    }
}
