//! Container bootstrap
//!
//! Wires a fresh registry and provider into a host context store.

use crate::{
    ContextStore, DiError, Resolver, Result, ServiceProvider, ServiceRegistry,
    SERVICE_PROVIDER_KEY, SERVICE_REGISTRY_KEY,
};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::info;

/// Bootstrap a container into `context`.
///
/// Creates a [`ServiceRegistry`], registers the [`ServiceProvider`] in it as
/// a singleton, resolves the provider once and publishes the provider under
/// [`SERVICE_PROVIDER_KEY`] and the registry under [`SERVICE_REGISTRY_KEY`].
/// Services registered afterwards can then be found through
/// [`get_service`](crate::get_service) inside a [`scope`](crate::scope).
///
/// # Errors
///
/// [`DiError::AlreadyBootstrapped`] if `context` already carries a provider.
///
/// # Examples
///
/// ```rust
/// use service_provider::{bootstrap, AppContext, DiError, ServiceProvider};
/// use service_provider::{lookup_as, SERVICE_PROVIDER_KEY};
/// use std::sync::Arc;
///
/// let context = AppContext::shared();
/// let provider = bootstrap(&context).unwrap();
///
/// let published = lookup_as::<ServiceProvider>(&*context, SERVICE_PROVIDER_KEY).unwrap();
/// assert!(Arc::ptr_eq(&provider, &published));
///
/// assert!(matches!(bootstrap(&context), Err(DiError::AlreadyBootstrapped)));
/// ```
pub fn bootstrap(context: &Arc<dyn ContextStore>) -> Result<Arc<ServiceProvider>> {
    if context.lookup(SERVICE_PROVIDER_KEY).is_some() {
        return Err(DiError::AlreadyBootstrapped);
    }

    let registry = ServiceRegistry::new();

    let weak_registry = Arc::downgrade(&registry);
    let weak_context = Arc::downgrade(context);
    registry.register_singleton(move || {
        ServiceProvider::from_weak(weak_registry.clone(), weak_context.clone())
    })?;

    let provider = registry.resolve::<ServiceProvider>()?;

    context.publish(SERVICE_PROVIDER_KEY, provider.clone());
    context.publish(SERVICE_REGISTRY_KEY, registry.clone());

    #[cfg(feature = "logging")]
    info!(
        target: "service_provider",
        provider_key = SERVICE_PROVIDER_KEY,
        registry_key = SERVICE_REGISTRY_KEY,
        "Service container bootstrapped"
    );

    Ok(provider)
}
