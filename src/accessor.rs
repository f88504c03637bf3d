//! Free-function access to the container
//!
//! These go through the ambient context of the current [`scope`](crate::scope).

use crate::{
    lookup_as, scope, ContextStore, DiError, Injectable, Result, ServiceProvider,
    ServiceRegistry, SERVICE_PROVIDER_KEY, SERVICE_REGISTRY_KEY,
};
use std::sync::Arc;

/// The provider published in the ambient context.
///
/// # Errors
///
/// [`DiError::NotInjected`] if no scope is active or its context was never
/// bootstrapped.
pub fn get_service_provider() -> Result<Arc<ServiceProvider>> {
    let not_injected = || DiError::NotInjected {
        key: SERVICE_PROVIDER_KEY,
    };

    let context = scope::current().ok_or_else(not_injected)?;
    lookup_as::<ServiceProvider>(&*context, SERVICE_PROVIDER_KEY).ok_or_else(not_injected)
}

/// Get a service through the ambient provider.
///
/// # Examples
///
/// ```rust
/// use service_provider::{bootstrap, get_service, injectable, scope, AppContext};
///
/// struct Clock;
/// injectable!(Clock);
///
/// let context = AppContext::shared();
/// let provider = bootstrap(&context).unwrap();
/// provider.registry().unwrap().register_singleton(|| Clock).unwrap();
///
/// scope::with_scope(context, || {
///     assert!(get_service::<Clock>().is_ok());
/// });
/// ```
#[inline]
pub fn get_service<T: Injectable>() -> Result<Arc<T>> {
    get_service_provider()?.get_service::<T>()
}

/// The registry published in `context`, or in the ambient context if `None`.
///
/// # Errors
///
/// - [`DiError::NotInSetup`] if no context is given and no scope is active
/// - [`DiError::NotInjected`] if the context carries no registry
pub fn get_registry(context: Option<&Arc<dyn ContextStore>>) -> Result<Arc<ServiceRegistry>> {
    let context = match context {
        Some(context) => Arc::clone(context),
        None => scope::current().ok_or(DiError::NotInSetup)?,
    };

    lookup_as::<ServiceRegistry>(&*context, SERVICE_REGISTRY_KEY).ok_or(DiError::NotInjected {
        key: SERVICE_REGISTRY_KEY,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bootstrap, AppContext, Inject};

    struct Clock;
    impl Inject for Clock {}

    #[test]
    fn test_outside_scope() {
        assert!(matches!(
            get_service_provider(),
            Err(DiError::NotInjected { key: SERVICE_PROVIDER_KEY })
        ));
        assert!(matches!(get_service::<Clock>(), Err(DiError::NotInjected { .. })));
        assert!(matches!(get_registry(None), Err(DiError::NotInSetup)));
    }

    #[test]
    fn test_scope_without_bootstrap() {
        scope::with_scope(AppContext::shared(), || {
            assert!(matches!(get_service_provider(), Err(DiError::NotInjected { .. })));
            assert!(matches!(
                get_registry(None),
                Err(DiError::NotInjected { key: SERVICE_REGISTRY_KEY })
            ));
        });
    }

    #[test]
    fn test_explicit_context() {
        let context = AppContext::shared();
        let provider = bootstrap(&context).unwrap();

        let registry = get_registry(Some(&context)).unwrap();
        assert!(Arc::ptr_eq(&registry, &provider.registry().unwrap()));
    }

    #[test]
    fn test_inside_scope() {
        let context = AppContext::shared();
        let provider = bootstrap(&context).unwrap();
        provider.registry().unwrap().register_singleton(|| Clock).unwrap();

        scope::with_scope(context, || {
            assert!(Arc::ptr_eq(&get_service_provider().unwrap(), &provider));
            assert!(get_service::<Clock>().is_ok());
            assert!(get_registry(None).is_ok());
        });
    }
}
