use service_provider::{
    bootstrap, get_registry, get_service, get_service_provider, lookup_as, scope, AppContext,
    ContextStore, DiError, Field, Inject, Injected, MetadataStore, Resolver, ServiceId,
    ServiceProvider, ServiceRegistry, SERVICE_PROVIDER_KEY, SERVICE_REGISTRY_KEY,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Logger {
    inits: AtomicUsize,
}

impl Inject for Logger {
    fn on_constructed(&mut self) {
        self.inits.fetch_add(1, Ordering::SeqCst);
    }
}

struct Connection {
    logger: Injected<Logger>,
    inits: usize,
}

impl Inject for Connection {
    fn annotate(store: &MetadataStore) {
        store.annotate(ServiceId::of::<Self>(), "logger", ServiceId::of::<Logger>());
    }

    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![Field::new("logger", &mut self.logger)]
    }

    fn on_constructed(&mut self) {
        self.inits += 1;
    }
}

/// Published by the host, never registered
struct HostSettings {
    region: &'static str,
}

/// Registered, but depends on a value only the host provides
struct RegionalClient {
    settings: Injected<HostSettings>,
}

impl Inject for RegionalClient {
    fn annotate(store: &MetadataStore) {
        store.annotate(ServiceId::of::<Self>(), "settings", ServiceId::of::<HostSettings>());
    }

    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![Field::new("settings", &mut self.settings)]
    }
}

fn regional_client() -> RegionalClient {
    RegionalClient {
        settings: Injected::empty(),
    }
}

fn container() -> (Arc<dyn ContextStore>, Arc<ServiceProvider>, Arc<ServiceRegistry>) {
    let context = AppContext::shared();
    let provider = bootstrap(&context).unwrap();
    let registry = get_registry(Some(&context)).unwrap();

    registry
        .register_singleton(|| Logger {
            inits: AtomicUsize::new(0),
        })
        .unwrap()
        .register_transient(|| Connection {
            logger: Injected::empty(),
            inits: 0,
        })
        .unwrap();

    (context, provider, registry)
}

#[test]
fn test_connections_share_one_logger() {
    let (_context, _provider, registry) = container();

    let c1 = registry.resolve::<Connection>().unwrap();
    let c2 = registry.resolve::<Connection>().unwrap();
    assert!(!Arc::ptr_eq(&c1, &c2));
    assert_eq!((c1.inits, c2.inits), (1, 1));

    let logger = registry.resolve::<Logger>().unwrap();
    assert!(Arc::ptr_eq(c1.logger.get().unwrap(), &logger));
    assert!(Arc::ptr_eq(c2.logger.get().unwrap(), &logger));
    assert_eq!(logger.inits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_bootstrap_publishes_both_keys() {
    let (context, provider, registry) = container();

    let published = lookup_as::<ServiceProvider>(&*context, SERVICE_PROVIDER_KEY).unwrap();
    assert!(Arc::ptr_eq(&published, &provider));

    let published = lookup_as::<ServiceRegistry>(&*context, SERVICE_REGISTRY_KEY).unwrap();
    assert!(Arc::ptr_eq(&published, &registry));

    // Registry and provider are resolvable through the registry itself
    assert!(Arc::ptr_eq(&registry.resolve::<ServiceRegistry>().unwrap(), &registry));
    assert!(Arc::ptr_eq(&registry.resolve::<ServiceProvider>().unwrap(), &provider));
}

#[test]
fn test_duplicate_registration_keeps_first() {
    let (_context, _provider, registry) = container();

    let again = registry.register_singleton(|| Connection {
        logger: Injected::empty(),
        inits: 100,
    });
    assert!(matches!(again, Err(DiError::AlreadyRegistered { .. })));

    let conn = registry.resolve::<Connection>().unwrap();
    assert_eq!(conn.inits, 1);
}

#[test]
fn test_provider_falls_back_to_context() {
    let (context, provider, registry) = container();
    context.publish("host#settings", Arc::new(HostSettings { region: "eu-west" }));

    assert!(matches!(
        registry.resolve::<HostSettings>(),
        Err(DiError::NotRegistered { .. })
    ));
    assert_eq!(provider.get_service::<HostSettings>().unwrap().region, "eu-west");
}

#[test]
fn test_provider_service_not_found() {
    let (_context, provider, registry) = container();

    assert!(matches!(
        registry.resolve::<HostSettings>(),
        Err(DiError::NotRegistered { .. })
    ));
    assert!(matches!(
        provider.get_service::<HostSettings>(),
        Err(DiError::ServiceNotFound { .. })
    ));
}

#[test]
fn test_unregistered_dependency_falls_back_to_published_service() {
    let (context, provider, registry) = container();
    registry.register_transient(regional_client).unwrap();

    assert!(matches!(
        provider.get_service::<RegionalClient>(),
        Err(DiError::ServiceNotFound { .. })
    ));

    let published = Arc::new(regional_client());
    context.publish("host#client", published.clone());

    let found = provider.get_service::<RegionalClient>().unwrap();
    assert!(Arc::ptr_eq(&found, &published));
}

#[test]
fn test_accessors_inside_scope() {
    let (context, provider, _registry) = container();

    scope::with_scope(context, || {
        assert!(Arc::ptr_eq(&get_service_provider().unwrap(), &provider));

        let conn = get_service::<Connection>().unwrap();
        assert!(conn.logger.is_injected());
        assert!(get_registry(None).is_ok());
    });
}

#[test]
fn test_accessors_outside_scope() {
    assert!(matches!(get_service_provider(), Err(DiError::NotInjected { .. })));
    assert!(matches!(get_service::<Logger>(), Err(DiError::NotInjected { .. })));
    assert!(matches!(get_registry(None), Err(DiError::NotInSetup)));
}

#[test]
fn test_nested_scopes_see_their_own_container() {
    let (outer, outer_provider, _) = container();
    let inner = AppContext::shared();
    let inner_provider = bootstrap(&inner).unwrap();

    let _guard = scope::enter(outer);
    scope::with_scope(inner, || {
        assert!(Arc::ptr_eq(&get_service_provider().unwrap(), &inner_provider));
        // Nothing registered in the inner container
        assert!(matches!(
            get_service::<Logger>(),
            Err(DiError::ServiceNotFound { .. })
        ));
    });
    assert!(Arc::ptr_eq(&get_service_provider().unwrap(), &outer_provider));
}

#[test]
fn test_dropping_context_frees_container() {
    let (context, provider, registry) = container();
    let logger = Arc::downgrade(&registry.resolve::<Logger>().unwrap());
    let weak_registry = Arc::downgrade(&registry);
    drop(registry);

    drop(context);
    assert!(weak_registry.upgrade().is_none());
    assert!(logger.upgrade().is_none());
    assert!(matches!(
        provider.get_service::<Logger>(),
        Err(DiError::ContainerDropped)
    ));
}
