#![no_main]

//! Fuzz target for registration and resolution
//!
//! Drives a bootstrapped container with arbitrary registration orders,
//! lifetimes, published context values and concurrent resolves, and checks
//! the registry's invariants after every step.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use service_provider::{
    bootstrap, AppContext, DiError, Field, Inject, Injected, MetadataStore, Resolver, ServiceId,
    ServiceRegistry,
};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Arbitrary)]
struct Config {
    value: u32,
}
impl Inject for Config {}

#[derive(Debug)]
struct Repository {
    config: Injected<Config>,
}

impl Inject for Repository {
    fn annotate(store: &MetadataStore) {
        store.annotate(ServiceId::of::<Self>(), "config", ServiceId::of::<Config>());
    }

    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![Field::new("config", &mut self.config)]
    }
}

#[derive(Debug)]
struct Handler {
    repository: Option<Arc<Repository>>,
}

impl Inject for Handler {
    fn annotate(store: &MetadataStore) {
        store.annotate(ServiceId::of::<Self>(), "repository", ServiceId::of::<Repository>());
    }

    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![Field::new("repository", &mut self.repository)]
    }
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum Kind {
    Config,
    Repository,
    Handler,
}

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Register { kind: Kind, transient: bool, value: u32 },
    Resolve(Kind),
    ResolveTwice(Kind),
    Publish(Config),
    ProviderGet(Kind),
    Concurrent { kind: Kind, threads: u8 },
}

fn register(registry: &ServiceRegistry, kind: Kind, transient: bool, value: u32) -> bool {
    let result = match (kind, transient) {
        (Kind::Config, false) => registry.register_singleton(move || Config { value }).map(|_| ()),
        (Kind::Config, true) => registry.register_transient(move || Config { value }).map(|_| ()),
        (Kind::Repository, false) => registry
            .register_singleton(|| Repository { config: Injected::empty() })
            .map(|_| ()),
        (Kind::Repository, true) => registry
            .register_transient(|| Repository { config: Injected::empty() })
            .map(|_| ()),
        (Kind::Handler, false) => registry
            .register_singleton(|| Handler { repository: None })
            .map(|_| ()),
        (Kind::Handler, true) => registry
            .register_transient(|| Handler { repository: None })
            .map(|_| ()),
    };

    match result {
        Ok(()) => true,
        Err(DiError::AlreadyRegistered { .. }) => false,
        Err(err) => panic!("unexpected registration error: {err}"),
    }
}

fn resolve(registry: &ServiceRegistry, kind: Kind) -> Option<Arc<dyn std::any::Any + Send + Sync>> {
    let id = match kind {
        Kind::Config => ServiceId::of::<Config>(),
        Kind::Repository => ServiceId::of::<Repository>(),
        Kind::Handler => ServiceId::of::<Handler>(),
    };

    match registry.resolve_id(id) {
        Ok(instance) => Some(instance),
        Err(DiError::NotRegistered { .. }) => None,
        Err(err) => panic!("unexpected resolution error: {err}"),
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let context = AppContext::shared();
    let provider = bootstrap(&context).expect("fresh context");
    let registry = provider.registry().expect("registry alive");

    for op in ops.into_iter().take(64) {
        match op {
            Op::Register { kind, transient, value } => {
                let before = registry.len();
                let inserted = register(&registry, kind, transient, value);
                assert_eq!(registry.len(), before + usize::from(inserted));
            }
            Op::Resolve(kind) => {
                if let Some(instance) = resolve(&registry, kind) {
                    if let Ok(repository) = instance.downcast::<Repository>() {
                        assert!(repository.config.is_injected());
                    }
                }
            }
            Op::ResolveTwice(kind) => {
                let transient = match kind {
                    Kind::Config => registry.lifetime_of::<Config>(),
                    Kind::Repository => registry.lifetime_of::<Repository>(),
                    Kind::Handler => registry.lifetime_of::<Handler>(),
                }
                .map(|lifetime| lifetime == service_provider::Lifetime::Transient);

                if let (Some(a), Some(b), Some(transient)) =
                    (resolve(&registry, kind), resolve(&registry, kind), transient)
                {
                    assert_eq!(Arc::ptr_eq(&a, &b), !transient);
                }
            }
            Op::Publish(config) => {
                context.publish("fuzz#config", Arc::new(config));
            }
            Op::ProviderGet(kind) => {
                let result = match kind {
                    Kind::Config => provider.get_service::<Config>().map(|_| ()),
                    Kind::Repository => provider.get_service::<Repository>().map(|_| ()),
                    Kind::Handler => provider.get_service::<Handler>().map(|_| ()),
                };
                match result {
                    Ok(()) | Err(DiError::ServiceNotFound { .. }) => {}
                    Err(err) => panic!("unexpected provider error: {err}"),
                }
            }
            Op::Concurrent { kind, threads } => {
                let threads = usize::from(threads % 8).max(1);
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let registry = Arc::clone(&registry);
                        thread::spawn(move || resolve(&registry, kind).is_some())
                    })
                    .collect();

                let outcomes: Vec<bool> = handles
                    .into_iter()
                    .map(|h| h.join().expect("resolver thread panicked"))
                    .collect();
                assert!(outcomes.windows(2).all(|w| w[0] == w[1]));
            }
        }
    }
});
