//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development), honouring RUST_LOG:
//! ```bash
//! RUST_LOG=service_provider=trace cargo run --example logging --features logging-pretty
//! ```

use service_provider::{
    bootstrap, injectable, scope, AppContext, Field, Inject, Injected, MetadataStore, Resolver,
    ServiceId,
};

// Example services
#[allow(dead_code)]
struct Database {
    url: String,
}

injectable!(Database);

#[allow(dead_code)]
struct UserService {
    db: Injected<Database>,
}

impl Inject for UserService {
    fn annotate(store: &MetadataStore) {
        store.annotate(ServiceId::of::<Self>(), "db", ServiceId::of::<Database>());
    }

    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![Field::new("db", &mut self.db)]
    }
}

// Depends on itself
struct Loop {
    again: Option<std::sync::Arc<Loop>>,
}

impl Inject for Loop {
    fn annotate(store: &MetadataStore) {
        store.annotate(ServiceId::of::<Self>(), "again", ServiceId::of::<Loop>());
    }

    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![Field::new("again", &mut self.again)]
    }
}

fn main() {
    // Container events only at TRACE; RUST_LOG wins when set
    service_provider::logging::builder()
        .service_only()
        .trace()
        .from_env()
        .compact()
        .init();

    println!("=== service-provider Logging Demo ===\n");

    // logs: "Creating new service registry", "Registered service", "Service container bootstrapped"
    let context = AppContext::shared();
    let provider = bootstrap(&context).unwrap();
    let registry = provider.registry().unwrap();

    // logs: "Registered service"
    registry
        .register_singleton(|| Database {
            url: "postgres://localhost/mydb".into(),
        })
        .unwrap();
    registry
        .register_transient(|| UserService {
            db: Injected::empty(),
        })
        .unwrap();
    registry.register_transient(|| Loop { again: None }).unwrap();

    // logs: "Constructing service", "Injecting field", "Service constructed"
    let _users = registry.resolve::<UserService>().unwrap();

    // logs: "Singleton resolved from cache"
    let _db = registry.resolve::<Database>().unwrap();

    // logs: "Rejecting duplicate registration"
    assert!(registry.register_singleton(|| Loop { again: None }).is_err());

    // logs: "Service not registered", "Falling back to context store", "Service not found..."
    assert!(provider.get_service::<i32>().is_err());

    // Cycle is reported with its path
    if let Err(err) = registry.resolve::<Loop>() {
        println!("  {err}");
    }

    // logs: "Entering scope", "Leaving scope"
    scope::with_scope(context, || {
        let _ = service_provider::get_service::<Database>();
    });

    println!("\n=== Demo Complete ===");
    println!("Tip: Use --features logging-json for production (JSON output)");
    println!("     Use --features logging-pretty for development");
}
