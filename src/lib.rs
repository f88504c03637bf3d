//! # service-provider - Field-Injection Service Container
//!
//! A small dependency injection container: services are registered with a
//! lifetime and a factory, their dependency fields are annotated once per
//! type, and the container builds, injects and initialises them on demand.
//!
//! ## Features
//!
//! - **Typed identities** - services are keyed by `TypeId`, never by name
//! - **Field injection** - annotated `Injected<T>` / `Option<Arc<T>>` fields are filled on construction
//! - **Singletons and transients** - singletons are built once, even under contention
//! - **Lifecycle hook** - `on_constructed` runs after every field is injected
//! - **Cycle detection** - a service that depends on itself fails with the full path
//! - **Context fallback** - values the host published are found when nothing is registered
//! - **Observable** - optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use service_provider::{bootstrap, get_service, scope, AppContext, Inject, Injected};
//!
//! #[derive(Inject)]
//! struct Logger;
//!
//! #[derive(Inject)]
//! #[inject(on_constructed = "open")]
//! struct Connection {
//!     #[service]
//!     logger: Injected<Logger>,
//!     open: bool,
//! }
//!
//! impl Connection {
//!     fn open(&mut self) {
//!         self.open = true;
//!     }
//! }
//!
//! let context = AppContext::shared();
//! let provider = bootstrap(&context).unwrap();
//!
//! let registry = provider.registry().unwrap();
//! registry.register_singleton(|| Logger).unwrap();
//! registry
//!     .register_transient(|| Connection { logger: Injected::empty(), open: false })
//!     .unwrap();
//!
//! scope::with_scope(context, || {
//!     let conn = get_service::<Connection>().unwrap();
//!     assert!(conn.open);
//!     assert!(conn.logger.is_injected());
//! });
//! ```
//!
//! ## Manual Annotation
//!
//! Without the `derive` feature, implement [`Inject`] by hand:
//!
//! ```rust
//! use service_provider::{Field, Inject, Injected, MetadataStore, Resolver, ServiceId, ServiceRegistry};
//!
//! struct Clock;
//! impl Inject for Clock {}
//!
//! struct Scheduler {
//!     clock: Injected<Clock>,
//! }
//!
//! impl Inject for Scheduler {
//!     fn annotate(store: &MetadataStore) {
//!         store.annotate(ServiceId::of::<Self>(), "clock", ServiceId::of::<Clock>());
//!     }
//!
//!     fn fields(&mut self) -> Vec<Field<'_>> {
//!         vec![Field::new("clock", &mut self.clock)]
//!     }
//! }
//!
//! let registry = ServiceRegistry::new();
//! registry.register_singleton(|| Clock).unwrap();
//! registry.register_singleton(|| Scheduler { clock: Injected::empty() }).unwrap();
//!
//! let scheduler = registry.resolve::<Scheduler>().unwrap();
//! assert!(scheduler.clock.is_injected());
//! ```
//!
//! ## Ownership
//!
//! The context store owns the provider and the registry. The provider and
//! the registry's own entry hold weak references, so dropping the context
//! frees the container. Singletons live as long as the registry.

mod accessor;
mod bootstrap;
mod context;
mod error;
mod factory;
mod inject;
#[cfg(feature = "logging")]
pub mod logging;
mod metadata;
mod provider;
mod registry;
mod resolver;
pub mod scope;
mod service;
mod storage;

pub use accessor::{get_registry, get_service, get_service_provider};
pub use bootstrap::bootstrap;
pub use context::*;
pub use error::*;
pub use inject::*;
pub use metadata::{metadata, MetadataStore};
pub use provider::ServiceProvider;
pub use registry::ServiceRegistry;
pub use resolver::Resolver;
pub use scope::ScopeGuard;
pub use service::*;

// Derive macro lives in the macro namespace next to the `Inject` trait
#[cfg(feature = "derive")]
pub use service_provider_derive::Inject;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        bootstrap, get_registry, get_service, get_service_provider, injectable, scope,
        AppContext, ContextStore, DiError, Field, Inject, Injectable, Injected, Lifetime,
        MetadataStore, Resolver, Result, ServiceId, ServiceProvider, ServiceRegistry,
    };
}
