//! Example wiring a container into an application context
//!
//! Run with:
//!   cargo run --example bootstrap

use service_provider::{
    bootstrap, get_registry, get_service, scope, AppContext, ContextStore, Inject, Injected,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// Leaf service, no dependencies
#[derive(Inject)]
struct Logger {
    lines: AtomicU64,
}

impl Logger {
    fn log(&self, message: &str) {
        let n = self.lines.fetch_add(1, Ordering::SeqCst);
        println!("  [log #{n}] {message}");
    }
}

#[derive(Inject)]
#[inject(on_constructed = "open")]
struct Connection {
    #[service]
    logger: Injected<Logger>,
    url: String,
}

impl Connection {
    fn open(&mut self) {
        self.logger.log(&format!("connection to {} ready", self.url));
    }
}

// Published by the host, not registered in the container
struct AppName(&'static str);

fn main() {
    println!("=== service-provider bootstrap demo ===\n");

    let context = AppContext::shared();
    context.publish("app#name", Arc::new(AppName("billing")));

    bootstrap(&context).expect("fresh context");

    let registry = get_registry(Some(&context)).expect("registry published");
    registry
        .register_singleton(|| Logger {
            lines: AtomicU64::new(0),
        })
        .and_then(|r| {
            r.register_transient(|| Connection {
                logger: Injected::empty(),
                url: "postgres://localhost/billing".into(),
            })
        })
        .expect("fresh registry");

    scope::with_scope(context, || {
        let first = get_service::<Connection>().expect("connection");
        let second = get_service::<Connection>().expect("connection");
        println!(
            "\ntwo connections, one logger: {}",
            Arc::ptr_eq(first.logger.get().unwrap(), second.logger.get().unwrap())
        );

        // Not registered: found among the values the host published
        let name = get_service::<AppName>().expect("published by host");
        println!("app name from context: {}", name.0);

        match get_service::<u64>() {
            Ok(_) => unreachable!(),
            Err(err) => println!("missing service: {err}"),
        }
    });

    println!("\n=== Demo Complete ===");
}
