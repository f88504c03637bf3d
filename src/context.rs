//! Host context store
//!
//! The container is published into, and falls back on, a key/value store
//! owned by the host application. [`ContextStore`] is that seam;
//! [`AppContext`] is an in-memory implementation.

use ahash::RandomState;
use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// Key the [`ServiceProvider`](crate::ServiceProvider) is published under.
pub const SERVICE_PROVIDER_KEY: &str = "service-provider#Provider";

/// Key the [`ServiceRegistry`](crate::ServiceRegistry) is published under.
pub const SERVICE_REGISTRY_KEY: &str = "service-provider#Registry";

/// A shared, type-erased published value
pub type Published = Arc<dyn Any + Send + Sync>;

/// Key/value store of the host application.
pub trait ContextStore: Send + Sync + 'static {
    /// Publish `value` under `key`, replacing any previous value.
    fn publish(&self, key: &str, value: Published);

    /// The value published under `key`.
    fn lookup(&self, key: &str) -> Option<Published>;

    /// Every published entry. Order is unspecified.
    fn entries(&self) -> Vec<(String, Published)>;
}

/// Look up `key` and downcast it to `T`.
///
/// Returns `None` if nothing is published under `key` or the value has
/// another type.
pub fn lookup_as<T: Send + Sync + 'static>(
    context: &(impl ContextStore + ?Sized),
    key: &str,
) -> Option<Arc<T>> {
    context.lookup(key)?.downcast::<T>().ok()
}

/// In-memory context store.
///
/// # Examples
///
/// ```rust
/// use service_provider::{lookup_as, AppContext, ContextStore};
/// use std::sync::Arc;
///
/// let context = AppContext::new();
/// context.publish("app#name", Arc::new(String::from("billing")));
///
/// let name = lookup_as::<String>(&context, "app#name").unwrap();
/// assert_eq!(name.as_str(), "billing");
/// assert!(lookup_as::<u32>(&context, "app#name").is_none());
/// ```
pub struct AppContext {
    values: DashMap<String, Published, RandomState>,
}

impl AppContext {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            values: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Create an empty store already wrapped for sharing with the container
    pub fn shared() -> Arc<dyn ContextStore> {
        Arc::new(Self::new())
    }

    /// Number of published values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing has been published
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ContextStore for AppContext {
    fn publish(&self, key: &str, value: Published) {
        #[cfg(feature = "logging")]
        trace!(target: "service_provider", key, "Publishing context value");

        self.values.insert(key.to_owned(), value);
    }

    fn lookup(&self, key: &str) -> Option<Published> {
        self.values.get(key).map(|value| Arc::clone(value.value()))
    }

    fn entries(&self) -> Vec<(String, Published)> {
        self.values
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect()
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("keys", &self.values.iter().map(|e| e.key().clone()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_replaces() {
        let context = AppContext::new();
        context.publish("answer", Arc::new(1u32));
        context.publish("answer", Arc::new(42u32));

        assert_eq!(context.len(), 1);
        assert_eq!(*lookup_as::<u32>(&context, "answer").unwrap(), 42);
    }

    #[test]
    fn test_lookup_missing() {
        let context = AppContext::new();
        assert!(context.is_empty());
        assert!(context.lookup("nothing").is_none());
    }

    #[test]
    fn test_entries_lists_everything() {
        let context = AppContext::shared();
        context.publish("a", Arc::new(1u8));
        context.publish("b", Arc::new("two"));

        let mut keys: Vec<_> = context.entries().into_iter().map(|(k, _)| k).collect();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_keys_are_distinct() {
        assert_ne!(SERVICE_PROVIDER_KEY, SERVICE_REGISTRY_KEY);
    }
}
