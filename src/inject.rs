//! Field injection surface
//!
//! A service describes three things to the resolver through [`Inject`]:
//! which of its fields depend on which services (annotations, recorded once
//! per type in the [`MetadataStore`]), where those fields live on an
//! instance (slots), and what to run once everything is injected.
//!
//! # Example
//!
//! ```rust
//! use service_provider::{
//!     injectable, Field, Inject, Injected, MetadataStore, Resolver, ServiceId, ServiceRegistry,
//! };
//!
//! struct Logger;
//! injectable!(Logger);
//!
//! struct Connection {
//!     logger: Injected<Logger>,
//!     open: bool,
//! }
//!
//! impl Inject for Connection {
//!     fn annotate(store: &MetadataStore) {
//!         store.annotate(ServiceId::of::<Self>(), "logger", ServiceId::of::<Logger>());
//!     }
//!
//!     fn fields(&mut self) -> Vec<Field<'_>> {
//!         vec![Field::new("logger", &mut self.logger)]
//!     }
//!
//!     fn on_constructed(&mut self) {
//!         self.open = true;
//!     }
//! }
//!
//! let registry = ServiceRegistry::new();
//! registry
//!     .register_singleton(|| Logger).unwrap()
//!     .register_transient(|| Connection { logger: Injected::empty(), open: false }).unwrap();
//!
//! let connection = registry.resolve::<Connection>().unwrap();
//! assert!(connection.open);
//! assert!(connection.logger.is_injected());
//! ```

use crate::{Injectable, MetadataStore};
use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A service the resolver can construct.
///
/// Every method has a default, so a service without dependencies or hook
/// only needs `impl Inject for MyService {}` (or [`injectable!`](crate::injectable)).
/// With the `derive` feature, `#[derive(Inject)]` writes the impl from
/// `#[service]` field attributes.
pub trait Inject: Injectable + Sized {
    /// Record the dependency annotations of this type.
    ///
    /// Called once per type, the first time the type is registered.
    fn annotate(_store: &MetadataStore) {}

    /// The injectable fields of a raw instance, in declaration order.
    ///
    /// Fields without an annotation are left untouched.
    fn fields(&mut self) -> Vec<Field<'_>> {
        Vec::new()
    }

    /// Lifecycle hook, run exactly once per construction after every
    /// annotated field has been injected.
    fn on_constructed(&mut self) {}
}

/// A place on an instance that can receive a resolved dependency.
pub trait Slot {
    /// Store the resolved instance. Returns `false` if the instance is not
    /// of the type this slot holds.
    fn fill(&mut self, instance: Arc<dyn Any + Send + Sync>) -> bool;

    /// Whether a dependency has been stored
    fn is_filled(&self) -> bool;
}

/// A named slot exposed by [`Inject::fields`].
pub struct Field<'a> {
    name: &'static str,
    slot: &'a mut dyn Slot,
}

impl<'a> Field<'a> {
    /// Expose `slot` under the field name used in annotations
    #[inline]
    pub fn new(name: &'static str, slot: &'a mut dyn Slot) -> Self {
        Self { name, slot }
    }

    /// Field name
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fill the underlying slot
    #[inline]
    pub fn fill(&mut self, instance: Arc<dyn Any + Send + Sync>) -> bool {
        self.slot.fill(instance)
    }
}

impl fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("filled", &self.slot.is_filled())
            .finish()
    }
}

/// A dependency field, empty until the resolver injects it.
///
/// Dereferences to the injected service.
///
/// # Panics
///
/// Dereferencing an empty slot panics. Instances handed out by the resolver
/// always have their annotated slots filled; use [`Injected::get`] on values
/// built by hand.
pub struct Injected<T: Injectable> {
    inner: Option<Arc<T>>,
}

impl<T: Injectable> Injected<T> {
    /// An empty slot, for use in constructors
    #[inline]
    pub const fn empty() -> Self {
        Self { inner: None }
    }

    /// A slot that already holds `instance`
    #[inline]
    pub fn new(instance: Arc<T>) -> Self {
        Self {
            inner: Some(instance),
        }
    }

    /// The injected service, if any
    #[inline]
    pub fn get(&self) -> Option<&Arc<T>> {
        self.inner.as_ref()
    }

    /// Whether the slot has been filled
    #[inline]
    pub fn is_injected(&self) -> bool {
        self.inner.is_some()
    }
}

impl<T: Injectable> Slot for Injected<T> {
    fn fill(&mut self, instance: Arc<dyn Any + Send + Sync>) -> bool {
        self.inner.fill(instance)
    }

    fn is_filled(&self) -> bool {
        self.inner.is_some()
    }
}

// Plain `Option<Arc<T>>` fields work as slots too
impl<T: Injectable> Slot for Option<Arc<T>> {
    fn fill(&mut self, instance: Arc<dyn Any + Send + Sync>) -> bool {
        match instance.downcast::<T>() {
            Ok(typed) => {
                *self = Some(typed);
                true
            }
            Err(_) => false,
        }
    }

    fn is_filled(&self) -> bool {
        self.is_some()
    }
}

impl<T: Injectable> Default for Injected<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Injectable> Clone for Injected<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Injectable> Deref for Injected<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        match &self.inner {
            Some(instance) => &**instance,
            None => panic!(
                "dependency {} used before injection",
                std::any::type_name::<T>()
            ),
        }
    }
}

impl<T: Injectable> fmt::Debug for Injected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injected")
            .field("service", &std::any::type_name::<T>())
            .field("injected", &self.is_injected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Logger {
        level: u8,
    }

    struct Metrics;

    #[test]
    fn test_slot_accepts_matching_type() {
        let mut slot = Injected::<Logger>::empty();
        assert!(!slot.is_injected());

        assert!(slot.fill(Arc::new(Logger { level: 3 })));
        assert!(slot.is_injected());
        assert_eq!(slot.level, 3);
    }

    #[test]
    fn test_slot_rejects_other_type() {
        let mut slot = Injected::<Logger>::empty();
        assert!(!slot.fill(Arc::new(Metrics)));
        assert!(slot.get().is_none());
    }

    #[test]
    fn test_refill_replaces_instance() {
        let first = Arc::new(Logger { level: 1 });
        let second = Arc::new(Logger { level: 2 });

        let mut slot = Injected::new(Arc::clone(&first));
        assert!(slot.fill(second.clone()));
        assert!(Arc::ptr_eq(slot.get().unwrap(), &second));
    }

    #[test]
    fn test_option_arc_slot() {
        let mut slot: Option<Arc<Logger>> = None;
        assert!(!slot.fill(Arc::new(Metrics)));
        assert!(slot.fill(Arc::new(Logger { level: 0 })));
        assert!(slot.is_filled());
    }

    #[test]
    fn test_field_reports_name() {
        let mut slot = Injected::<Logger>::empty();
        let mut field = Field::new("logger", &mut slot);
        assert_eq!(field.name(), "logger");
        assert!(field.fill(Arc::new(Logger { level: 9 })));
        assert!(slot.is_injected());
    }

    #[test]
    #[should_panic(expected = "used before injection")]
    fn test_deref_empty_panics() {
        let slot = Injected::<Logger>::empty();
        assert_eq!(slot.level, 0);
    }
}
