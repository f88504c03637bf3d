//! Ambient context for the current thread
//!
//! Code that runs inside an entered scope can reach the container through
//! the accessors without threading a context handle through every call.
//! Scopes nest: the most recently entered scope that is still alive is the
//! current one.

use crate::ContextStore;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

thread_local! {
    // Live scopes of this thread, innermost last, each tagged with its guard's id.
    static SCOPES: RefCell<Vec<(u64, Arc<dyn ContextStore>)>> = const { RefCell::new(Vec::new()) };
}

/// Keeps a context active on this thread until dropped.
///
/// Guards may be dropped in any order; dropping one removes only its own
/// context, and the innermost remaining scope becomes current.
///
/// Not `Send`: it must be dropped on the thread that entered it.
#[must_use = "the scope ends as soon as the guard is dropped"]
pub struct ScopeGuard {
    id: u64,
    _not_send: PhantomData<*const ()>,
}

impl ScopeGuard {
    /// Number of scopes alive on this thread, this one included
    pub fn depth(&self) -> usize {
        SCOPES.with(|scopes| scopes.borrow().len())
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let id = self.id;
        let remaining = SCOPES.with(|scopes| {
            let mut scopes = scopes.borrow_mut();
            if let Some(index) = scopes.iter().rposition(|(entry, _)| *entry == id) {
                scopes.remove(index);
            }
            scopes.len()
        });

        #[cfg(feature = "logging")]
        trace!(target: "service_provider", scope = id, remaining, "Leaving scope");

        #[cfg(not(feature = "logging"))]
        let _ = remaining;
    }
}

impl std::fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeGuard").field("id", &self.id).finish()
    }
}

/// Make `context` the ambient context of this thread until the guard drops.
///
/// # Examples
///
/// ```rust
/// use service_provider::{bootstrap, get_service_provider, scope, AppContext};
///
/// let context = AppContext::shared();
/// bootstrap(&context).unwrap();
///
/// assert!(get_service_provider().is_err());
/// {
///     let _guard = scope::enter(context.clone());
///     assert!(get_service_provider().is_ok());
/// }
/// assert!(get_service_provider().is_err());
/// ```
pub fn enter(context: Arc<dyn ContextStore>) -> ScopeGuard {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);

    let depth = SCOPES.with(|scopes| {
        let mut scopes = scopes.borrow_mut();
        scopes.push((id, context));
        scopes.len()
    });

    #[cfg(feature = "logging")]
    trace!(target: "service_provider", scope = id, depth, "Entering scope");

    #[cfg(not(feature = "logging"))]
    let _ = depth;

    ScopeGuard {
        id,
        _not_send: PhantomData,
    }
}

/// The ambient context of this thread, if a scope is active.
#[inline]
pub fn current() -> Option<Arc<dyn ContextStore>> {
    SCOPES.with(|scopes| scopes.borrow().last().map(|(_, context)| Arc::clone(context)))
}

/// Run `f` with `context` as the ambient context.
///
/// The previous context is restored afterwards, even if `f` panics.
pub fn with_scope<R>(context: Arc<dyn ContextStore>, f: impl FnOnce() -> R) -> R {
    let _guard = enter(context);
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppContext;

    #[test]
    fn test_no_scope_by_default() {
        assert!(current().is_none());
    }

    #[test]
    fn test_nested_scopes_restore() {
        let outer = AppContext::shared();
        let inner = AppContext::shared();

        let outer_guard = enter(outer.clone());
        assert!(Arc::ptr_eq(&current().unwrap(), &outer));
        assert_eq!(outer_guard.depth(), 1);

        with_scope(inner.clone(), || {
            assert!(Arc::ptr_eq(&current().unwrap(), &inner));
            assert_eq!(outer_guard.depth(), 2);
        });

        assert!(Arc::ptr_eq(&current().unwrap(), &outer));
        drop(outer_guard);
        assert!(current().is_none());
    }

    #[test]
    fn test_out_of_order_drop_leaves_no_stale_context() {
        let first = AppContext::shared();
        let second = AppContext::shared();

        let a = enter(first.clone());
        let b = enter(second.clone());

        // Dropping the outer guard first keeps the inner scope current
        drop(a);
        assert!(Arc::ptr_eq(&current().unwrap(), &second));

        drop(b);
        assert!(current().is_none());
    }

    #[test]
    fn test_out_of_order_drop_in_middle() {
        let contexts: Vec<_> = (0..3).map(|_| AppContext::shared()).collect();
        let mut guards: Vec<_> = contexts.iter().map(|c| enter(c.clone())).collect();

        drop(guards.remove(1));
        assert!(Arc::ptr_eq(&current().unwrap(), &contexts[2]));

        drop(guards.pop());
        assert!(Arc::ptr_eq(&current().unwrap(), &contexts[0]));

        drop(guards);
        assert!(current().is_none());
    }

    #[test]
    fn test_scope_restored_after_panic() {
        let context = AppContext::shared();

        let result = std::panic::catch_unwind(|| {
            with_scope(AppContext::shared(), || panic!("boom"));
        });
        assert!(result.is_err());
        assert!(current().is_none());

        with_scope(context.clone(), || {
            assert!(Arc::ptr_eq(&current().unwrap(), &context));
        });
    }

    #[test]
    fn test_scope_is_per_thread() {
        let _guard = enter(AppContext::shared());
        let seen = std::thread::spawn(|| current().is_some()).join().unwrap();
        assert!(!seen);
    }
}
