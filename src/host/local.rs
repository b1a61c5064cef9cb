//! Built-in ambient-context host backed by a per-thread slot.
//!
//! Each thread owns one ambient value, an `Arc<dyn Any + Send + Sync>` set by
//! the embedding code. Capture snapshots the slot; run swaps the snapshot in,
//! invokes the callback, and restores the prior value through a drop guard so
//! restoration also happens on unwind.

use std::any::Any;
use std::cell::RefCell;
use std::sync::Arc;

use crate::error::ResolveError;
use crate::host::{AdapterFn, CaptureFn, ContextHandle, HostArg, HostBinding, HostCallback, RunFn};

/// Value stored in the per-thread ambient slot.
pub type AmbientValue = Arc<dyn Any + Send + Sync>;

thread_local! {
    static AMBIENT: RefCell<Option<AmbientValue>> = const { RefCell::new(None) };
}

/// Replace the current thread's ambient value, returning the prior one.
pub fn set_ambient(value: Option<AmbientValue>) -> Option<AmbientValue> {
    AMBIENT.with(|slot| slot.replace(value))
}

/// The current thread's ambient value, if any.
pub fn ambient() -> Option<AmbientValue> {
    AMBIENT.with(|slot| slot.borrow().clone())
}

/// Typed view of the current ambient value. `None` when the slot is empty or
/// holds a different type.
pub fn ambient_value<T: Any + Send + Sync>() -> Option<Arc<T>> {
    ambient().and_then(|value| value.downcast::<T>().ok())
}

/// Slot contents at the moment of capture. An empty slot is still a valid
/// snapshot: replaying it means "run with no ambient value".
struct Snapshot {
    value: Option<AmbientValue>,
}

fn capture() -> ContextHandle {
    ContextHandle::new(Snapshot { value: ambient() })
}

fn run_on(handle: &ContextHandle, callback: HostCallback) {
    let snapshot = handle
        .downcast_ref::<Snapshot>()
        .expect("context handle was not captured by the local ambient host");

    let prior = set_ambient(snapshot.value.clone());
    let _restore = Restore { prior: Some(prior) };
    callback(HostArg::none());
}

/// Restores the prior ambient value when dropped, covering both normal
/// return and unwind out of the callback.
struct Restore {
    prior: Option<Option<AmbientValue>>,
}

impl Drop for Restore {
    fn drop(&mut self) {
        if let Some(prior) = self.prior.take() {
            // try_with: the slot may already be gone during thread teardown.
            let _ = AMBIENT.try_with(|slot| slot.replace(prior));
        }
    }
}

/// Binding for the built-in per-thread host. All three primitives always
/// resolve.
#[derive(Debug, Default)]
pub struct LocalHostBinding;

impl HostBinding for LocalHostBinding {
    fn resolve_adapter(&self) -> Result<AdapterFn, ResolveError> {
        Ok(Box::new(|consumer: super::ConsumerCallback| {
            let adapted: HostCallback = Box::new(move |_arg: HostArg| consumer());
            adapted
        }))
    }

    fn resolve_capture(&self) -> Result<CaptureFn, ResolveError> {
        Ok(Box::new(capture))
    }

    fn resolve_run(&self) -> Result<RunFn, ResolveError> {
        Ok(Box::new(run_on))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_str(value: &str) {
        set_ambient(Some(Arc::new(value.to_string())));
    }

    fn current_str() -> Option<String> {
        ambient_value::<String>().map(|v| (*v).clone())
    }

    #[test]
    fn ambient_slot_set_and_read() {
        assert_eq!(current_str(), None);
        set_str("locale=fr");
        assert_eq!(current_str(), Some("locale=fr".to_string()));

        let prior = set_ambient(None);
        assert!(prior.is_some());
        assert_eq!(current_str(), None);
    }

    #[test]
    fn typed_view_rejects_other_types() {
        set_ambient(Some(Arc::new(42u64)));
        assert!(ambient_value::<String>().is_none());
        assert_eq!(ambient_value::<u64>().map(|v| *v), Some(42));
    }

    #[test]
    fn capture_does_not_alter_current_slot() {
        set_str("before");
        let _handle = capture();
        assert_eq!(current_str(), Some("before".to_string()));
    }

    #[test]
    fn run_installs_snapshot_and_restores() {
        set_str("captured");
        let handle = capture();
        set_str("current");

        run_on(
            &handle,
            Box::new(|_arg| {
                assert_eq!(current_str(), Some("captured".to_string()));
            }),
        );

        assert_eq!(current_str(), Some("current".to_string()));
    }

    #[test]
    fn restore_guard_survives_unwind() {
        set_str("outer");
        let handle = capture();
        set_str("inner");

        let panicked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            run_on(&handle, Box::new(|_arg| panic!("callback failure")));
        }));

        assert!(panicked.is_err());
        assert_eq!(current_str(), Some("inner".to_string()));
    }

    #[test]
    #[should_panic(expected = "not captured by the local ambient host")]
    fn foreign_handle_is_rejected() {
        struct ForeignSnapshot;
        run_on(&ContextHandle::new(ForeignSnapshot), Box::new(|_arg| {}));
    }
}
