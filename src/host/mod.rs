//! Host integration surface for the ambient-context bridge.
//!
//! A host is whatever environment actually owns the per-thread ambient slot.
//! It exposes three primitives: a callback-adapter factory, a capture
//! function, and a run function. The bridge resolves all three through a
//! [`HostBinding`] exactly once per process; a binding may be installed
//! explicitly at startup, or the built-in [`local`] host is used when the
//! `local-host` feature is enabled.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::ResolveError;

#[cfg(feature = "local-host")]
pub mod local;

pub use crate::bridge::install_host_binding;

/// An opaque token for a captured ambient context.
///
/// Handles are cheap to clone and safe to share across threads; the only
/// valid use is passing one back to [`crate::run`]. The bridge never retains
/// a handle after returning it, and never inspects its payload.
#[derive(Clone)]
pub struct ContextHandle(Arc<dyn Any + Send + Sync>);

impl ContextHandle {
    /// Wraps a host snapshot into an opaque handle.
    ///
    /// For host binding implementors; consumers obtain handles only through
    /// [`crate::capture`].
    pub fn new<T: Any + Send + Sync>(snapshot: T) -> Self {
        ContextHandle(Arc::new(snapshot))
    }

    /// Recovers the snapshot a host stored in this handle.
    ///
    /// Returns `None` when the handle was captured by a different host.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContextHandle(..)")
    }
}

/// The fixed empty argument a host run primitive passes to an adapted
/// callback. Carries no data today; it exists so the host-facing callback
/// shape stays stable if hosts ever thread state through it.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostArg(());

impl HostArg {
    /// The empty argument.
    pub fn none() -> Self {
        HostArg(())
    }
}

/// A consumer-supplied callback, as accepted by [`crate::run`].
pub type ConsumerCallback = Box<dyn FnOnce()>;

/// A callback in the shape the host run primitive invokes.
pub type HostCallback = Box<dyn FnOnce(HostArg)>;

/// Adapts a consumer callback into the host callback shape. Invoked freshly
/// on every run call; adapted callbacks are never cached or reused.
pub type AdapterFn = Box<dyn Fn(ConsumerCallback) -> HostCallback + Send + Sync>;

/// Snapshots the current thread's ambient context.
pub type CaptureFn = Box<dyn Fn() -> ContextHandle + Send + Sync>;

/// Installs a captured context, invokes the adapted callback synchronously
/// on the current thread, and restores the prior context afterwards. The
/// host must restore through an unwind-safe mechanism so restoration also
/// happens when the callback panics.
pub type RunFn = Box<dyn Fn(&ContextHandle, HostCallback) + Send + Sync>;

/// The resolved primitive triple. Exists only when capability detection
/// succeeded for all three.
pub struct HostPrimitives {
    pub adapter: AdapterFn,
    pub capture: CaptureFn,
    pub run: RunFn,
}

/// Resolver for a host's ambient-context primitives.
///
/// Each step may fail independently (a host version may ship some primitives
/// but not others); the bridge treats any failure as all-or-nothing and
/// reports the capability as unsupported.
pub trait HostBinding: Send + Sync {
    fn resolve_adapter(&self) -> Result<AdapterFn, ResolveError>;
    fn resolve_capture(&self) -> Result<CaptureFn, ResolveError>;
    fn resolve_run(&self) -> Result<RunFn, ResolveError>;
}
