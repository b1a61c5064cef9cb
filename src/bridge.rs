//! Capability detection, context capture, and context-scoped execution.
//!
//! Detection runs at most once per process: the three host primitives are
//! resolved through the installed (or built-in) binding inside a one-shot
//! cell, and the outcome, success or failure, is cached for the remaining
//! process lifetime. All operations after that read the cache lock-free.

use std::sync::OnceLock;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{InstallError, ResolveError};
use crate::host::{ContextHandle, HostBinding, HostPrimitives};

/// Where capability detection stands for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityState {
    /// Detection has not run yet.
    Unknown,
    /// All three host primitives resolved.
    Supported,
    /// Resolution failed; the failure is cached and never retried.
    Unsupported,
}

/// One bridge: a host-binding slot plus the one-shot detection result.
///
/// The crate-level free functions delegate to a single process-wide
/// instance. Separate instances exist so detection behavior can be tested
/// without touching process-global state.
pub struct Bridge {
    binding: RwLock<Option<Box<dyn HostBinding>>>,
    primitives: OnceLock<Option<HostPrimitives>>,
}

impl Bridge {
    pub const fn new() -> Self {
        Bridge {
            binding: RwLock::new(None),
            primitives: OnceLock::new(),
        }
    }

    /// Installs the host binding detection will resolve primitives from.
    ///
    /// Must happen at startup: once detection has run, the outcome is
    /// permanent and a late binding would never be consulted.
    pub fn install_binding(&self, binding: Box<dyn HostBinding>) -> Result<(), InstallError> {
        let mut slot = self.binding.write();
        if self.primitives.get().is_some() {
            return Err(InstallError::AlreadyDetected);
        }
        *slot = Some(binding);
        Ok(())
    }

    /// Whether ambient-context capture and replay are available.
    ///
    /// The first call triggers detection; every later call, from any thread,
    /// observes the same cached answer. Never errors: hosts without the
    /// primitives simply report `false` forever.
    pub fn is_supported(&self) -> bool {
        self.primitives().is_some()
    }

    /// Detection status without triggering detection.
    pub fn capability_state(&self) -> CapabilityState {
        match self.primitives.get() {
            None => CapabilityState::Unknown,
            Some(Some(_)) => CapabilityState::Supported,
            Some(None) => CapabilityState::Unsupported,
        }
    }

    /// Snapshots the current thread's ambient context.
    ///
    /// Capturing does not alter the current ambient context, and the bridge
    /// does not retain the handle. Panics when the capability is
    /// unsupported; callers gate on [`Bridge::is_supported`] first, and the
    /// panic is deliberate so integration errors surface instead of being
    /// masked.
    pub fn capture(&self) -> ContextHandle {
        let primitives = self
            .primitives()
            .expect("ambient-context capture on an unsupported host; gate on is_supported");
        (primitives.capture)()
    }

    /// Runs `callback` with the captured context installed as the current
    /// thread's ambient context, synchronously, then restores the prior
    /// context.
    ///
    /// Restoration is guaranteed by the host run primitive even when the
    /// callback panics; the panic then propagates to the caller. Panics when
    /// the capability is unsupported, same contract as [`Bridge::capture`].
    pub fn run<F>(&self, handle: &ContextHandle, callback: F)
    where
        F: FnOnce() + 'static,
    {
        let primitives = self
            .primitives()
            .expect("ambient-context run on an unsupported host; gate on is_supported");
        // Adapted fresh on every call; each callback closes over its own state.
        let adapted = (primitives.adapter)(Box::new(callback));
        (primitives.run)(handle, adapted);
    }

    /// Runs detection at most once and returns the cached primitives.
    ///
    /// Concurrent first callers serialize on the one-shot cell and converge
    /// on a single resolution; afterwards the read is lock-free.
    fn primitives(&self) -> Option<&HostPrimitives> {
        self.primitives
            .get_or_init(|| match self.resolve() {
                Ok(primitives) => {
                    debug!("ambient-context host primitives resolved");
                    Some(primitives)
                }
                Err(err) => {
                    // Swallowed: absence of the capability is not an error.
                    debug!(error = %err, "ambient-context capability unavailable");
                    None
                }
            })
            .as_ref()
    }

    /// Resolves the primitives in order: callback adapter, capture, run.
    /// The first failure abandons all three.
    fn resolve(&self) -> Result<HostPrimitives, ResolveError> {
        let slot = self.binding.read();
        let binding: &dyn HostBinding = match slot.as_deref() {
            Some(installed) => installed,
            None => fallback_binding()?,
        };

        Ok(HostPrimitives {
            adapter: binding.resolve_adapter()?,
            capture: binding.resolve_capture()?,
            run: binding.resolve_run()?,
        })
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Bridge::new()
    }
}

#[cfg(feature = "local-host")]
fn fallback_binding() -> Result<&'static dyn HostBinding, ResolveError> {
    static LOCAL: crate::host::local::LocalHostBinding = crate::host::local::LocalHostBinding;
    Ok(&LOCAL)
}

#[cfg(not(feature = "local-host"))]
fn fallback_binding() -> Result<&'static dyn HostBinding, ResolveError> {
    Err(ResolveError::NoHost)
}

static GLOBAL: Bridge = Bridge::new();

/// Whether ambient-context capture and replay are available in this process.
/// See [`Bridge::is_supported`].
pub fn is_supported() -> bool {
    GLOBAL.is_supported()
}

/// Detection status of the process-wide bridge, without triggering detection.
pub fn capability_state() -> CapabilityState {
    GLOBAL.capability_state()
}

/// Snapshots the current ambient context. See [`Bridge::capture`].
pub fn capture() -> ContextHandle {
    GLOBAL.capture()
}

/// Runs `callback` under a previously captured context. See [`Bridge::run`].
pub fn run<F>(handle: &ContextHandle, callback: F)
where
    F: FnOnce() + 'static,
{
    GLOBAL.run(handle, callback)
}

/// Installs a host binding on the process-wide bridge. Startup-time only;
/// fails once detection has run. An installed binding takes precedence over
/// the built-in `local-host` binding.
pub fn install_host_binding(binding: Box<dyn HostBinding>) -> Result<(), InstallError> {
    GLOBAL.install_binding(binding)
}
