//! Ambient Bridge: In-Process Ambient-Context Propagation
//!
//! Captures the ambient context active at one point in a program (security
//! principal, locale, diagnostic state: whatever the host environment keeps
//! in its per-thread slot) as an opaque handle, and later replays a callback
//! inside that captured context, restoring the prior context afterwards.
//!
//! Whether the host platform actually provides ambient-context primitives is
//! discovered exactly once per process and cached; hosts without them degrade
//! permanently and silently to [`is_supported`] reporting `false`.

pub mod bridge;
pub mod error;
pub mod host;

pub use bridge::{capability_state, capture, is_supported, run, CapabilityState};
pub use error::{InstallError, ResolveError};
pub use host::{install_host_binding, ContextHandle, HostBinding, HostPrimitives};
