//! Sandboxed process launch with resource enforcement.
//!
//! Linux-first, no container runtime: the grant's CPU share maps to process
//! niceness and the RAM ceiling to a transient `systemd-run` scope with
//! `MemoryMax`. On any other platform launching fails hard — a silent
//! fallback to an unconstrained process would defeat the isolation
//! guarantee that is this component's entire purpose.

mod enforcement;
mod manager;

pub use enforcement::LaunchSpec;
pub use manager::{SandboxError, SandboxHandle, SandboxManager};
