//! Shared application state for the HTTP facade.

use std::sync::Arc;
use std::time::Duration;

use snowball_protocol::NodeIdentity;

use crate::pairing::PairingCoordinator;
use crate::resources::ResourceController;
use crate::sandbox::SandboxManager;

/// Handles to every component a handler may need.
///
/// Built once at startup (dependency injection, no ambient globals) and
/// cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub identity: NodeIdentity,
    pub coordinator: Arc<PairingCoordinator>,
    pub controller: Arc<ResourceController>,
    pub sandbox: Arc<SandboxManager>,
    /// UDP port broadcast probes target.
    pub discovery_port: u16,
    /// Default collection window for `/discover`.
    pub broadcast_timeout: Duration,
}
