//! Canonical Snowball types.
//!
//! Shared by the control-plane daemon and external consumers (UI, CLI,
//! automation). Pure data: serde-serializable records plus the discovery
//! wire constants. No I/O lives here.

pub mod discovery;
pub mod identity;
pub mod pairing;
pub mod resources;

pub use discovery::{DISCOVERY_MAGIC, DISCOVERY_PORT, MAX_DATAGRAM};
pub use identity::{DiscoveredPeer, NodeIdentity, NodeRole};
pub use pairing::{PairingRequest, TrustedClient, TrustedHost};
pub use resources::{ResourceError, ResourceGrant, ResourceRequest};
