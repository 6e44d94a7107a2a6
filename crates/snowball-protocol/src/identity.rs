//! Node identity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role a node advertises over discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Consumes host resources (the machine asking for compute).
    Client,
    /// Offers bounded compute to paired clients.
    Host,
}

impl NodeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Client => "client",
            NodeRole::Host => "host",
        }
    }
}

/// A node's self-description, broadcast in discovery responses.
///
/// Computed once per process start and immutable afterwards. `node_id` is
/// stable across restarts on the same machine. The fingerprint is a hash of
/// non-secret inputs — a placeholder for a future key exchange, not proof of
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub node_id: String,
    pub hostname: String,
    pub ip: String,
    pub role: NodeRole,
    pub fingerprint: String,
}

/// A discovery response tagged with its receipt time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredPeer {
    #[serde(flatten)]
    pub identity: NodeIdentity,
    pub seen_at: DateTime<Utc>,
}
