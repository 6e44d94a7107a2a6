//! Local node identity.
//!
//! Builds the [`NodeIdentity`] this node answers discovery probes with. The
//! node id must stay stable across restarts on the same machine: we prefer
//! `/etc/machine-id` and otherwise persist a generated uuid in the state
//! directory on first run.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use uuid::Uuid;

use snowball_protocol::{NodeIdentity, NodeRole};

const NODE_ID_FILE: &str = "node_id";
const MACHINE_ID_PATH: &str = "/etc/machine-id";

/// Compute this node's identity.
///
/// `state_dir` holds the fallback node-id file; it is created if missing.
pub fn local_identity(role: NodeRole, state_dir: &Path) -> Result<NodeIdentity> {
    let node_id = stable_node_id(state_dir)?;
    let hostname = local_hostname();
    let ip = local_ip();
    let fingerprint = compute_fingerprint(&node_id, &hostname);

    Ok(NodeIdentity {
        node_id,
        hostname,
        ip,
        role,
        fingerprint,
    })
}

/// Placeholder fingerprint: a hash of non-secret, guessable inputs.
///
/// This identifies a node for display and trust-record bookkeeping. It is
/// NOT cryptographic authentication — anyone who knows the node id and
/// hostname can reproduce it. A real key exchange is a separate phase.
pub fn compute_fingerprint(node_id: &str, hostname: &str) -> String {
    let digest = Sha256::digest(format!("{node_id}:{hostname}").as_bytes());
    format!("SHA256:{}", hex::encode(digest))
}

/// A machine-stable id: `/etc/machine-id` when readable, else a uuid
/// persisted under the state directory.
fn stable_node_id(state_dir: &Path) -> Result<String> {
    if let Ok(raw) = std::fs::read_to_string(MACHINE_ID_PATH) {
        let id = raw.trim();
        if !id.is_empty() {
            return Ok(id.to_string());
        }
    }

    let path = state_dir.join(NODE_ID_FILE);
    if let Ok(raw) = std::fs::read_to_string(&path) {
        let id = raw.trim();
        if !id.is_empty() {
            return Ok(id.to_string());
        }
    }

    let id = Uuid::new_v4().to_string();
    std::fs::create_dir_all(state_dir)
        .with_context(|| format!("creating state directory {}", state_dir.display()))?;
    std::fs::write(&path, &id)
        .with_context(|| format!("persisting node id to {}", path.display()))?;
    Ok(id)
}

fn local_hostname() -> String {
    #[cfg(unix)]
    {
        let uname = rustix::system::uname();
        let nodename = uname.nodename().to_string_lossy();
        if !nodename.is_empty() {
            return nodename.into_owned();
        }
    }
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}

fn local_ip() -> String {
    match local_ip_address::local_ip() {
        Ok(addr) => addr.to_string(),
        Err(err) => {
            tracing::warn!("could not determine LAN address, using loopback: {err}");
            "127.0.0.1".to_string()
        }
    }
}
