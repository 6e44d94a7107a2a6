//! Pairing and trust records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One attempt to establish trust between a client and a host.
///
/// Requests are retained for audit after resolution; `approved` transitions
/// false → true at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingRequest {
    pub request_id: String,

    // Host side (the remote machine offering compute).
    pub host_id: String,
    pub host_hostname: String,
    pub host_ip: String,

    // Client side (the machine asking to pair).
    pub client_id: String,
    pub client_fingerprint: String,

    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub approved: bool,
}

impl PairingRequest {
    /// Build a fresh, unapproved request with a generated id.
    pub fn new(
        host_id: impl Into<String>,
        host_hostname: impl Into<String>,
        host_ip: impl Into<String>,
        client_id: impl Into<String>,
        client_fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            host_id: host_id.into(),
            host_hostname: host_hostname.into(),
            host_ip: host_ip.into(),
            client_id: client_id.into(),
            client_fingerprint: client_fingerprint.into(),
            created_at: Utc::now(),
            approved: false,
        }
    }
}

/// Durable trust record for a host-role peer.
///
/// Later pairings may refresh `hostname`/`ip`/`fingerprint`, but a set
/// `paired_at` is never reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustedHost {
    pub host_id: String,
    pub hostname: String,
    pub ip: String,
    pub fingerprint: String,
    pub paired_at: DateTime<Utc>,
}

/// Durable trust record for a client-role peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustedClient {
    pub client_id: String,
    pub fingerprint: String,
    pub paired_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_request_starts_unapproved_with_unique_id() {
        let a = PairingRequest::new("h1", "exon", "192.168.1.10", "c1", "");
        let b = PairingRequest::new("h1", "exon", "192.168.1.10", "c1", "");
        assert!(!a.approved);
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn trusted_host_tolerates_unknown_fields() {
        let raw = r#"{
            "host_id": "h1",
            "hostname": "exon",
            "ip": "192.168.1.10",
            "fingerprint": "",
            "paired_at": "2026-01-05T10:00:00Z",
            "future_field": 42
        }"#;
        let host: TrustedHost = serde_json::from_str(raw).unwrap();
        assert_eq!(host.host_id, "h1");
    }
}
