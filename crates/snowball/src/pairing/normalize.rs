//! Pairing-payload normalization.
//!
//! Requests arrive from heterogeneous callers (UI, discovery results,
//! historical automations) that disagree on key names. Normalization maps
//! that loosely-typed JSON object onto one strongly-typed value with a
//! documented precedence order — the precedence is the contract, not an
//! accident of fallback chains.

use serde_json::Value;
use uuid::Uuid;

/// Fallback host id when a payload carries no identifying field at all.
pub const UNKNOWN_HOST_ID: &str = "unknown-host";

/// The strongly-typed result of payload normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPairing {
    pub host_id: String,
    pub host_hostname: String,
    pub host_ip: String,
    pub client_id: String,
    pub client_fingerprint: String,
}

/// Normalize a raw pairing payload.
///
/// Precedence (first non-empty string wins):
/// - host id:            `host_id` > `node_id` > `hostname` > `ip`, else
///   [`UNKNOWN_HOST_ID`]
/// - host hostname:      `hostname`, else the resolved host id
/// - host ip:            `ip` > `host_ip`, else empty
/// - client id:          `client_id` > `node_id`, else a fresh uuid v4
/// - client fingerprint: `client_fingerprint` > `fingerprint`, else empty
///
/// Never fails: malformed or empty payloads normalize to placeholder
/// values, and validation happens at approval time, not here.
pub fn normalize(payload: &Value) -> NormalizedPairing {
    let host_id = first_string(payload, &["host_id", "node_id", "hostname", "ip"])
        .unwrap_or_else(|| UNKNOWN_HOST_ID.to_string());
    let host_hostname = first_string(payload, &["hostname"]).unwrap_or_else(|| host_id.clone());
    let host_ip = first_string(payload, &["ip", "host_ip"]).unwrap_or_default();

    let client_id = first_string(payload, &["client_id", "node_id"])
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let client_fingerprint =
        first_string(payload, &["client_fingerprint", "fingerprint"]).unwrap_or_default();

    NormalizedPairing {
        host_id,
        host_hostname,
        host_ip,
        client_id,
        client_fingerprint,
    }
}

fn first_string(payload: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = payload.get(*key).and_then(Value::as_str) {
            if !s.is_empty() {
                return Some(s.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn host_id_precedence_order() {
        let full = json!({"host_id": "a", "node_id": "b", "hostname": "c", "ip": "d"});
        assert_eq!(normalize(&full).host_id, "a");

        let no_host_id = json!({"node_id": "b", "hostname": "c", "ip": "d"});
        assert_eq!(normalize(&no_host_id).host_id, "b");

        let hostname_only = json!({"hostname": "c", "ip": "d"});
        assert_eq!(normalize(&hostname_only).host_id, "c");

        let ip_only = json!({"ip": "d"});
        assert_eq!(normalize(&ip_only).host_id, "d");
    }

    #[test]
    fn empty_payload_uses_placeholders() {
        let normalized = normalize(&json!({}));
        assert_eq!(normalized.host_id, UNKNOWN_HOST_ID);
        assert_eq!(normalized.host_hostname, UNKNOWN_HOST_ID);
        assert_eq!(normalized.host_ip, "");
        assert_eq!(normalized.client_fingerprint, "");
        // Missing client id generates a fresh one.
        assert!(!normalized.client_id.is_empty());
    }

    #[test]
    fn generated_client_ids_are_unique() {
        let a = normalize(&json!({"host_id": "h"}));
        let b = normalize(&json!({"host_id": "h"}));
        assert_ne!(a.client_id, b.client_id);
    }

    #[test]
    fn client_id_prefers_explicit_over_node_id() {
        let normalized = normalize(&json!({"client_id": "c1", "node_id": "n1"}));
        assert_eq!(normalized.client_id, "c1");

        let from_node = normalize(&json!({"node_id": "n1"}));
        assert_eq!(from_node.client_id, "n1");
    }

    #[test]
    fn hostname_defaults_to_host_id() {
        let normalized = normalize(&json!({"host_id": "h1", "ip": "192.168.1.10"}));
        assert_eq!(normalized.host_hostname, "h1");
        assert_eq!(normalized.host_ip, "192.168.1.10");
    }

    #[test]
    fn empty_strings_do_not_shadow_later_keys() {
        let normalized = normalize(&json!({"host_id": "", "node_id": "n1"}));
        assert_eq!(normalized.host_id, "n1");
    }

    #[test]
    fn fingerprint_precedence() {
        let normalized = normalize(&json!({"client_fingerprint": "a", "fingerprint": "b"}));
        assert_eq!(normalized.client_fingerprint, "a");

        let fallback = normalize(&json!({"fingerprint": "b"}));
        assert_eq!(fallback.client_fingerprint, "b");
    }
}
