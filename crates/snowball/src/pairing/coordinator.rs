//! The pairing coordinator: request lifecycle, approval, selection.

use anyhow::Result;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use snowball_protocol::{PairingRequest, TrustedHost};

use crate::audit::AuditLogger;
use crate::pairing::approval::ApprovalGate;
use crate::pairing::normalize::normalize;
use crate::trust::TrustStore;

/// Pure-read pairing status, shaped for UI polling.
#[derive(Debug, Clone, Serialize)]
pub struct PairingStatus {
    pub trusted: bool,
    pub status: &'static str,
    pub selected_host: Option<TrustedHost>,
    pub trusted_hosts: Vec<TrustedHost>,
}

/// Owns pairing requests and the single selected-host pointer.
///
/// Constructed once at process start and passed by handle — there is no
/// ambient registry. The selected host is an id that must resolve through
/// the trust store, never an owning copy of the record.
pub struct PairingCoordinator {
    store: Arc<TrustStore>,
    gate: Arc<dyn ApprovalGate>,
    audit: AuditLogger,
    requests: Mutex<HashMap<String, PairingRequest>>,
    selected: Mutex<Option<String>>,
}

impl PairingCoordinator {
    pub fn new(store: Arc<TrustStore>, gate: Arc<dyn ApprovalGate>, audit: AuditLogger) -> Self {
        Self {
            store,
            gate,
            audit,
            requests: Mutex::new(HashMap::new()),
            selected: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<TrustStore> {
        &self.store
    }

    /// Build and record a pairing request from a raw payload.
    ///
    /// Never rejects: malformed input normalizes to placeholders and any
    /// validation happens at approval. Requests are retained for audit.
    pub async fn create_request(&self, payload: &Value) -> PairingRequest {
        let normalized = normalize(payload);
        let request = PairingRequest::new(
            normalized.host_id,
            normalized.host_hostname,
            normalized.host_ip,
            normalized.client_id,
            normalized.client_fingerprint,
        );

        self.requests
            .lock()
            .await
            .insert(request.request_id.clone(), request.clone());

        tracing::info!(
            request_id = %request.request_id,
            host_id = %request.host_id,
            ip = %request.host_ip,
            client_id = %request.client_id,
            "pairing request created"
        );
        self.audit
            .log(
                "pairing.request_created",
                json!({
                    "request_id": request.request_id,
                    "host_id": request.host_id,
                    "host_ip": request.host_ip,
                    "client_id": request.client_id,
                }),
            )
            .await;

        request
    }

    /// Approve a pairing request.
    ///
    /// Returns `Ok(false)` for an unknown id or a gate denial — both are
    /// expected outcomes (duplicate clicks, operator said no), not errors.
    /// An `Err` means persistence failed mid-commit; the request is still
    /// unapproved and re-invoking completes the missing steps through
    /// idempotent upserts.
    pub async fn approve(&self, request_id: &str) -> Result<bool> {
        // Snapshot without holding the lock across the gate: the decision
        // source may stall indefinitely and must not block other requests.
        let snapshot = match self.requests.lock().await.get(request_id) {
            Some(request) => request.clone(),
            None => {
                tracing::warn!(request_id, "approve failed: unknown request id");
                return Ok(false);
            }
        };

        if snapshot.approved {
            // Already approved: idempotent success. Re-selecting the same
            // host is the only repeated side effect.
            self.select(&snapshot.host_id).await;
            return Ok(true);
        }

        let approved = self
            .gate
            .decide(
                &snapshot.host_hostname,
                &snapshot.host_ip,
                &snapshot.client_fingerprint,
            )
            .await;
        if !approved {
            self.audit
                .log(
                    "pairing.denied",
                    json!({"request_id": request_id, "host_id": snapshot.host_id}),
                )
                .await;
            return Ok(false);
        }

        // Re-check current state: another caller may have finished approval
        // while the gate was deciding.
        {
            let requests = self.requests.lock().await;
            if requests.get(request_id).is_some_and(|r| r.approved) {
                drop(requests);
                self.select(&snapshot.host_id).await;
                return Ok(true);
            }
        }

        // Commit order: host trust, client trust, selection — and only then
        // mark the request approved. A failure part-way leaves the request
        // re-approvable and the upserts idempotent.
        let host = self
            .store
            .trust_host(
                &snapshot.host_id,
                &snapshot.host_hostname,
                &snapshot.host_ip,
                // Host fingerprint is optional at this stage; the wire
                // carries only the client's.
                "",
            )
            .await?;
        self.store
            .trust_client(&snapshot.client_id, &snapshot.client_fingerprint)
            .await?;

        self.select(&host.host_id).await;

        if let Some(request) = self.requests.lock().await.get_mut(request_id) {
            request.approved = true;
        }

        tracing::info!(
            request_id,
            host_id = %host.host_id,
            client_id = %snapshot.client_id,
            "pairing approved"
        );
        self.audit
            .log(
                "pairing.approved",
                json!({
                    "request_id": request_id,
                    "host_id": host.host_id,
                    "client_id": snapshot.client_id,
                }),
            )
            .await;

        Ok(true)
    }

    /// Mark a trusted host as the single active remote target.
    ///
    /// Selecting an unknown host is a no-op that reports failure and leaves
    /// the previous selection untouched.
    pub async fn select(&self, host_id: &str) -> bool {
        if !self.store.is_trusted(host_id).await {
            tracing::warn!(host_id, "select ignored: host not trusted");
            return false;
        }
        *self.selected.lock().await = Some(host_id.to_string());
        tracing::info!(host_id, "selected host");
        true
    }

    /// Current selection, resolved through the trust store.
    pub async fn selected_host(&self) -> Option<TrustedHost> {
        let selected = self.selected.lock().await.clone()?;
        self.store.host(&selected).await
    }

    /// Pure read of the pairing state for `host_id`.
    pub async fn status(&self, host_id: Option<&str>) -> PairingStatus {
        let trusted = match host_id {
            Some(id) => self.store.is_trusted(id).await,
            None => false,
        };
        PairingStatus {
            trusted,
            status: if trusted { "approved" } else { "pending" },
            selected_host: self.selected_host().await,
            trusted_hosts: self.store.hosts().await,
        }
    }

    /// All pairing requests seen by this process, in no particular order.
    pub async fn requests(&self) -> Vec<PairingRequest> {
        self.requests.lock().await.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairing::approval::AutoApproval;

    fn coordinator(dir: &std::path::Path, gate: Arc<dyn ApprovalGate>) -> PairingCoordinator {
        let (store, _) = TrustStore::load(dir);
        PairingCoordinator::new(Arc::new(store), gate, AuditLogger::disabled())
    }

    #[tokio::test]
    async fn full_pairing_flow() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(dir.path(), Arc::new(AutoApproval::granted()));

        let request = coordinator
            .create_request(&json!({
                "host_id": "h1",
                "hostname": "Exon",
                "ip": "192.168.1.10",
            }))
            .await;
        assert!(!request.approved);
        assert!(!request.client_id.is_empty());

        assert!(coordinator.approve(&request.request_id).await.unwrap());

        let status = coordinator.status(Some("h1")).await;
        assert!(status.trusted);
        assert_eq!(status.status, "approved");
        assert_eq!(status.selected_host.unwrap().host_id, "h1");

        // The client side was recorded too.
        let clients = coordinator.store().clients().await;
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].client_id, request.client_id);
    }

    #[tokio::test]
    async fn approve_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(dir.path(), Arc::new(AutoApproval::granted()));

        let request = coordinator
            .create_request(&json!({"host_id": "h1", "ip": "192.168.1.10"}))
            .await;

        assert!(coordinator.approve(&request.request_id).await.unwrap());
        let hosts_after_first = coordinator.store().hosts().await;

        assert!(coordinator.approve(&request.request_id).await.unwrap());
        let hosts_after_second = coordinator.store().hosts().await;

        assert_eq!(hosts_after_first, hosts_after_second);
        assert_eq!(coordinator.store().clients().await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_request_id_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(dir.path(), Arc::new(AutoApproval::granted()));
        assert!(!coordinator.approve("no-such-request").await.unwrap());
    }

    #[tokio::test]
    async fn denied_request_stays_untrusted() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(dir.path(), Arc::new(AutoApproval::denied()));

        let request = coordinator
            .create_request(&json!({"host_id": "h1", "ip": "192.168.1.10"}))
            .await;
        assert!(!coordinator.approve(&request.request_id).await.unwrap());

        let status = coordinator.status(Some("h1")).await;
        assert!(!status.trusted);
        assert_eq!(status.status, "pending");
        assert!(status.selected_host.is_none());
        assert!(status.trusted_hosts.is_empty());
    }

    #[tokio::test]
    async fn select_unknown_host_keeps_previous_selection() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(dir.path(), Arc::new(AutoApproval::granted()));

        // Empty store: selection fails, status stays pending.
        assert!(!coordinator.select("unknown-host").await);
        let status = coordinator.status(None).await;
        assert!(!status.trusted);
        assert_eq!(status.status, "pending");
        assert!(status.selected_host.is_none());
        assert!(status.trusted_hosts.is_empty());

        // After trusting h1, selecting an unknown host must not displace it.
        let request = coordinator
            .create_request(&json!({"host_id": "h1", "ip": "192.168.1.10"}))
            .await;
        coordinator.approve(&request.request_id).await.unwrap();
        assert!(!coordinator.select("still-unknown").await);
        assert_eq!(coordinator.selected_host().await.unwrap().host_id, "h1");
    }

    #[tokio::test]
    async fn selecting_a_new_host_replaces_the_previous_one() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(dir.path(), Arc::new(AutoApproval::granted()));

        for host in ["h1", "h2"] {
            let request = coordinator
                .create_request(&json!({"host_id": host, "ip": "192.168.1.10"}))
                .await;
            coordinator.approve(&request.request_id).await.unwrap();
        }

        // h2 was approved last, so it is selected; switch back to h1.
        assert_eq!(coordinator.selected_host().await.unwrap().host_id, "h2");
        assert!(coordinator.select("h1").await);
        assert_eq!(coordinator.selected_host().await.unwrap().host_id, "h1");
    }

    #[tokio::test]
    async fn repairing_preserves_original_paired_at() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(dir.path(), Arc::new(AutoApproval::granted()));

        let first = coordinator
            .create_request(&json!({"host_id": "h1", "ip": "192.168.1.10"}))
            .await;
        coordinator.approve(&first.request_id).await.unwrap();
        let original = coordinator.store().host("h1").await.unwrap();

        let second = coordinator
            .create_request(&json!({"host_id": "h1", "ip": "192.168.1.99"}))
            .await;
        coordinator.approve(&second.request_id).await.unwrap();
        let refreshed = coordinator.store().host("h1").await.unwrap();

        assert_eq!(refreshed.paired_at, original.paired_at);
        assert_eq!(refreshed.ip, "192.168.1.99");
    }
}
