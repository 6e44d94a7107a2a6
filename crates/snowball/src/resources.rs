//! The resource controller: capability probing and grant issuance.

use serde::Serialize;
use serde_json::json;

use snowball_protocol::{ResourceError, ResourceGrant, ResourceRequest};

use crate::audit::AuditLogger;
use crate::policy::ResourcePolicy;

/// What this machine can enforce, purely informational — nothing is gated
/// on it.
#[derive(Debug, Clone, Serialize)]
pub struct LocalCapabilities {
    pub os: &'static str,
    pub supports_gpu: bool,
    pub supports_cgroups: bool,
}

impl LocalCapabilities {
    pub fn probe() -> Self {
        let os = std::env::consts::OS;
        let linux = os == "linux";
        Self {
            os,
            supports_gpu: linux,
            supports_cgroups: linux,
        }
    }
}

/// Converts resource requests into grants.
///
/// Currently a pass-through policy layer: the grant mirrors the request and
/// enforcement happens at sandbox launch. Requests above the declared
/// policy ceiling are logged, not clamped.
pub struct ResourceController {
    policy: ResourcePolicy,
    audit: AuditLogger,
}

impl ResourceController {
    pub fn new(policy: ResourcePolicy, audit: AuditLogger) -> Self {
        Self { policy, audit }
    }

    pub fn capabilities(&self) -> LocalCapabilities {
        LocalCapabilities::probe()
    }

    pub fn policy(&self) -> &ResourcePolicy {
        &self.policy
    }

    /// Issue a grant for `request`.
    ///
    /// Fails only on an invalid request (CPU share out of range); a valid
    /// request is granted verbatim with a fresh timestamp.
    pub async fn grant(&self, request: &ResourceRequest) -> Result<ResourceGrant, ResourceError> {
        request.validate()?;

        if !self
            .policy
            .within_ceiling(request.cpu_percent, request.ram_mb, request.gpu_layers)
        {
            tracing::warn!(
                cpu = request.cpu_percent,
                ram_mb = request.ram_mb,
                "resource request exceeds local policy ceiling; granting anyway (no clamp policy)"
            );
        }

        let grant = ResourceGrant::mirroring(request);
        self.audit
            .log(
                "resources.granted",
                json!({
                    "cpu": grant.cpu_percent,
                    "ram": grant.ram_mb,
                    "gpu": grant.gpu_layers,
                }),
            )
            .await;
        Ok(grant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn grant_mirrors_request_with_fresh_timestamp() {
        let controller = ResourceController::new(ResourcePolicy::local(), AuditLogger::disabled());
        let request = ResourceRequest::new(50, 2048, None).unwrap();

        let before = chrono::Utc::now();
        let grant = controller.grant(&request).await.unwrap();

        assert_eq!(grant.cpu_percent, 50);
        assert_eq!(grant.ram_mb, 2048);
        assert_eq!(grant.gpu_layers, None);
        assert!(grant.granted_at >= before);
    }

    #[tokio::test]
    async fn over_ceiling_request_is_still_granted() {
        let policy = ResourcePolicy {
            max_cpu_percent: 25,
            ..ResourcePolicy::local()
        };
        let controller = ResourceController::new(policy, AuditLogger::disabled());
        let request = ResourceRequest::new(80, 0, None).unwrap();

        // No clamping in this design: the grant mirrors the ask.
        let grant = controller.grant(&request).await.unwrap();
        assert_eq!(grant.cpu_percent, 80);
    }

    #[test]
    fn capabilities_match_os_family() {
        let caps = LocalCapabilities::probe();
        assert_eq!(caps.os, std::env::consts::OS);
        assert_eq!(caps.supports_cgroups, cfg!(target_os = "linux"));
        assert_eq!(caps.supports_gpu, cfg!(target_os = "linux"));
    }
}
