//! Static resource-policy defaults.
//!
//! The policy declares what this machine is willing to share. It is
//! currently informational: the controller reports when a request exceeds
//! the ceiling but does not clamp the grant (see DESIGN.md — whether
//! clamping is intended is an open question inherited from the reference
//! behavior).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcePolicy {
    pub allow_llm: bool,
    pub allow_embeddings: bool,
    pub allow_backend: bool,
    pub max_cpu_percent: u8,
    pub max_ram_mb: Option<u64>,
    pub max_gpu_layers: Option<u32>,
}

impl Default for ResourcePolicy {
    fn default() -> Self {
        Self {
            allow_llm: false,
            allow_embeddings: false,
            allow_backend: false,
            max_cpu_percent: 100,
            max_ram_mb: None,
            max_gpu_layers: None,
        }
    }
}

impl ResourcePolicy {
    /// The default policy for the local machine: workloads allowed, full
    /// CPU ceiling, no RAM/GPU limit declared.
    pub fn local() -> Self {
        Self {
            allow_llm: true,
            allow_embeddings: true,
            allow_backend: true,
            max_cpu_percent: 100,
            ..Self::default()
        }
    }

    /// Whether `request` fits inside the declared ceilings.
    pub fn within_ceiling(&self, cpu_percent: u8, ram_mb: u64, gpu_layers: Option<u32>) -> bool {
        if cpu_percent > self.max_cpu_percent {
            return false;
        }
        if let Some(max_ram) = self.max_ram_mb {
            if ram_mb > max_ram {
                return false;
            }
        }
        if let (Some(max_layers), Some(layers)) = (self.max_gpu_layers, gpu_layers) {
            if layers > max_layers {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_policy_allows_workloads() {
        let policy = ResourcePolicy::local();
        assert!(policy.allow_llm);
        assert!(policy.allow_embeddings);
        assert!(policy.allow_backend);
        assert_eq!(policy.max_cpu_percent, 100);
    }

    #[test]
    fn ceiling_checks() {
        let policy = ResourcePolicy {
            max_cpu_percent: 50,
            max_ram_mb: Some(1024),
            max_gpu_layers: Some(8),
            ..ResourcePolicy::local()
        };
        assert!(policy.within_ceiling(50, 1024, Some(8)));
        assert!(!policy.within_ceiling(51, 0, None));
        assert!(!policy.within_ceiling(10, 2048, None));
        assert!(!policy.within_ceiling(10, 0, Some(9)));
        // No GPU ask never trips the GPU ceiling.
        assert!(policy.within_ceiling(10, 0, None));
    }
}
