//! Resource request and grant types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Resource validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceError {
    /// CPU share outside the 0..=100 range.
    #[error("cpu_percent must be within 0..=100, got {0}")]
    CpuOutOfRange(u16),
}

/// A bounded ask for host compute.
///
/// `ram_mb == 0` means "no memory ceiling requested". Immutable value type;
/// construct through [`ResourceRequest::new`] to get the range checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub cpu_percent: u8,
    pub ram_mb: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_layers: Option<u32>,
}

impl ResourceRequest {
    pub fn new(cpu_percent: u16, ram_mb: u64, gpu_layers: Option<u32>) -> Result<Self, ResourceError> {
        if cpu_percent > 100 {
            return Err(ResourceError::CpuOutOfRange(cpu_percent));
        }
        Ok(Self {
            cpu_percent: cpu_percent as u8,
            ram_mb,
            gpu_layers,
        })
    }

    /// Validate a deserialized request (serde cannot range-check cpu beyond u8).
    pub fn validate(&self) -> Result<(), ResourceError> {
        if self.cpu_percent > 100 {
            return Err(ResourceError::CpuOutOfRange(self.cpu_percent as u16));
        }
        Ok(())
    }
}

/// The controller's answer to a [`ResourceRequest`].
///
/// Mirrors the request field-for-field; enforcement happens at sandbox
/// launch, not here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceGrant {
    pub cpu_percent: u8,
    pub ram_mb: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_layers: Option<u32>,
    pub granted_at: DateTime<Utc>,
}

impl ResourceGrant {
    /// Issue a grant mirroring `request`, stamped now.
    pub fn mirroring(request: &ResourceRequest) -> Self {
        Self {
            cpu_percent: request.cpu_percent,
            ram_mb: request.ram_mb,
            gpu_layers: request.gpu_layers,
            granted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_cpu_above_hundred() {
        assert_eq!(
            ResourceRequest::new(101, 0, None),
            Err(ResourceError::CpuOutOfRange(101))
        );
        assert!(ResourceRequest::new(100, 0, None).is_ok());
        assert!(ResourceRequest::new(0, 0, None).is_ok());
    }

    #[test]
    fn grant_mirrors_request() {
        let request = ResourceRequest::new(50, 2048, None).unwrap();
        let grant = ResourceGrant::mirroring(&request);
        assert_eq!(grant.cpu_percent, 50);
        assert_eq!(grant.ram_mb, 2048);
        assert_eq!(grant.gpu_layers, None);
    }

    #[test]
    fn gpu_layers_omitted_when_absent() {
        let request = ResourceRequest::new(50, 2048, None).unwrap();
        let value = serde_json::to_value(request).unwrap();
        assert!(value.get("gpu_layers").is_none());
    }
}
