//! The sandbox manager: platform gating, audit, spawn.

use serde::Serialize;
use serde_json::json;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

use snowball_protocol::ResourceGrant;

use crate::audit::AuditLogger;
use crate::sandbox::enforcement::LaunchSpec;

/// Sandbox launch errors.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// Resource enforcement is only available on the Linux OS family.
    /// This is fatal for the call — never a fallback to an unconstrained
    /// launch.
    #[error("sandbox launch unsupported on platform '{0}'")]
    UnsupportedPlatform(&'static str),

    /// Nothing to launch.
    #[error("empty command")]
    EmptyCommand,

    /// The wrapped process failed to spawn.
    #[error("spawning sandboxed process: {0}")]
    Spawn(#[from] std::io::Error),

    /// The child exited before a pid could be read.
    #[error("sandboxed process exited before a pid was available")]
    NoPid,
}

/// A running enforced process.
///
/// The pid is valid only while the process is alive; the manager does not
/// track exit, capture output, or meter post-launch usage.
#[derive(Debug, Serialize)]
pub struct SandboxHandle {
    pub pid: u32,
    pub cgroup: Option<String>,
    pub namespace: Option<String>,
}

/// Launches commands under the grant's enforcement primitives.
pub struct SandboxManager {
    audit: AuditLogger,
}

impl SandboxManager {
    pub fn new(audit: AuditLogger) -> Self {
        Self { audit }
    }

    /// Whether this platform can enforce resource grants.
    pub fn supported(&self) -> bool {
        cfg!(target_os = "linux")
    }

    /// Launch `command` under `grant`, returning a handle immediately.
    ///
    /// Spawns detached: no wait, no output capture. Unsupported platforms
    /// fail before anything is spawned.
    pub async fn launch(
        &self,
        command: &[String],
        grant: &ResourceGrant,
    ) -> Result<SandboxHandle, SandboxError> {
        if !self.supported() {
            self.audit
                .log(
                    "sandbox.unsupported_platform",
                    json!({"platform": std::env::consts::OS}),
                )
                .await;
            return Err(SandboxError::UnsupportedPlatform(std::env::consts::OS));
        }
        let spec = LaunchSpec::from_grant(command, grant).ok_or(SandboxError::EmptyCommand)?;

        self.audit
            .log(
                "sandbox.launch",
                json!({
                    "cpu": grant.cpu_percent,
                    "ram": grant.ram_mb,
                    "gpu": grant.gpu_layers,
                    "command": command[0],
                }),
            )
            .await;

        let argv = spec.to_argv();
        tracing::info!(argv = ?argv, "launching sandboxed process");

        let child = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .spawn()?;
        let pid = child.id().ok_or(SandboxError::NoPid)?;

        Ok(SandboxHandle {
            pid,
            cgroup: None,
            namespace: None,
        })
    }
}
