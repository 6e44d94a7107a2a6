//! Daemon configuration.
//!
//! Settings come from a TOML file under the per-user config directory
//! (default `~/.config/snowball/config.toml`), layered with `SNOWBALL__*`
//! environment variables. Every field has a default so a missing file is a
//! fully working configuration.

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use snowball_protocol::{DISCOVERY_PORT, NodeRole};

pub const APP_NAME: &str = "snowball";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub node: NodeSettings,
    pub discovery: DiscoverySettings,
    pub api: ApiSettings,
    pub pairing: PairingSettings,
    pub paths: PathSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSettings {
    /// Role advertised over discovery.
    pub role: NodeRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// UDP port for the responder and broadcast probes.
    pub port: u16,
    /// Hard bound on how long a broadcast collects responses.
    pub broadcast_timeout_ms: u64,
    /// Whether `serve` starts the background responder.
    pub responder_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Bind address of the control-plane HTTP facade.
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingSettings {
    /// When true, `approve` skips the interactive gate. The HTTP facade
    /// always runs with this on: an inbound approve call *is* the
    /// operator's decision.
    pub auto_approve: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PathSettings {
    /// State directory (node id, trust records, audit log). Defaults to the
    /// per-user config dir.
    pub state_dir: Option<PathBuf>,
    /// Override for the directory holding the trust records. Defaults to
    /// the state directory.
    pub trust_dir: Option<PathBuf>,
    /// Override for the audit log path.
    pub audit_log: Option<PathBuf>,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            role: NodeRole::Host,
        }
    }
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            port: DISCOVERY_PORT,
            broadcast_timeout_ms: 1200,
            responder_enabled: true,
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:7040".to_string(),
        }
    }
}

impl Default for PairingSettings {
    fn default() -> Self {
        Self { auto_approve: true }
    }
}

impl Settings {
    /// Load settings, layering the TOML file (if present) under
    /// `SNOWBALL__*` environment variables.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let path = match config_file {
            Some(p) => p.to_path_buf(),
            None => default_config_file(),
        };

        let built = Config::builder()
            .add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix("SNOWBALL").separator("__"))
            .build()
            .context("building configuration")?;

        built
            .try_deserialize()
            .with_context(|| format!("parsing configuration from {}", path.display()))
    }

    /// Directory holding the node id, trust records and audit log.
    pub fn state_dir(&self) -> PathBuf {
        self.paths
            .state_dir
            .clone()
            .unwrap_or_else(default_state_dir)
    }

    /// Directory holding the trust record files.
    pub fn trust_dir(&self) -> PathBuf {
        self.paths
            .trust_dir
            .clone()
            .unwrap_or_else(|| self.state_dir())
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.paths
            .audit_log
            .clone()
            .unwrap_or_else(|| self.state_dir().join("audit.jsonl"))
    }
}

fn default_config_file() -> PathBuf {
    default_state_dir().join("config.toml")
}

fn default_state_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
        })
        .join(APP_NAME)
}
