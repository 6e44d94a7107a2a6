//! Audit logging for security-relevant control-plane events.
//!
//! Every pairing decision, resource grant and sandbox launch is appended to
//! a JSON-lines file. Audit writes are best-effort: a failing disk must
//! never take the control plane down, so write errors are swallowed after a
//! warning.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// One audit record, serialized as a single JSONL line.
#[derive(Debug, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

/// Append-only JSONL audit sink.
///
/// Cheap to clone; all clones share the same file handle behind a mutex.
#[derive(Clone)]
pub struct AuditLogger {
    inner: Option<Arc<Mutex<File>>>,
    path: Option<PathBuf>,
}

impl AuditLogger {
    /// Open (or create) the audit log at `path`, creating parent directories.
    pub async fn open(path: PathBuf) -> Result<Self> {
        ensure_parent_dir(&path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("opening audit log file {}", path.display()))?;
        Ok(Self {
            inner: Some(Arc::new(Mutex::new(file))),
            path: Some(path),
        })
    }

    /// A logger that drops every event. Used by tests and one-shot CLI
    /// commands that have no state directory.
    pub fn disabled() -> Self {
        Self {
            inner: None,
            path: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record `event` with structured `details`.
    pub async fn log(&self, event: &str, details: Value) {
        let Some(file) = &self.inner else {
            return;
        };
        let record = AuditEvent {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            event: event.to_string(),
            details,
        };
        match serde_json::to_string(&record) {
            Ok(line) => {
                let mut file = file.lock().await;
                if let Err(err) = file.write_all(line.as_bytes()).await {
                    tracing::warn!("audit write failed: {err}");
                    return;
                }
                let _ = file.write_all(b"\n").await;
            }
            Err(err) => tracing::warn!("audit event not serializable: {err}"),
        }
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating audit log directory {}", parent.display()))?;
    }
    Ok(())
}
