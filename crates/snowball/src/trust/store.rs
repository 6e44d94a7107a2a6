//! The trust store: durable maps of trusted hosts and trusted clients.
//!
//! Two independent JSON documents under the trust directory, each an array
//! of records, fully rewritten on every mutation. The store is the single
//! writer to both files; the load-modify-save sequence runs under one
//! internal mutex so racing approvals cannot lose updates.
//!
//! Load policy is availability-over-integrity: a missing file is an empty
//! store, and a corrupt file *also* starts empty — but corruption is
//! reported distinctly so operators learn their trust list was dropped
//! instead of being silently desynchronized.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use snowball_protocol::{TrustedClient, TrustedHost};

pub const TRUSTED_HOSTS_FILE: &str = "trusted_hosts.json";
pub const TRUSTED_CLIENTS_FILE: &str = "trusted_clients.json";

/// Outcome of reading one persisted record file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadReport {
    /// File present and parsed; holds the number of records kept.
    Loaded(usize),
    /// File absent — a fresh install, not an error.
    Missing,
    /// File present but unparseable. The store starts empty; previously
    /// trusted peers are forgotten until re-paired.
    Corrupt,
}

/// Load outcome for both record files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrustStoreReport {
    pub hosts: LoadReport,
    pub clients: LoadReport,
}

impl TrustStoreReport {
    pub fn any_corrupt(&self) -> bool {
        self.hosts == LoadReport::Corrupt || self.clients == LoadReport::Corrupt
    }
}

#[derive(Default)]
struct Inner {
    hosts: BTreeMap<String, TrustedHost>,
    clients: BTreeMap<String, TrustedClient>,
}

/// Single-writer store of trusted hosts and clients.
pub struct TrustStore {
    dir: PathBuf,
    inner: Mutex<Inner>,
}

impl TrustStore {
    /// Load both record files from `dir`, reporting the per-file outcome.
    pub fn load(dir: impl Into<PathBuf>) -> (Self, TrustStoreReport) {
        let dir = dir.into();
        let mut inner = Inner::default();

        let hosts_report = read_records(&dir.join(TRUSTED_HOSTS_FILE), |host: TrustedHost| {
            inner.hosts.insert(host.host_id.clone(), host);
        });
        let clients_report =
            read_records(&dir.join(TRUSTED_CLIENTS_FILE), |client: TrustedClient| {
                inner.clients.insert(client.client_id.clone(), client);
            });

        let report = TrustStoreReport {
            hosts: hosts_report,
            clients: clients_report,
        };
        if report.any_corrupt() {
            tracing::warn!(
                dir = %dir.display(),
                "trust store corrupt; starting empty — previously trusted peers must re-pair"
            );
        }

        (
            Self {
                dir,
                inner: Mutex::new(inner),
            },
            report,
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Add or refresh a trusted host and persist the host records.
    ///
    /// Refreshes only the fields that arrive non-empty; the original
    /// `paired_at` is preserved on re-pairing.
    pub async fn trust_host(
        &self,
        host_id: &str,
        hostname: &str,
        ip: &str,
        fingerprint: &str,
    ) -> Result<TrustedHost> {
        let mut inner = self.inner.lock().await;

        let host = match inner.hosts.get_mut(host_id) {
            Some(existing) => {
                if !hostname.is_empty() {
                    existing.hostname = hostname.to_string();
                }
                if !ip.is_empty() {
                    existing.ip = ip.to_string();
                }
                if !fingerprint.is_empty() {
                    existing.fingerprint = fingerprint.to_string();
                }
                existing.clone()
            }
            None => {
                let host = TrustedHost {
                    host_id: host_id.to_string(),
                    hostname: if hostname.is_empty() {
                        host_id.to_string()
                    } else {
                        hostname.to_string()
                    },
                    ip: ip.to_string(),
                    fingerprint: fingerprint.to_string(),
                    paired_at: Utc::now(),
                };
                inner.hosts.insert(host_id.to_string(), host.clone());
                host
            }
        };

        self.save_hosts(&inner)?;
        tracing::info!(host_id, hostname = %host.hostname, ip = %host.ip, "trusted host saved");
        Ok(host)
    }

    /// Add or refresh a trusted client and persist the client records.
    pub async fn trust_client(&self, client_id: &str, fingerprint: &str) -> Result<TrustedClient> {
        let mut inner = self.inner.lock().await;

        let client = match inner.clients.get_mut(client_id) {
            Some(existing) => {
                if !fingerprint.is_empty() {
                    existing.fingerprint = fingerprint.to_string();
                }
                existing.clone()
            }
            None => {
                let client = TrustedClient {
                    client_id: client_id.to_string(),
                    fingerprint: fingerprint.to_string(),
                    paired_at: Utc::now(),
                };
                inner.clients.insert(client_id.to_string(), client.clone());
                client
            }
        };

        self.save_clients(&inner)?;
        Ok(client)
    }

    pub async fn is_trusted(&self, host_id: &str) -> bool {
        self.inner.lock().await.hosts.contains_key(host_id)
    }

    pub async fn host(&self, host_id: &str) -> Option<TrustedHost> {
        self.inner.lock().await.hosts.get(host_id).cloned()
    }

    pub async fn hosts(&self) -> Vec<TrustedHost> {
        self.inner.lock().await.hosts.values().cloned().collect()
    }

    pub async fn clients(&self) -> Vec<TrustedClient> {
        self.inner.lock().await.clients.values().cloned().collect()
    }

    fn save_hosts(&self, inner: &Inner) -> Result<()> {
        let records: Vec<&TrustedHost> = inner.hosts.values().collect();
        write_records(&self.dir, TRUSTED_HOSTS_FILE, &records)
    }

    fn save_clients(&self, inner: &Inner) -> Result<()> {
        let records: Vec<&TrustedClient> = inner.clients.values().collect();
        write_records(&self.dir, TRUSTED_CLIENTS_FILE, &records)
    }
}

/// Read an array-of-records file, feeding each decodable entry to `keep`.
///
/// The array is parsed as raw JSON values first so one undecodable entry
/// (schema drift, manual edits) drops that entry, not the whole file.
fn read_records<T, F>(path: &Path, mut keep: F) -> LoadReport
where
    T: serde::de::DeserializeOwned,
    F: FnMut(T),
{
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return LoadReport::Missing,
        Err(err) => {
            tracing::warn!(path = %path.display(), "trust record unreadable: {err}");
            return LoadReport::Corrupt;
        }
    };

    let entries: Vec<Value> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(path = %path.display(), "trust record unparseable: {err}");
            return LoadReport::Corrupt;
        }
    };

    let mut kept = 0usize;
    for entry in entries {
        match serde_json::from_value::<T>(entry) {
            Ok(record) => {
                keep(record);
                kept += 1;
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), "skipping undecodable trust entry: {err}");
            }
        }
    }
    LoadReport::Loaded(kept)
}

/// Full-overwrite rewrite of one record file.
fn write_records<T: Serialize>(dir: &Path, file: &str, records: &[T]) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating trust directory {}", dir.display()))?;
    let path = dir.join(file);
    let body = serde_json::to_string_pretty(records).context("serializing trust records")?;
    std::fs::write(&path, body)
        .with_context(|| format!("writing trust records to {}", path.display()))
}
