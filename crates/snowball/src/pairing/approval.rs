//! The approval gate: the external decision point for pairing.

use async_trait::async_trait;
use std::io::Write;

/// Decides whether a pairing request is approved.
///
/// The decision source can be a human at a terminal, a UI popup relayed
/// over the API, or an automated policy. A gate may take arbitrarily long;
/// the request stays unapproved until a decision arrives.
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    async fn decide(&self, hostname: &str, ip: &str, fingerprint: &str) -> bool;
}

/// A fixed decision.
///
/// The HTTP facade runs with [`AutoApproval::granted`]: an inbound approve
/// call already carries the operator's "yes" (the UI popup happened on the
/// other side of the API), so the gate must not second-guess it.
pub struct AutoApproval {
    decision: bool,
}

impl AutoApproval {
    pub fn granted() -> Self {
        Self { decision: true }
    }

    pub fn denied() -> Self {
        Self { decision: false }
    }
}

#[async_trait]
impl ApprovalGate for AutoApproval {
    async fn decide(&self, _hostname: &str, _ip: &str, _fingerprint: &str) -> bool {
        self.decision
    }
}

/// Interactive y/N prompt on the controlling terminal.
///
/// Used by the `pair` CLI command. Runs the blocking stdin read on the
/// blocking pool so the runtime stays responsive.
pub struct ConsoleApproval;

#[async_trait]
impl ApprovalGate for ConsoleApproval {
    async fn decide(&self, hostname: &str, ip: &str, fingerprint: &str) -> bool {
        let hostname = hostname.to_string();
        let ip = ip.to_string();
        let fingerprint = fingerprint.to_string();

        let answer = tokio::task::spawn_blocking(move || {
            let mut out = std::io::stdout();
            let _ = writeln!(out, "\n=== SNOWBALL — PAIRING REQUEST ===");
            let _ = writeln!(out, "Host:        {hostname}");
            let _ = writeln!(out, "IP:          {ip}");
            let _ = writeln!(out, "Fingerprint: {fingerprint}");
            let _ = write!(out, "Approve connection? [y/N] ");
            let _ = out.flush();

            let mut line = String::new();
            if std::io::stdin().read_line(&mut line).is_err() {
                return false;
            }
            line.trim().eq_ignore_ascii_case("y")
        })
        .await;

        answer.unwrap_or(false)
    }
}
