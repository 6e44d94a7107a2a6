//! The discovery responder: answers probes with the local identity.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;

use snowball_protocol::{DISCOVERY_MAGIC, MAX_DATAGRAM, NodeIdentity};

/// Long-lived UDP responder.
///
/// Binds at construction so a port conflict or missing privilege surfaces
/// to the caller immediately — the daemon logs it and keeps running without
/// discovery rather than crashing. `run` then loops for the lifetime of the
/// process.
pub struct DiscoveryResponder {
    socket: UdpSocket,
    reply: Vec<u8>,
}

impl DiscoveryResponder {
    /// Bind the responder socket on all interfaces at `port`.
    pub async fn bind(identity: &NodeIdentity, port: u16) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", port))
            .await
            .with_context(|| format!("binding discovery responder on udp/{port}"))?;
        let reply = serde_json::to_vec(identity).context("encoding identity reply")?;
        Ok(Self { socket, reply })
    }

    /// Address the responder actually bound (useful when `port` was 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Answer probes forever.
    ///
    /// Packets whose payload is not exactly the magic string are ignored at
    /// debug level; transient socket errors back off briefly and continue.
    pub async fn run(self) {
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            let (len, addr) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(err) => {
                    tracing::warn!("discovery responder recv error: {err}");
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    continue;
                }
            };

            let probe = String::from_utf8_lossy(&buf[..len]);
            if probe.trim() != DISCOVERY_MAGIC {
                tracing::debug!(%addr, "ignoring non-discovery packet");
                continue;
            }

            if let Err(err) = self.socket.send_to(&self.reply, addr).await {
                tracing::warn!(%addr, "discovery reply failed: {err}");
            } else {
                tracing::debug!(%addr, "answered discovery probe");
            }
        }
    }
}
