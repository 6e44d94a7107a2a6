//! The discovery broadcaster: one probe, collect until the deadline.

use anyhow::{Context, Result};
use chrono::Utc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;

use snowball_protocol::{DISCOVERY_MAGIC, DiscoveredPeer, MAX_DATAGRAM, NodeIdentity};

/// Broadcast a probe on the LAN and collect responses for `timeout`.
///
/// Returns the peers in arrival order; possibly empty, never an error for
/// "nobody answered". Bounded: returns within `timeout` plus scheduling
/// slack regardless of how many peers respond.
pub async fn broadcast(port: u16, timeout: Duration) -> Result<Vec<DiscoveredPeer>> {
    broadcast_to(&format!("255.255.255.255:{port}"), timeout, true).await
}

/// Probe an explicit target address instead of the broadcast address.
///
/// This is the whole discovery exchange minus the routing decision, which
/// keeps it drivable over loopback in tests.
pub async fn broadcast_to(
    target: &str,
    timeout: Duration,
    set_broadcast: bool,
) -> Result<Vec<DiscoveredPeer>> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .await
        .context("binding discovery broadcast socket")?;
    if set_broadcast {
        socket
            .set_broadcast(true)
            .context("enabling SO_BROADCAST")?;
    }

    socket
        .send_to(DISCOVERY_MAGIC.as_bytes(), target)
        .await
        .with_context(|| format!("sending discovery probe to {target}"))?;

    let deadline = Instant::now() + timeout;
    let mut peers = Vec::new();
    let mut buf = [0u8; MAX_DATAGRAM];

    loop {
        let received =
            match tokio::time::timeout_at(deadline, socket.recv_from(&mut buf)).await {
                Err(_) => break, // deadline reached
                Ok(Err(err)) => {
                    tracing::debug!("discovery recv error, continuing: {err}");
                    continue;
                }
                Ok(Ok(received)) => received,
            };

        let (len, addr) = received;
        match serde_json::from_slice::<NodeIdentity>(&buf[..len]) {
            Ok(identity) => {
                tracing::debug!(%addr, node_id = %identity.node_id, "discovered peer");
                peers.push(DiscoveredPeer {
                    identity,
                    seen_at: Utc::now(),
                });
            }
            Err(err) => {
                tracing::debug!(%addr, "skipping malformed discovery response: {err}");
            }
        }
    }

    Ok(peers)
}
