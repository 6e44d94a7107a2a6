//! Discovery wire constants.
//!
//! The LAN discovery protocol is a single UDP exchange: a probe packet whose
//! payload is exactly [`DISCOVERY_MAGIC`], answered with a JSON-encoded
//! [`NodeIdentity`](crate::NodeIdentity). The magic string is a traffic
//! filter, not an authentication mechanism — any listener on the LAN can
//! imitate either role.

/// Fixed UDP port the discovery responder listens on.
pub const DISCOVERY_PORT: u16 = 7042;

/// Probe payload. A responder replies only to packets that match exactly.
pub const DISCOVERY_MAGIC: &str = "SNOWBALL_DISCOVERY_V2";

/// Upper bound on any discovery datagram, probe or response.
pub const MAX_DATAGRAM: usize = 2048;
