//! LAN peer discovery over UDP broadcast.
//!
//! Zero-configuration and best-effort by design: a broadcast probe carrying
//! the magic string, answered by any listening responder with its JSON
//! identity. No retries, no delivery guarantee, no authentication beyond
//! the magic-string filter — an empty result means "no peers found", never
//! an error.

mod broadcast;
mod responder;

pub use broadcast::{broadcast, broadcast_to};
pub use responder::DiscoveryResponder;
