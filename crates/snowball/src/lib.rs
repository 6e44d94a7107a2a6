//! Snowball — host-side control plane.
//!
//! Lets a remote client node discover this host on the local network,
//! establish a durable (approval-gated) trust relationship with it, and
//! obtain a bounded grant of compute that is enforced at OS-process launch.
//!
//! The library is the full control plane; the `snowball` binary wires it to
//! a CLI and an HTTP facade.

pub mod api;
pub mod audit;
pub mod config;
pub mod discovery;
pub mod identity;
pub mod pairing;
pub mod policy;
pub mod resources;
pub mod sandbox;
pub mod tokens;
pub mod trust;
