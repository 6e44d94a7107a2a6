//! Durable trust records.

mod store;

pub use store::{LoadReport, TrustStore, TrustStoreReport};
