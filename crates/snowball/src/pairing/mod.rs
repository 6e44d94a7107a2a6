//! Pairing: turning a discovered peer into a durable trust relationship.
//!
//! The lifecycle is a small state machine per request: `CREATED` →
//! `APPROVED` (terminal) or a denial that leaves the request unapproved.
//! Approval is gated by an [`ApprovalGate`] — interactive or automated —
//! and commits to the [`TrustStore`](crate::trust::TrustStore) before the
//! request is marked approved, so a partial failure is always recoverable
//! by re-approving.

mod approval;
mod coordinator;
mod normalize;

pub use approval::{ApprovalGate, AutoApproval, ConsoleApproval};
pub use coordinator::{PairingCoordinator, PairingStatus};
pub use normalize::{NormalizedPairing, normalize};
