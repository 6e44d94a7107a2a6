//! Short-lived scoped security tokens.
//!
//! Opaque bearer strings with an expiry check — no signature, no
//! verification beyond possession. Collaborator interface for future
//! session control between paired nodes.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityToken {
    pub token: String,
    pub scope: String,
    pub expires_at: DateTime<Utc>,
}

impl SecurityToken {
    /// Generate a fresh token for `scope`, valid for `ttl_seconds`.
    pub fn generate(scope: impl Into<String>, ttl_seconds: i64) -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self {
            token: URL_SAFE_NO_PAD.encode(bytes),
            scope: scope.into(),
            expires_at: Utc::now() + Duration::seconds(ttl_seconds),
        }
    }

    /// Expiry check only — possession is the whole credential.
    pub fn is_valid(&self) -> bool {
        Utc::now() < self.expires_at
    }
}
