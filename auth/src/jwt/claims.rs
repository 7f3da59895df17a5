use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Claims carried by access and refresh tokens.
///
/// No subject claim: a token is bound to an account only by
/// being the value currently stored on that account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,

    /// Random token identifier, keeps two tokens minted in the same second apart
    pub jti: String,
}

impl TokenClaims {
    /// Create claims expiring at the given instant with a fresh `jti`.
    pub fn expiring_at(expires_at: DateTime<Utc>) -> Self {
        Self {
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Check if the token is expired at the given Unix timestamp.
    ///
    /// A token is expired from its `exp` second onwards.
    pub fn is_expired_at(&self, current_timestamp: i64) -> bool {
        current_timestamp >= self.exp
    }

    /// Seconds left until expiration, zero once expired.
    pub fn seconds_remaining(&self, current_timestamp: i64) -> i64 {
        (self.exp - current_timestamp).max(0)
    }
}
