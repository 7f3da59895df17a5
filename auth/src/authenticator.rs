use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::jwt::JwtError;
use crate::jwt::TokenCodec;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and the
/// access/refresh token codecs.
///
/// The two codecs hold distinct signing keys, so an access token never
/// verifies as a refresh token and the other way round.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    access_codec: TokenCodec,
    refresh_codec: TokenCodec,
    lifetimes: TokenLifetimes,
}

/// How long freshly minted tokens stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::minutes(15),
            refresh: Duration::days(30),
        }
    }
}

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `access_secret` - Signing key for access tokens
    /// * `refresh_secret` - Signing key for refresh tokens, must differ from `access_secret`
    /// * `lifetimes` - Validity window of each token kind
    pub fn new(access_secret: &[u8], refresh_secret: &[u8], lifetimes: TokenLifetimes) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            access_codec: TokenCodec::new(access_secret),
            refresh_codec: TokenCodec::new(refresh_secret),
            lifetimes,
        }
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify a password against a stored hash. Empty hashes never match.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Mint a new access/refresh pair valid from now.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token generation failed
    pub fn issue_pair(&self) -> Result<IssuedTokens, JwtError> {
        self.issue_pair_at(Utc::now())
    }

    /// Mint a new access/refresh pair as if issued at `issued_at`.
    pub fn issue_pair_at(&self, issued_at: DateTime<Utc>) -> Result<IssuedTokens, JwtError> {
        let access_expires_at = issued_at + self.lifetimes.access;
        let access_token = self.access_codec.issue(access_expires_at)?;
        let refresh_token = self
            .refresh_codec
            .issue(issued_at + self.lifetimes.refresh)?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            expires_in: (access_expires_at - Utc::now()).num_seconds().max(0),
        })
    }

    /// Codec for access tokens.
    pub fn access_tokens(&self) -> &TokenCodec {
        &self.access_codec
    }

    /// Codec for refresh tokens.
    pub fn refresh_tokens(&self) -> &TokenCodec {
        &self.refresh_codec
    }
}
