use std::collections::HashSet;

use chrono::DateTime;
use chrono::Utc;
use jsonwebtoken::crypto;
use jsonwebtoken::decode;
use jsonwebtoken::decode_header;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::TokenClaims;
use super::errors::JwtError;

/// Signed, expiring token codec bound to one signing key.
///
/// Uses HS256 (HMAC with SHA-256). Signature and expiry are checked by
/// separate predicates so callers can tell a tampered token from a stale one.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl TokenCodec {
    /// Create a codec with a secret signing key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (should be stored securely)
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Access and refresh tokens must use different secrets
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        }
    }

    /// Issue a token expiring at `expires_at`.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(&self, expires_at: DateTime<Utc>) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);
        let claims = TokenClaims::expiring_at(expires_at);

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Parse a token's claims without checking the signature or expiry.
    ///
    /// # Security Warning
    /// Claims returned here are untrusted until [`verify_signature`] passes.
    ///
    /// # Errors
    /// * `Malformed` - Not a three-part token, bad base64/JSON, or no `exp`
    ///
    /// [`verify_signature`]: TokenCodec::verify_signature
    pub fn decode(token: &str) -> Result<TokenClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .map_err(|e| JwtError::Malformed(e.to_string()))
    }

    /// Recompute the signature over `header.payload` and compare it with the
    /// embedded one in constant time.
    ///
    /// Returns false for anything unparseable or signed with another algorithm.
    pub fn verify_signature(&self, token: &str) -> bool {
        match decode_header(token) {
            Ok(header) if header.alg == self.algorithm => {}
            _ => return false,
        }

        let Some((message, signature)) = token.rsplit_once('.') else {
            return false;
        };

        crypto::verify(signature, message.as_bytes(), &self.decoding_key, self.algorithm)
            .unwrap_or(false)
    }

    /// Check whether the claims are expired now.
    pub fn is_expired(claims: &TokenClaims) -> bool {
        claims.is_expired_at(Utc::now().timestamp())
    }

    /// Well-formed, signed with this codec's key and not yet expired.
    pub fn validate(&self, token: &str) -> bool {
        match Self::decode(token) {
            Ok(claims) => self.verify_signature(token) && !Self::is_expired(&claims),
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}
