//! Authentication utilities library
//!
//! Provides the credential and token primitives used by the account service:
//! - Password hashing and verification (Argon2id)
//! - Signed, expiring tokens (HS256) with separate access and refresh keys
//! - Authentication coordination
//!
//! Tokens carry no subject. Services bind a token to an account by storing
//! the token string and looking it up by value.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("my_password", ""));
//! ```
//!
//! ## Tokens
//! ```
//! use auth::TokenCodec;
//! use chrono::{Duration, Utc};
//!
//! let codec = TokenCodec::new(b"secret_key_at_least_32_bytes_long!");
//! let token = codec.issue(Utc::now() + Duration::minutes(15)).unwrap();
//! let claims = TokenCodec::decode(&token).unwrap();
//! assert!(codec.verify_signature(&token));
//! assert!(!TokenCodec::is_expired(&claims));
//! ```
//!
//! ## Token Pairs
//! ```
//! use auth::{Authenticator, TokenLifetimes};
//!
//! let auth = Authenticator::new(
//!     b"access_secret_at_least_32_bytes_long",
//!     b"refresh_secret_at_least_32_bytes_long",
//!     TokenLifetimes::default(),
//! );
//!
//! let tokens = auth.issue_pair().unwrap();
//! assert!(auth.access_tokens().validate(&tokens.access_token));
//! assert!(!auth.access_tokens().validate(&tokens.refresh_token));
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::Authenticator;
pub use authenticator::IssuedTokens;
pub use authenticator::TokenLifetimes;
pub use jwt::JwtError;
pub use jwt::TokenClaims;
pub use jwt::TokenCodec;
pub use password::PasswordError;
pub use password::PasswordHasher;
