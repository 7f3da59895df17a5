use std::fmt;

use auth::IssuedTokens;
use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::account::errors::AccountIdError;
use crate::account::errors::UsernameError;

/// Account aggregate entity.
///
/// Holds at most one live access/refresh pair. Minting a new pair overwrites
/// the previous one, which is what revokes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub username: Username,
    pub password_hash: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Replace the stored pair with freshly minted tokens.
    pub fn set_tokens(&mut self, tokens: &IssuedTokens) {
        self.access_token = Some(tokens.access_token.clone());
        self.refresh_token = Some(tokens.refresh_token.clone());
    }

    /// Drop both tokens. Returns false if there was nothing to clear.
    pub fn clear_tokens(&mut self) -> bool {
        let had_tokens = self.access_token.is_some() || self.refresh_token.is_some();
        self.access_token = None;
        self.refresh_token = None;
        had_tokens
    }
}

/// Account record before the store has assigned an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: Username,
    pub password_hash: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Account unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(pub Uuid);

impl AccountId {
    /// Generate a new random account ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an account ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, AccountIdError> {
        Uuid::parse_str(s)
            .map(AccountId)
            .map_err(|e| AccountIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username value type
///
/// Case-sensitive. Ensures username is 3-32 characters and contains only
/// alphanumeric, underscore, and hyphen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 32;

    /// Create a new valid username.
    ///
    /// # Errors
    /// * `TooShort` - Username shorter than 3 characters
    /// * `TooLong` - Username longer than 32 characters
    /// * `InvalidCharacters` - Anything outside ASCII letters, digits, _ and -
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let username = Self::with_valid_length(username)?;
        let username = Self::with_valid_chars(username)?;
        Ok(Self(username))
    }

    fn with_valid_length(username: String) -> Result<String, UsernameError> {
        let length = username.chars().count();
        if length < Self::MIN_LENGTH {
            Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(username)
        }
    }

    fn with_valid_chars(username: String) -> Result<String, UsernameError> {
        if username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            Ok(username)
        } else {
            Err(UsernameError::InvalidCharacters)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Credentials accepted by the authentication service.
///
/// Closed set: every operation matches it exhaustively, so a new kind of
/// credential cannot be added without deciding how each operation treats it.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Registration and login input
    UsernamePassword { username: String, password: String },
    /// Re-authentication with the current access token
    BearerToken { value: String },
    /// Lookup of an already authenticated account
    AccountIdentifier { id: AccountId },
}

impl Credentials {
    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::UsernamePassword { .. } => "username_password",
            Credentials::BearerToken { .. } => "bearer_token",
            Credentials::AccountIdentifier { .. } => "account_identifier",
        }
    }
}

// Secrets stay out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::UsernamePassword { username, .. } => f
                .debug_struct("UsernamePassword")
                .field("username", username)
                .finish_non_exhaustive(),
            Credentials::BearerToken { .. } => {
                f.debug_struct("BearerToken").finish_non_exhaustive()
            }
            Credentials::AccountIdentifier { id } => f
                .debug_struct("AccountIdentifier")
                .field("id", id)
                .finish(),
        }
    }
}

/// Token pair handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires
    pub expires_in_seconds: i64,
}

impl From<IssuedTokens> for TokenPair {
    fn from(tokens: IssuedTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in_seconds: tokens.expires_in,
        }
    }
}

/// Authenticated account together with its current token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSession {
    pub account: Account,
    pub tokens: TokenPair,
}
