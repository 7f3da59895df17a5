use auth::JwtError;
use auth::PasswordError;
use thiserror::Error;

/// Error for AccountId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccountIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Username too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error(
        "Username contains invalid characters (only alphanumeric, underscore, and hyphen allowed)"
    )]
    InvalidCharacters,
}

/// Error surfaced by account store implementations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// A uniqueness constraint rejected the write
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Top-level error for all authentication operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The operation cannot process this kind of credentials
    #[error("Unsupported credentials")]
    UnsupportedCredentials,

    /// Same shape whatever the cause, so it never reveals whether a username exists
    #[error("Incorrect credentials")]
    IncorrectCredentials,

    #[error("Username already exists: {0}")]
    AccountTaken(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    // Refresh token rejections
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Refresh token does not belong to any account")]
    InvalidToken,

    #[error("Refresh token signature is invalid")]
    InvalidSignature,

    #[error("Refresh token expired")]
    Expired,

    // Infrastructure errors
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token error: {0}")]
    Token(JwtError),

    #[error("Repository error: {0}")]
    Repository(String),
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        AuthError::Repository(err.to_string())
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Malformed(reason) => AuthError::Malformed(reason),
            JwtError::EncodingFailed(_) => AuthError::Token(err),
        }
    }
}
