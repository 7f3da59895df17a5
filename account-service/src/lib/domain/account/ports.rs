use async_trait::async_trait;

use crate::account::errors::AuthError;
use crate::account::errors::RepositoryError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::AccountSession;
use crate::account::models::Credentials;
use crate::account::models::NewAccount;
use crate::account::models::TokenPair;
use crate::account::models::Username;

/// Port for authentication operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new account and mint its first token pair.
    ///
    /// # Arguments
    /// * `credentials` - Must be `UsernamePassword`
    ///
    /// # Errors
    /// * `UnsupportedCredentials` - Any other credential kind
    /// * `InvalidUsername` - Username fails validation
    /// * `AccountTaken` - Username is already registered
    /// * `Repository` - Store operation failed
    async fn register(&self, credentials: Credentials) -> Result<AccountSession, AuthError>;

    /// Authenticate with any credential kind.
    ///
    /// With a username/password or bearer token, re-issues the token pair
    /// when the stored access token is missing or stale. An account
    /// identifier is a read-only lookup and never touches the tokens.
    ///
    /// # Errors
    /// * `IncorrectCredentials` - No matching account or wrong password
    /// * `Repository` - Store operation failed
    async fn authenticate(&self, credentials: Credentials) -> Result<Account, AuthError>;

    /// Password login returning the account and its live token pair.
    ///
    /// # Errors
    /// * `IncorrectCredentials` - Unknown username or wrong password
    /// * `Repository` - Store operation failed
    async fn login(&self, username: &str, password: &str) -> Result<AccountSession, AuthError>;

    /// Exchange a valid refresh token for a new pair.
    ///
    /// # Errors
    /// * `Malformed` - Token cannot be parsed
    /// * `InvalidToken` - No account currently holds this refresh token
    /// * `InvalidSignature` - Not signed with the refresh key
    /// * `Expired` - Refresh token is past its expiry
    /// * `Repository` - Store operation failed
    async fn refresh_session(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Clear both tokens of an account. Logging out twice is a no-op.
    ///
    /// # Errors
    /// * `IncorrectCredentials` - No account with this ID
    /// * `Repository` - Store operation failed
    async fn logout(&self, id: &AccountId) -> Result<(), AuthError>;

    /// Every account, oldest first.
    ///
    /// # Errors
    /// * `Repository` - Store operation failed
    async fn list_accounts(&self) -> Result<Vec<Account>, AuthError>;

    /// Lightweight access token check: well-formed, signed with the access
    /// key, unexpired and still the account's current token. Never errors.
    async fn validate_access_token(&self, token: &str) -> bool;
}

/// Persistence operations for the account aggregate.
///
/// Lookups are by field equality. Implementations must enforce username
/// uniqueness at least as strongly as a unique constraint and report a
/// violation as `ConstraintViolation`.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Retrieve account by username (case-sensitive).
    async fn find_by_username(&self, username: &Username)
        -> Result<Option<Account>, RepositoryError>;

    /// Retrieve account by identifier.
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError>;

    /// Retrieve the account whose current access token equals `token`.
    async fn find_by_access_token(&self, token: &str) -> Result<Option<Account>, RepositoryError>;

    /// Retrieve the account whose current refresh token equals `token`.
    async fn find_by_refresh_token(&self, token: &str)
        -> Result<Option<Account>, RepositoryError>;

    /// Retrieve every account, oldest first.
    async fn list(&self) -> Result<Vec<Account>, RepositoryError>;

    /// Persist a new account, assigning its identifier.
    ///
    /// # Errors
    /// * `ConstraintViolation` - Username is already taken
    /// * `Database` - Storage operation failed
    async fn insert(&self, account: NewAccount) -> Result<Account, RepositoryError>;

    /// Overwrite an existing account. Last writer wins.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `Database` - Storage operation failed
    async fn save(&self, account: &Account) -> Result<(), RepositoryError>;
}
