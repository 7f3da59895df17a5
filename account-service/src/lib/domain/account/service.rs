use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use auth::TokenCodec;
use chrono::Utc;

use crate::account::errors::AuthError;
use crate::account::errors::RepositoryError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::AccountSession;
use crate::account::models::Credentials;
use crate::account::models::NewAccount;
use crate::account::models::TokenPair;
use crate::account::models::Username;
use crate::account::ports::AccountRepository;
use crate::account::ports::AuthServicePort;

/// Authentication engine.
///
/// Stateless apart from its collaborators, so one instance serves concurrent
/// requests. Token rotation is read-modify-write against the store with last
/// writer wins: two concurrent refreshes of one account can both hand out a
/// well-formed pair, but only the pair saved last can be looked up afterwards.
pub struct AuthService<AR>
where
    AR: AccountRepository,
{
    repository: Arc<AR>,
    authenticator: Arc<Authenticator>,
}

/// Why a stored pair cannot be handed out as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StaleReason {
    Missing,
    Malformed,
    Tampered,
    Expired,
}

impl StaleReason {
    fn as_str(&self) -> &'static str {
        match self {
            StaleReason::Missing => "missing",
            StaleReason::Malformed => "malformed",
            StaleReason::Tampered => "invalid_signature",
            StaleReason::Expired => "expired",
        }
    }
}

impl<AR> AuthService<AR>
where
    AR: AccountRepository,
{
    /// Create a new authentication service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Account store implementation
    /// * `authenticator` - Password hasher and access/refresh token codecs
    pub fn new(repository: Arc<AR>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            repository,
            authenticator,
        }
    }

    /// The stored pair, if its access token is still well-formed, correctly
    /// signed and unexpired.
    fn current_pair(&self, account: &Account) -> Result<TokenPair, StaleReason> {
        let (Some(access_token), Some(refresh_token)) =
            (&account.access_token, &account.refresh_token)
        else {
            return Err(StaleReason::Missing);
        };

        let claims = TokenCodec::decode(access_token).map_err(|_| StaleReason::Malformed)?;
        if !self
            .authenticator
            .access_tokens()
            .verify_signature(access_token)
        {
            return Err(StaleReason::Tampered);
        }

        let now = Utc::now().timestamp();
        if claims.is_expired_at(now) {
            return Err(StaleReason::Expired);
        }

        Ok(TokenPair {
            access_token: access_token.clone(),
            refresh_token: refresh_token.clone(),
            expires_in_seconds: claims.seconds_remaining(now),
        })
    }

    /// Mint a new pair, overwrite the stored one and persist.
    async fn rotate_tokens(&self, mut account: Account) -> Result<(Account, TokenPair), AuthError> {
        let tokens = self.authenticator.issue_pair()?;
        account.set_tokens(&tokens);

        self.repository.save(&account).await.map_err(|e| {
            tracing::error!(account_id = %account.id, error = %e, "Failed to persist rotated tokens");
            AuthError::from(e)
        })?;

        Ok((account, tokens.into()))
    }

    async fn find_by_password(&self, username: &str, password: &str) -> Result<Account, AuthError> {
        // A username that could never have been registered cannot match
        let Ok(username) = Username::new(username.to_string()) else {
            return Err(AuthError::IncorrectCredentials);
        };

        match self.repository.find_by_username(&username).await? {
            Some(account)
                if self
                    .authenticator
                    .verify_password(password, &account.password_hash) =>
            {
                Ok(account)
            }
            _ => Err(AuthError::IncorrectCredentials),
        }
    }

    async fn find_by_bearer(&self, token: &str) -> Result<Account, AuthError> {
        self.repository
            .find_by_access_token(token)
            .await?
            .ok_or(AuthError::IncorrectCredentials)
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Account, AuthError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(AuthError::IncorrectCredentials)
    }

    /// Hand out the stored pair, or a fresh one when it cannot be used.
    ///
    /// Only reached once a username/password or the current bearer token
    /// has been proven, so this is the one place a logged out account gets
    /// tokens again.
    async fn ensure_tokens(
        &self,
        account: Account,
        is_bearer: bool,
    ) -> Result<(Account, TokenPair), AuthError> {
        match self.current_pair(&account) {
            Ok(tokens) => Ok((account, tokens)),
            // Nothing but the token itself vouches for a bearer request
            Err(reason @ (StaleReason::Tampered | StaleReason::Malformed)) if is_bearer => {
                tracing::warn!(
                    account_id = %account.id,
                    reason = reason.as_str(),
                    "Bearer token rejected"
                );
                Err(AuthError::IncorrectCredentials)
            }
            Err(reason) => {
                tracing::info!(
                    account_id = %account.id,
                    bearer = is_bearer,
                    reason = reason.as_str(),
                    "Re-issuing token pair"
                );
                self.rotate_tokens(account).await
            }
        }
    }
}

fn log_rejection(kind: &'static str, err: AuthError) -> AuthError {
    tracing::debug!(credentials = kind, error = %err, "Authentication rejected");
    err
}

#[async_trait]
impl<AR> AuthServicePort for AuthService<AR>
where
    AR: AccountRepository,
{
    async fn register(&self, credentials: Credentials) -> Result<AccountSession, AuthError> {
        let kind = credentials.kind();
        let (username, password) = match credentials {
            Credentials::UsernamePassword { username, password } => (username, password),
            Credentials::BearerToken { .. } | Credentials::AccountIdentifier { .. } => {
                tracing::warn!(credentials = kind, "Registration with unsupported credentials");
                return Err(AuthError::UnsupportedCredentials);
            }
        };

        let username = Username::new(username)?;

        // Fast path only, the store's unique constraint is what closes the race
        if self.repository.find_by_username(&username).await?.is_some() {
            tracing::info!(username = %username, "Registration rejected, username taken");
            return Err(AuthError::AccountTaken(username.to_string()));
        }

        let password_hash = self.authenticator.hash_password(&password)?;
        let tokens = self.authenticator.issue_pair()?;

        let new_account = NewAccount {
            username: username.clone(),
            password_hash,
            access_token: Some(tokens.access_token.clone()),
            refresh_token: Some(tokens.refresh_token.clone()),
        };

        let account = self
            .repository
            .insert(new_account)
            .await
            .map_err(|e| match e {
                RepositoryError::ConstraintViolation(_) => {
                    tracing::info!(username = %username, "Registration lost username race");
                    AuthError::AccountTaken(username.to_string())
                }
                other => {
                    tracing::error!(username = %username, error = %other, "Failed to insert account");
                    AuthError::from(other)
                }
            })?;

        tracing::info!(
            account_id = %account.id,
            username = %account.username,
            "Account registered"
        );

        Ok(AccountSession {
            account,
            tokens: tokens.into(),
        })
    }

    async fn authenticate(&self, credentials: Credentials) -> Result<Account, AuthError> {
        let kind = credentials.kind();

        match credentials {
            Credentials::UsernamePassword { username, password } => {
                let account = self
                    .find_by_password(&username, &password)
                    .await
                    .map_err(|e| log_rejection(kind, e))?;
                self.ensure_tokens(account, false)
                    .await
                    .map(|(account, _)| account)
            }
            Credentials::BearerToken { value } => {
                let account = self
                    .find_by_bearer(&value)
                    .await
                    .map_err(|e| log_rejection(kind, e))?;
                self.ensure_tokens(account, true)
                    .await
                    .map(|(account, _)| account)
            }
            // Plain lookup, the stored tokens are left as they are
            Credentials::AccountIdentifier { id } => {
                self.find_by_id(&id).await.map_err(|e| log_rejection(kind, e))
            }
        }
    }

    async fn login(&self, username: &str, password: &str) -> Result<AccountSession, AuthError> {
        let account = self
            .find_by_password(username, password)
            .await
            .map_err(|e| log_rejection("username_password", e))?;

        let (account, tokens) = self.ensure_tokens(account, false).await?;
        tracing::info!(account_id = %account.id, "Login succeeded");

        Ok(AccountSession { account, tokens })
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, AuthError> {
        Ok(self.repository.list().await?)
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = TokenCodec::decode(refresh_token).map_err(|e| {
            tracing::warn!(error = %e, "Refresh rejected, malformed token");
            AuthError::from(e)
        })?;

        let Some(account) = self.repository.find_by_refresh_token(refresh_token).await? else {
            tracing::warn!("Refresh rejected, token not held by any account");
            return Err(AuthError::InvalidToken);
        };

        if !self
            .authenticator
            .refresh_tokens()
            .verify_signature(refresh_token)
        {
            tracing::warn!(account_id = %account.id, "Refresh rejected, invalid signature");
            return Err(AuthError::InvalidSignature);
        }

        if TokenCodec::is_expired(&claims) {
            tracing::warn!(account_id = %account.id, exp = claims.exp, "Refresh rejected, token expired");
            return Err(AuthError::Expired);
        }

        let (account, tokens) = self.rotate_tokens(account).await?;
        tracing::info!(account_id = %account.id, "Session refreshed");

        Ok(tokens)
    }

    async fn logout(&self, id: &AccountId) -> Result<(), AuthError> {
        let mut account = self.find_by_id(id).await?;

        if !account.clear_tokens() {
            tracing::debug!(account_id = %id, "Logout of logged out account");
            return Ok(());
        }

        self.repository.save(&account).await?;
        tracing::info!(account_id = %id, "Logged out");

        Ok(())
    }

    async fn validate_access_token(&self, token: &str) -> bool {
        if !self.authenticator.access_tokens().validate(token) {
            return false;
        }

        match self.repository.find_by_access_token(token).await {
            Ok(account) => account.is_some(),
            Err(e) => {
                tracing::error!(error = %e, "Access token lookup failed");
                false
            }
        }
    }
}
