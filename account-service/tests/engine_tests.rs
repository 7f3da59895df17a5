mod common;

use std::collections::HashSet;
use std::sync::Arc;

use account_service::account::errors::AuthError;
use account_service::account::errors::RepositoryError;
use account_service::account::models::Account;
use account_service::account::models::AccountId;
use account_service::account::models::Credentials;
use account_service::account::models::NewAccount;
use account_service::account::models::Username;
use account_service::account::ports::AccountRepository;
use account_service::account::ports::AuthServicePort;
use account_service::account::service::AuthService;
use account_service::repositories::InMemoryAccountRepository;
use async_trait::async_trait;
use auth::TokenCodec;
use chrono::Duration;
use chrono::Utc;
use common::TestEngine;
use tokio::sync::Barrier;

fn username_password(username: &str, password: &str) -> Credentials {
    Credentials::UsernamePassword {
        username: username.to_string(),
        password: password.to_string(),
    }
}

/// Overwrite the stored pair with one issued long enough ago that both
/// tokens have expired
async fn expire_stored_tokens(engine: &TestEngine, username: &str) -> (String, String) {
    let username = Username::new(username.to_string()).unwrap();
    let mut account = engine
        .repository
        .find_by_username(&username)
        .await
        .unwrap()
        .unwrap();

    let stale = engine
        .authenticator
        .issue_pair_at(Utc::now() - Duration::days(60))
        .unwrap();
    account.set_tokens(&stale);
    engine.repository.save(&account).await.unwrap();

    (stale.access_token, stale.refresh_token)
}

#[tokio::test]
async fn test_register_then_login() {
    let engine = TestEngine::new();

    let registered = engine
        .service
        .register(username_password("alice", "correct horse"))
        .await
        .unwrap();
    let session = engine
        .service
        .login("alice", "correct horse")
        .await
        .unwrap();

    assert_eq!(session.account.id, registered.account.id);
    // A live pair is handed back unchanged
    assert_eq!(session.tokens.access_token, registered.tokens.access_token);
    assert!(session.tokens.expires_in_seconds > 0);
    assert_ne!(session.account.password_hash, "correct horse");
}

#[tokio::test]
async fn test_register_twice_keeps_one_record() {
    let engine = TestEngine::new();

    engine
        .service
        .register(username_password("alice", "first"))
        .await
        .unwrap();
    let result = engine
        .service
        .register(username_password("alice", "second"))
        .await;

    assert!(matches!(result, Err(AuthError::AccountTaken(_))));

    let alices = engine
        .repository
        .accounts()
        .await
        .into_iter()
        .filter(|account| account.username.as_str() == "alice")
        .count();
    assert_eq!(alices, 1);

    // The original password still works
    assert!(engine.service.login("alice", "first").await.is_ok());
}

#[tokio::test]
async fn test_concurrent_registration_of_one_username() {
    let engine = TestEngine::new();

    let (first, second) = tokio::join!(
        engine.service.register(username_password("alice", "one")),
        engine.service.register(username_password("alice", "two")),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!([first, second]
        .into_iter()
        .any(|r| matches!(r, Err(AuthError::AccountTaken(_)))));
    assert_eq!(engine.repository.accounts().await.len(), 1);
}

#[tokio::test]
async fn test_login_wrong_password_and_unknown_user_look_alike() {
    let engine = TestEngine::new();
    engine
        .service
        .register(username_password("alice", "secret"))
        .await
        .unwrap();

    let wrong_password = engine.service.login("alice", "guess").await;
    let unknown_user = engine.service.login("mallory", "secret").await;

    assert_eq!(wrong_password, Err(AuthError::IncorrectCredentials));
    assert_eq!(unknown_user, Err(AuthError::IncorrectCredentials));
}

#[tokio::test]
async fn test_login_heals_expired_tokens_but_refresh_does_not() {
    let engine = TestEngine::new();
    engine
        .service
        .register(username_password("alice", "secret"))
        .await
        .unwrap();
    let (stale_access, stale_refresh) = expire_stored_tokens(&engine, "alice").await;

    // Refresh with the expired refresh token still held by the account
    let refreshed = engine.service.refresh_session(&stale_refresh).await;
    assert_eq!(refreshed, Err(AuthError::Expired));

    // Login mints a fresh pair instead
    let session = engine.service.login("alice", "secret").await.unwrap();
    assert_ne!(session.tokens.access_token, stale_access);
    assert!(session.tokens.expires_in_seconds > 0);

    let claims = TokenCodec::decode(&session.tokens.access_token).unwrap();
    assert!(!TokenCodec::is_expired(&claims));
    assert!(
        engine
            .service
            .validate_access_token(&session.tokens.access_token)
            .await
    );
    assert!(!engine.service.validate_access_token(&stale_access).await);
}

#[tokio::test]
async fn test_refresh_rotates_pair() {
    let engine = TestEngine::new();
    let registered = engine
        .service
        .register(username_password("alice", "secret"))
        .await
        .unwrap();

    let rotated = engine
        .service
        .refresh_session(&registered.tokens.refresh_token)
        .await
        .unwrap();

    assert_ne!(rotated.access_token, registered.tokens.access_token);
    assert_ne!(rotated.refresh_token, registered.tokens.refresh_token);
    assert!(engine.service.validate_access_token(&rotated.access_token).await);
    assert!(
        !engine
            .service
            .validate_access_token(&registered.tokens.access_token)
            .await
    );

    // The superseded refresh token is no longer held by any account
    let replay = engine
        .service
        .refresh_session(&registered.tokens.refresh_token)
        .await;
    assert_eq!(replay, Err(AuthError::InvalidToken));
}

#[tokio::test]
async fn test_refresh_garbage_is_malformed() {
    let engine = TestEngine::new();

    let result = engine.service.refresh_session("garbage").await;

    assert!(matches!(result, Err(AuthError::Malformed(_))));
}

#[tokio::test]
async fn test_refresh_with_unknown_well_formed_token() {
    let engine = TestEngine::new();
    engine
        .service
        .register(username_password("alice", "secret"))
        .await
        .unwrap();

    let foreign = engine.authenticator.issue_pair().unwrap();
    let result = engine.service.refresh_session(&foreign.refresh_token).await;

    assert_eq!(result, Err(AuthError::InvalidToken));
}

#[tokio::test]
async fn test_refresh_with_access_token_is_rejected() {
    let engine = TestEngine::new();
    let registered = engine
        .service
        .register(username_password("alice", "secret"))
        .await
        .unwrap();

    // The access token is not stored as anyone's refresh token
    let result = engine
        .service
        .refresh_session(&registered.tokens.access_token)
        .await;

    assert_eq!(result, Err(AuthError::InvalidToken));
}

#[tokio::test]
async fn test_logout_invalidates_access_token() {
    let engine = TestEngine::new();
    let registered = engine
        .service
        .register(username_password("alice", "secret"))
        .await
        .unwrap();
    let access_token = registered.tokens.access_token.clone();

    assert!(engine.service.validate_access_token(&access_token).await);

    engine.service.logout(&registered.account.id).await.unwrap();

    assert!(!engine.service.validate_access_token(&access_token).await);
    let refresh = engine
        .service
        .refresh_session(&registered.tokens.refresh_token)
        .await;
    assert_eq!(refresh, Err(AuthError::InvalidToken));

    // A second logout is a no-op
    assert!(engine.service.logout(&registered.account.id).await.is_ok());
}

#[tokio::test]
async fn test_bearer_authentication_after_logout_fails() {
    let engine = TestEngine::new();
    let registered = engine
        .service
        .register(username_password("alice", "secret"))
        .await
        .unwrap();

    let account = engine
        .service
        .authenticate(Credentials::BearerToken {
            value: registered.tokens.access_token.clone(),
        })
        .await
        .unwrap();
    assert_eq!(account.id, registered.account.id);

    engine.service.logout(&registered.account.id).await.unwrap();

    let result = engine
        .service
        .authenticate(Credentials::BearerToken {
            value: registered.tokens.access_token,
        })
        .await;
    assert_eq!(result, Err(AuthError::IncorrectCredentials));
}

#[tokio::test]
async fn test_login_after_logout_issues_new_pair() {
    let engine = TestEngine::new();
    let registered = engine
        .service
        .register(username_password("alice", "secret"))
        .await
        .unwrap();
    engine.service.logout(&registered.account.id).await.unwrap();

    let session = engine.service.login("alice", "secret").await.unwrap();

    assert_ne!(session.tokens.access_token, registered.tokens.access_token);
    assert!(
        engine
            .service
            .validate_access_token(&session.tokens.access_token)
            .await
    );
}

/// In-memory store that holds every refresh lookup at a barrier, so all
/// refreshes have read the account before any of them saves
struct InterleavingRepository {
    inner: InMemoryAccountRepository,
    refresh_lookups: Barrier,
}

#[async_trait]
impl AccountRepository for InterleavingRepository {
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Account>, RepositoryError> {
        self.inner.find_by_username(username).await
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_access_token(&self, token: &str) -> Result<Option<Account>, RepositoryError> {
        self.inner.find_by_access_token(token).await
    }

    async fn find_by_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<Account>, RepositoryError> {
        let account = self.inner.find_by_refresh_token(token).await;
        self.refresh_lookups.wait().await;
        account
    }

    async fn list(&self) -> Result<Vec<Account>, RepositoryError> {
        self.inner.list().await
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        self.inner.insert(account).await
    }

    async fn save(&self, account: &Account) -> Result<(), RepositoryError> {
        self.inner.save(account).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refresh_leaves_one_valid_pair() {
    const REFRESHES: usize = 3;

    let repository = Arc::new(InterleavingRepository {
        inner: InMemoryAccountRepository::new(),
        refresh_lookups: Barrier::new(REFRESHES),
    });
    let service = Arc::new(AuthService::new(
        Arc::clone(&repository),
        common::authenticator(),
    ));

    let registered = service
        .register(username_password("alice", "secret"))
        .await
        .unwrap();

    let handles: Vec<_> = (0..REFRESHES)
        .map(|_| {
            let service = Arc::clone(&service);
            let refresh_token = registered.tokens.refresh_token.clone();
            tokio::spawn(async move { service.refresh_session(&refresh_token).await })
        })
        .collect();

    let mut pairs = Vec::new();
    for handle in handles {
        pairs.push(handle.await.unwrap().expect("Refresh failed"));
    }

    // Every refresh was in flight at once and each handed out a usable pair
    assert_eq!(pairs.len(), REFRESHES);
    for pair in &pairs {
        assert!(TokenCodec::decode(&pair.access_token).is_ok());
        assert!(TokenCodec::decode(&pair.refresh_token).is_ok());
    }

    let distinct: HashSet<_> = pairs.iter().map(|p| p.access_token.as_str()).collect();
    assert_eq!(distinct.len(), REFRESHES);

    let stored = repository
        .find_by_id(&registered.account.id)
        .await
        .unwrap()
        .unwrap();
    let survivors = pairs
        .iter()
        .filter(|pair| {
            stored.access_token.as_deref() == Some(pair.access_token.as_str())
                && stored.refresh_token.as_deref() == Some(pair.refresh_token.as_str())
        })
        .count();
    assert_eq!(survivors, 1);

    let mut valid = 0;
    for pair in &pairs {
        if service.validate_access_token(&pair.access_token).await {
            valid += 1;
        }
    }
    assert_eq!(valid, 1);
}

#[tokio::test]
async fn test_id_lookup_does_not_log_account_back_in() {
    let engine = TestEngine::new();
    let registered = engine
        .service
        .register(username_password("alice", "secret"))
        .await
        .unwrap();
    engine.service.logout(&registered.account.id).await.unwrap();

    let account = engine
        .service
        .authenticate(Credentials::AccountIdentifier {
            id: registered.account.id,
        })
        .await
        .unwrap();

    assert_eq!(account.access_token, None);
    assert_eq!(account.refresh_token, None);

    let stored = engine
        .repository
        .find_by_id(&registered.account.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.access_token, None);
    assert_eq!(stored.refresh_token, None);
}
