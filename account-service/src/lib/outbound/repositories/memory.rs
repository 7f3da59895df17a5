use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::account::errors::RepositoryError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::NewAccount;
use crate::account::models::Username;
use crate::account::ports::AccountRepository;

/// Account store kept in process memory.
///
/// The username check and the insert happen under one write lock, which
/// gives registration the same guarantee as a unique constraint.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAccountRepository {
    accounts: Arc<RwLock<HashMap<AccountId, Account>>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored account.
    pub async fn accounts(&self) -> Vec<Account> {
        self.accounts.read().await.values().cloned().collect()
    }

    async fn find_first<F>(&self, predicate: F) -> Option<Account>
    where
        F: Fn(&Account) -> bool,
    {
        self.accounts
            .read()
            .await
            .values()
            .find(|account| predicate(*account))
            .cloned()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Account>, RepositoryError> {
        Ok(self
            .find_first(|account| &account.username == username)
            .await)
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn find_by_access_token(&self, token: &str) -> Result<Option<Account>, RepositoryError> {
        Ok(self
            .find_first(|account| account.access_token.as_deref() == Some(token))
            .await)
    }

    async fn find_by_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<Account>, RepositoryError> {
        Ok(self
            .find_first(|account| account.refresh_token.as_deref() == Some(token))
            .await)
    }

    async fn list(&self) -> Result<Vec<Account>, RepositoryError> {
        let mut accounts = self.accounts().await;
        accounts.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.username.as_str().cmp(b.username.as_str()))
        });
        Ok(accounts)
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        let mut accounts = self.accounts.write().await;

        if accounts
            .values()
            .any(|existing| existing.username == account.username)
        {
            return Err(RepositoryError::ConstraintViolation(
                "accounts_username_key".to_string(),
            ));
        }

        let account = Account {
            id: AccountId::new(),
            username: account.username,
            password_hash: account.password_hash,
            access_token: account.access_token,
            refresh_token: account.refresh_token,
            created_at: Utc::now(),
        };
        accounts.insert(account.id, account.clone());

        Ok(account)
    }

    async fn save(&self, account: &Account) -> Result<(), RepositoryError> {
        let mut accounts = self.accounts.write().await;

        match accounts.get_mut(&account.id) {
            Some(stored) => {
                *stored = account.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(account.id.to_string())),
        }
    }
}
