use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::account::errors::RepositoryError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::NewAccount;
use crate::account::models::Username;
use crate::account::ports::AccountRepository;

const USERNAME_CONSTRAINT: &str = "accounts_username_key";

pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<Account>, RepositoryError> {
        // `column` only ever comes from the fixed names below
        let query = format!(
            r#"
            SELECT id, username, password_hash, access_token, refresh_token, created_at
            FROM accounts
            WHERE {} = $1
            "#,
            column
        );

        let row = sqlx::query_as::<_, AccountRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.map(Account::try_from).transpose()
    }
}

#[derive(Debug, FromRow)]
struct AccountRow {
    id: Uuid,
    username: String,
    password_hash: String,
    access_token: Option<String>,
    refresh_token: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let username = Username::new(row.username)
            .map_err(|e| RepositoryError::Database(format!("Stored username is invalid: {}", e)))?;

        Ok(Account {
            id: AccountId(row.id),
            username,
            password_hash: row.password_hash,
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Account>, RepositoryError> {
        self.find_one("username", username.as_str()).await
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, username, password_hash, access_token, refresh_token, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_access_token(&self, token: &str) -> Result<Option<Account>, RepositoryError> {
        self.find_one("access_token", token).await
    }

    async fn find_by_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<Account>, RepositoryError> {
        self.find_one("refresh_token", token).await
    }

    async fn list(&self) -> Result<Vec<Account>, RepositoryError> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, username, password_hash, access_token, refresh_token, created_at
            FROM accounts
            ORDER BY created_at, username
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.into_iter().map(Account::try_from).collect()
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (username, password_hash, access_token, refresh_token)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password_hash, access_token, refresh_token, created_at
            "#,
        )
        .bind(account.username.as_str())
        .bind(account.password_hash.as_str())
        .bind(account.access_token.as_deref())
        .bind(account.refresh_token.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() && db_err.constraint() == Some(USERNAME_CONSTRAINT)
                {
                    return RepositoryError::ConstraintViolation(USERNAME_CONSTRAINT.to_string());
                }
            }
            RepositoryError::Database(e.to_string())
        })?;

        Account::try_from(row)
    }

    async fn save(&self, account: &Account) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET username = $2, password_hash = $3, access_token = $4, refresh_token = $5
            WHERE id = $1
            "#,
        )
        .bind(account.id.0)
        .bind(account.username.as_str())
        .bind(account.password_hash.as_str())
        .bind(account.access_token.as_deref())
        .bind(account.refresh_token.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return RepositoryError::ConstraintViolation(
                        db_err.constraint().unwrap_or_default().to_string(),
                    );
                }
            }
            RepositoryError::Database(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(account.id.to_string()));
        }

        Ok(())
    }
}
