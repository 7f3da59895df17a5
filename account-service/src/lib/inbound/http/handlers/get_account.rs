use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::AccountData;
use super::ApiError;
use super::ApiSuccess;
use crate::account::errors::AuthError;
use crate::account::models::AccountId;
use crate::account::models::Credentials;
use crate::inbound::http::middleware::AuthenticatedAccount;
use crate::inbound::http::router::AppState;

pub async fn get_current_account(
    Extension(authenticated): Extension<AuthenticatedAccount>,
) -> Result<ApiSuccess<AccountData>, ApiError> {
    Ok(ApiSuccess::new(
        StatusCode::OK,
        (&authenticated.account).into(),
    ))
}

pub async fn list_accounts(
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<AccountData>>, ApiError> {
    state
        .auth_service
        .list_accounts()
        .await
        .map_err(ApiError::from)
        .map(|accounts| {
            ApiSuccess::new(StatusCode::OK, accounts.iter().map(AccountData::from).collect())
        })
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<ApiSuccess<AccountData>, ApiError> {
    let id = AccountId::from_string(&account_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state
        .auth_service
        .authenticate(Credentials::AccountIdentifier { id })
        .await
        .map_err(|e| match e {
            AuthError::IncorrectCredentials => {
                ApiError::NotFound(format!("Account not found: {}", account_id))
            }
            _ => ApiError::from(e),
        })
        .map(|ref account| ApiSuccess::new(StatusCode::OK, account.into()))
}
