use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::AccountData;
use super::ApiError;
use super::ApiSuccess;
use super::TokenPairData;
use crate::account::models::AccountSession;
use crate::account::models::Credentials;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequestBody>,
) -> Result<ApiSuccess<SessionResponseData>, ApiError> {
    let credentials = Credentials::UsernamePassword {
        username: body.username,
        password: body.password,
    };

    state
        .auth_service
        .register(credentials)
        .await
        .map_err(ApiError::from)
        .map(|session| ApiSuccess::new(StatusCode::CREATED, session.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequestBody {
    username: String,
    password: String,
}

/// Body returned by registration and login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResponseData {
    pub user: AccountData,
    pub token: TokenPairData,
}

impl From<AccountSession> for SessionResponseData {
    fn from(session: AccountSession) -> Self {
        Self {
            user: (&session.account).into(),
            token: session.tokens.into(),
        }
    }
}
