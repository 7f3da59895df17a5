use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;

/// Always answers 200; an unusable token is reported as `valid: false`.
pub async fn validate_token(
    State(state): State<AppState>,
    Json(body): Json<ValidateTokenRequestBody>,
) -> Result<ApiSuccess<ValidateTokenResponseData>, ApiError> {
    let valid = state.auth_service.validate_access_token(&body.token).await;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ValidateTokenResponseData { valid },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidateTokenRequestBody {
    token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidateTokenResponseData {
    pub valid: bool,
}
