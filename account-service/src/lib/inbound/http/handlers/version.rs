use axum::http::StatusCode;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;

pub const API_VERSION: &str = "1";

pub async fn welcome() -> Result<ApiSuccess<WelcomeResponseData>, ApiError> {
    Ok(ApiSuccess::new(
        StatusCode::OK,
        WelcomeResponseData {
            message: "Welcome to the account service API".to_string(),
        },
    ))
}

pub async fn version() -> Result<ApiSuccess<VersionResponseData>, ApiError> {
    Ok(ApiSuccess::new(
        StatusCode::OK,
        VersionResponseData {
            version: API_VERSION.to_string(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WelcomeResponseData {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionResponseData {
    pub version: String,
}
