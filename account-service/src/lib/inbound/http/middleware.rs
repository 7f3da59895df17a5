use axum::extract::Request;
use axum::extract::State;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use super::handlers::ApiError;
use crate::account::models::Account;
use crate::account::models::Credentials;
use crate::inbound::http::router::AppState;

/// Extension type holding the account behind the bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub account: Account,
}

/// Middleware that authenticates the bearer token against the account store
/// and adds the account to request extensions.
///
/// Every failure answers 403 with the same body.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token_from_header(&req)?.to_string();

    let account = state
        .auth_service
        .authenticate(Credentials::BearerToken { value: token })
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Bearer authentication failed");
            not_authorized()
        })?;

    req.extensions_mut().insert(AuthenticatedAccount { account });

    Ok(next.run(req).await)
}

fn extract_token_from_header(req: &Request) -> Result<&str, Response> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| {
            tracing::debug!("Missing Authorization header");
            not_authorized()
        })?;

    let auth_str = auth_header.to_str().map_err(|_| not_authorized())?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(not_authorized()),
    }
}

fn not_authorized() -> Response {
    ApiError::Forbidden("Not authorized.".to_string()).into_response()
}
