//! Identity pass-through: sign-in, sign-up, password reset, sign-out.
//!
//! Provider failures come back as `{"error": <user message>, "retryable": ..}`
//! with a status chosen by the failure kind.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use portal_core::{AuthUser, Credentials, Error, IdentityProvider};

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct PasswordResetBody {
    pub email: String,
}

fn provider(state: &AppState) -> Result<&Arc<dyn IdentityProvider>, ApiError> {
    state.identity.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Sign-in is not configured on this server".to_string())
    })
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<AuthUser>, ApiError> {
    let user = provider(&state)?
        .sign_in(credentials.email.trim(), &credentials.password)
        .await
        .map_err(Error::from)?;
    Ok(Json(user))
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, Json<AuthUser>), ApiError> {
    let user = provider(&state)?
        .sign_up(credentials.email.trim(), &credentials.password)
        .await
        .map_err(Error::from)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn password_reset(
    State(state): State<AppState>,
    Json(body): Json<PasswordResetBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    provider(&state)?
        .send_password_reset(body.email.trim())
        .await
        .map_err(Error::from)?;
    Ok(Json(serde_json::json!({ "status": "sent" })))
}

pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;
    provider(&state)?
        .sign_out(token.trim())
        .await
        .map_err(Error::from)?;
    Ok(StatusCode::NO_CONTENT)
}
