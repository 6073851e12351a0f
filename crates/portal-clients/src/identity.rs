//! Identity Toolkit REST client.
//!
//! Email/password accounts only. Every provider failure is classified into an
//! [`AuthErrorKind`] so callers can show a distinct message per cause.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use portal_core::{defaults, AuthError, AuthErrorKind, AuthUser, IdentityProvider, Result};

/// Connection settings for the identity provider.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Base URL up to and including the API version, e.g.
    /// `https://identitytoolkit.googleapis.com/v1`.
    pub base_url: String,
    /// Web API key, sent as the `key` query parameter.
    pub api_key: String,
    pub timeout_seconds: u64,
}

impl IdentityConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: defaults::IDENTITY_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout_seconds: defaults::HTTP_TIMEOUT_SECS,
        }
    }

    /// Read `IDENTITY_API_KEY` and `IDENTITY_BASE_URL`.
    /// Returns None if no API key is configured.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("IDENTITY_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let mut config = Self::new(api_key.trim());
        if let Ok(base_url) = std::env::var("IDENTITY_BASE_URL") {
            config.base_url = base_url;
        }
        Some(config)
    }
}

/// Identity provider backed by the Identity Toolkit REST API.
pub struct FirebaseIdentityClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OobCodeRequest<'a> {
    request_type: &'static str,
    email: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseIdentityClient {
    pub fn new(config: IdentityConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        info!(
            subsystem = "identity",
            base_url = %config.base_url,
            "Initializing identity client"
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    /// Create from environment variables.
    /// Returns Ok(None) if IDENTITY_API_KEY is not set.
    pub fn from_env() -> Result<Option<Self>> {
        IdentityConfig::from_env().map(Self::new).transpose()
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/accounts:{}", self.base_url, method)
    }

    /// POST `body` to `accounts:{method}` and decode a success reply, turning
    /// transport failures and provider error envelopes into [`AuthError`].
    async fn call<B, R>(&self, method: &str, body: &B) -> std::result::Result<R, AuthError>
    where
        B: Serialize + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let start = Instant::now();
        let response = self
            .client
            .post(self.endpoint(method))
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(subsystem = "identity", op = method, error = %e, "Identity request failed");
                AuthError::new(AuthErrorKind::Network, e.to_string())
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::new(AuthErrorKind::Network, e.to_string()))?;

        debug!(
            subsystem = "identity",
            op = method,
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Identity request complete"
        );

        if !status.is_success() {
            let error = match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(envelope) => AuthError::from_provider_code(&envelope.error.message),
                Err(_) if status.as_u16() == 429 => {
                    AuthError::new(AuthErrorKind::TooManyRequests, status.to_string())
                }
                Err(_) => AuthError::new(AuthErrorKind::Unknown, format!("{}: {}", status, text)),
            };
            debug!(subsystem = "identity", op = method, kind = %error.kind, "Provider refused request");
            return Err(error);
        }

        serde_json::from_str(&text).map_err(|e| {
            AuthError::new(
                AuthErrorKind::Unknown,
                format!("Failed to parse response: {}", e),
            )
        })
    }

    async fn password_call(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> std::result::Result<AuthUser, AuthError> {
        let account: AccountResponse = self
            .call(
                method,
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        Ok(AuthUser {
            uid: account.local_id,
            email: account.email.unwrap_or_else(|| email.to_string()),
            id_token: account.id_token,
            refresh_token: account.refresh_token,
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityClient {
    #[instrument(skip(self, password), fields(subsystem = "identity", op = "sign_in"))]
    async fn sign_in(&self, email: &str, password: &str) -> std::result::Result<AuthUser, AuthError> {
        let user = self
            .password_call("signInWithPassword", email, password)
            .await?;
        info!(uid = %user.uid, "User signed in");
        Ok(user)
    }

    #[instrument(skip(self, password), fields(subsystem = "identity", op = "sign_up"))]
    async fn sign_up(&self, email: &str, password: &str) -> std::result::Result<AuthUser, AuthError> {
        let user = self.password_call("signUp", email, password).await?;
        info!(uid = %user.uid, "Account created");
        Ok(user)
    }

    #[instrument(skip(self), fields(subsystem = "identity", op = "password_reset"))]
    async fn send_password_reset(&self, email: &str) -> std::result::Result<(), AuthError> {
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                &OobCodeRequest {
                    request_type: "PASSWORD_RESET",
                    email,
                },
            )
            .await?;
        info!("Password reset email requested");
        Ok(())
    }

    /// ID tokens are stateless and expire on their own; there is no provider
    /// call to make. Callers drop their copy of the token.
    async fn sign_out(&self, id_token: &str) -> std::result::Result<(), AuthError> {
        debug!(
            subsystem = "identity",
            op = "sign_out",
            token_len = id_token.len(),
            "Session ended"
        );
        Ok(())
    }
}
