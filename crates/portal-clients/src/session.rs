//! Observable authentication state.
//!
//! One `watch` channel carries the current user. Sign-in, sign-up and
//! sign-out all publish through it, and `subscribe()` is the only way to
//! observe changes, so there is never more than one source of truth.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use portal_core::{AuthError, AuthUser, IdentityProvider};

/// Current user plus the provider that changes it.
pub struct AuthSession {
    provider: Arc<dyn IdentityProvider>,
    state: watch::Sender<Option<AuthUser>>,
}

impl AuthSession {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(None);
        Self { provider, state }
    }

    /// Receive the current user now and on every change.
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.state.subscribe()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.borrow().is_some()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let user = self.provider.sign_in(email, password).await?;
        self.publish(Some(user.clone()));
        Ok(user)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let user = self.provider.sign_up(email, password).await?;
        self.publish(Some(user.clone()));
        Ok(user)
    }

    /// Password reset does not change who is signed in.
    pub async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.provider.send_password_reset(email).await
    }

    /// Sign out the current user, if any. State is cleared even when the
    /// provider call fails.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let token = self.state.borrow().as_ref().map(|u| u.id_token.clone());
        self.publish(None);
        match token {
            Some(token) => self.provider.sign_out(&token).await,
            None => Ok(()),
        }
    }

    fn publish(&self, user: Option<AuthUser>) {
        debug!(
            subsystem = "identity",
            signed_in = user.is_some(),
            subscribers = self.state.receiver_count(),
            "Auth state changed"
        );
        self.state.send_replace(user);
    }
}
