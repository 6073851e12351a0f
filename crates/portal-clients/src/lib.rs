//! # portal-clients
//!
//! HTTP clients for the study portal's external collaborators:
//!
//! - [`FirebaseIdentityClient`]: email/password sign-in, sign-up and password
//!   reset against the Identity Toolkit REST API
//! - [`AuthSession`]: the single observable source of the current user
//! - [`FormRelayClient`]: the serverless form relay used as an alternate
//!   submission path

pub mod identity;
pub mod relay;
pub mod session;

pub use identity::{FirebaseIdentityClient, IdentityConfig};
pub use relay::FormRelayClient;
pub use session::AuthSession;
