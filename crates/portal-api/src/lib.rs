//! # portal-api
//!
//! HTTP server for the study portal: submission intake, the reviewer queue,
//! public browse and download, identity and relay pass-through, and an SSE
//! stream of lifecycle events.

pub mod access;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod services;
pub mod state;

pub use access::{ApiKeyAccessControl, Reviewer};
pub use config::{ConfigError, ConfigResult, ServerConfig};
pub use error::ApiError;
pub use router::{build_router, ApiDoc};
pub use state::{build_rate_limiter, AppState, GlobalRateLimiter};
