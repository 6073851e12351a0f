//! # portal-core
//!
//! Core types, traits, and the notes review lifecycle for the study portal.
//!
//! This crate provides the domain model (`NoteRecord` and friends), local
//! submission validation, keyword derivation, the review state machine and
//! the trait seams behind which the document store, object store, access
//! control and identity provider are injected.

pub mod auth;
pub mod defaults;
pub mod error;
pub mod events;
pub mod file_safety;
pub mod keywords;
pub mod lifecycle;
pub mod models;
pub mod progress;
pub mod relay;
pub mod submission;
pub mod traits;

// Re-export commonly used types at crate root
pub use auth::{AuthError, AuthErrorKind, AuthUser, Credentials};
pub use error::{Error, Result};
pub use events::{EventActor, EventBus, EventEnvelope, ServerEvent};
pub use file_safety::{content_matches_declared, sanitize_filename, sniff_content_type};
pub use keywords::extract_keywords;
pub use lifecycle::ReviewAction;
pub use models::*;
pub use progress::ProgressReporter;
pub use relay::{RelayFile, RelayRequest, RelayResponse};
pub use submission::{validate_submission, SubmissionLimits, ValidSubmission, ValidationError};
pub use tokio_util::sync::CancellationToken;
pub use traits::*;
