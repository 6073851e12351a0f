//! Service layer for business logic.
//!
//! Services are built over the core traits so the same orchestration runs
//! against PostgreSQL and the filesystem in production and against the
//! in-memory stores in tests.

pub mod browse_service;
pub mod review_service;
pub mod submission_service;

pub use browse_service::{matches_search, BrowseService};
pub use review_service::ReviewService;
pub use submission_service::{object_key, SubmissionService};
