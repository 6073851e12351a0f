//! Centralized default constants for the study portal.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// SUBMISSION
// =============================================================================

/// Maximum accepted upload size in bytes (10 MiB).
pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// The one document MIME type accepted by the submission form.
pub const ACCEPTED_MIME_TYPE: &str = "application/pdf";

/// Minimum title length in characters.
pub const TITLE_MIN_CHARS: usize = 5;

/// Minimum description length in characters.
pub const DESCRIPTION_MIN_CHARS: usize = 20;

/// Highest semester number a submission may name.
pub const SEMESTER_MAX: i16 = 8;

/// Uploader name stored when the form leaves it blank.
pub const ANONYMOUS_UPLOADER: &str = "Anonymous";

/// Prefix for object-store keys of uploaded notes.
pub const OBJECT_KEY_PREFIX: &str = "notes";

// =============================================================================
// TAGS
// =============================================================================

/// Maximum number of keywords derived per record.
pub const MAX_TAGS: usize = 10;

/// Minimum keyword length in characters.
pub const TAG_MIN_CHARS: usize = 3;

// =============================================================================
// REVIEW
// =============================================================================

/// Rejection reason stored when the reviewer gives none.
pub const DEFAULT_REJECTION_REASON: &str = "No reason provided";

// =============================================================================
// PAGINATION
// =============================================================================

/// Fixed page size for the browse listing ("load more" appends this many).
pub const BROWSE_PAGE_SIZE: usize = 12;

/// Default page size for the reviewer queue.
pub const REVIEW_PAGE_LIMIT: i64 = 50;

/// Upper bound on any single list request.
pub const PAGE_LIMIT_MAX: i64 = 500;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default rate limit: max requests per period.
pub const RATE_LIMIT_REQUESTS: u64 = 100;

/// Default rate limit: period in seconds.
pub const RATE_LIMIT_PERIOD_SECS: u64 = 60;

/// Default event bus broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Default CORS max-age in seconds (1 hour).
pub const CORS_MAX_AGE_SECS: u64 = 3600;

/// Headroom added to the upload limit for multipart framing and form fields.
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Default filesystem root for uploaded objects.
pub const FILE_STORAGE_PATH: &str = "/var/lib/study-portal/files";

/// Public URL prefix under which stored objects are served.
pub const PUBLIC_FILE_BASE_URL: &str = "/api/v1/files";

// =============================================================================
// STARTUP RETRIES
// =============================================================================

/// Attempts made to reach the database at startup.
pub const DB_CONNECT_ATTEMPTS: u32 = 3;

/// Delay between startup connection attempts in milliseconds.
pub const DB_CONNECT_BACKOFF_MS: u64 = 2_000;

// =============================================================================
// EXTERNAL SERVICES
// =============================================================================

/// Identity Toolkit REST base URL.
pub const IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Timeout for identity provider and relay requests in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_limit_is_ten_mebibytes() {
        assert_eq!(MAX_FILE_SIZE_BYTES, 10_485_760);
    }

    #[test]
    fn test_browse_page_size() {
        assert_eq!(BROWSE_PAGE_SIZE, 12);
    }

    #[test]
    fn test_startup_attempts_bounded() {
        assert!(DB_CONNECT_ATTEMPTS >= 1 && DB_CONNECT_ATTEMPTS <= 3);
    }
}
