//! Core traits for the portal's external collaborators.
//!
//! The document store, object store, access-control service and identity
//! provider are all injected behind these traits, so the lifecycle services
//! never reach for ambient globals and tests can swap in in-memory backends.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::auth::{AuthError, AuthUser};
use crate::error::Result;
use crate::lifecycle::ReviewAction;
use crate::models::*;
use crate::progress::ProgressReporter;

// =============================================================================
// DOCUMENT STORE
// =============================================================================

/// Repository for note record metadata.
#[async_trait]
pub trait NoteRecordRepository: Send + Sync {
    /// Insert a new record with status `pending`, a store-assigned upload
    /// date and a zero download count.
    async fn insert(&self, req: CreateNoteRecordRequest) -> Result<NoteRecord>;

    /// Fetch a record by ID regardless of status.
    async fn fetch(&self, id: Uuid) -> Result<NoteRecord>;

    /// Fetch the record that owns the object stored under `file_key`,
    /// regardless of status. Fails with `NotFound` when no record owns it.
    async fn fetch_by_file_key(&self, file_key: &str) -> Result<NoteRecord>;

    /// List records in `status`, newest upload first.
    async fn list_by_status(
        &self,
        status: NoteStatus,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NoteRecord>>;

    /// All approved records matching the structured parts of `filter`
    /// (subject, semester, category), ordered by `approved_date` descending.
    ///
    /// Free-text search is applied by the caller.
    async fn list_approved(&self, filter: &BrowseFilter) -> Result<Vec<NoteRecord>>;

    /// Apply a review action if, and only if, the record is still pending.
    ///
    /// Fails with `NoteNotFound` for unknown IDs and `NotPending` when the
    /// record has already been reviewed.
    async fn transition(&self, id: Uuid, action: &ReviewAction) -> Result<NoteRecord>;

    /// Add one to the download counter of an approved record.
    ///
    /// Fails with `NoteNotFound` when the record is missing or not approved.
    async fn increment_downloads(&self, id: Uuid) -> Result<NoteRecord>;

    /// Number of records per status.
    async fn status_counts(&self) -> Result<StatusCounts>;
}

// =============================================================================
// OBJECT STORE
// =============================================================================

/// Blob storage for uploaded files.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `data` under `key`, publishing progress as it goes.
    ///
    /// Returns `Error::Cancelled` (and leaves no object behind) if `cancel`
    /// fires before the write completes.
    async fn put_object(
        &self,
        key: &str,
        data: &[u8],
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<StoredObject>;

    /// Read the object stored under `key`.
    async fn get_object(&self, key: &str) -> Result<Vec<u8>>;

    /// Remove the object stored under `key`.
    async fn delete_object(&self, key: &str) -> Result<()>;

    /// Check whether an object exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Public URL a client uses to fetch `key`.
    fn url_for(&self, key: &str) -> String;
}

// =============================================================================
// ACCESS CONTROL
// =============================================================================

/// Decides who may review submissions.
///
/// Implementations sit in front of a real authentication/authorization
/// service; the portal never makes this decision from client-supplied flags.
#[async_trait]
pub trait AccessControl: Send + Sync {
    /// Resolve a bearer credential to a reviewer.
    ///
    /// `Unauthorized` when no credential is given or it is unknown,
    /// `Forbidden` when it is valid but lacks the reviewer role.
    async fn authorize_reviewer(&self, credential: Option<&str>) -> Result<ReviewerPrincipal>;
}

// =============================================================================
// IDENTITY PROVIDER
// =============================================================================

/// External email/password identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> std::result::Result<AuthUser, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> std::result::Result<AuthUser, AuthError>;

    async fn send_password_reset(&self, email: &str) -> std::result::Result<(), AuthError>;

    /// End the session identified by `id_token`.
    async fn sign_out(&self, id_token: &str) -> std::result::Result<(), AuthError>;
}
