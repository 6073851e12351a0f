//! Filesystem object store for uploaded notes.
//!
//! Objects are written atomically (temp file + rename) in fixed-size chunks so
//! that progress can be published and an in-flight upload can be cancelled
//! between chunks. A cancelled upload leaves nothing behind.
//!
//! ## Example
//!
//! ```rust,ignore
//! use portal_db::FilesystemBackend;
//!
//! let store = FilesystemBackend::new("/var/lib/study-portal/files", "/api/v1/files");
//! let (progress, _rx) = ProgressReporter::channel();
//! let stored = store
//!     .put_object("notes/1760000000000_ab12cd34_os.pdf", &data, &progress, &CancellationToken::new())
//!     .await?;
//! ```

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

use portal_core::{Error, ObjectStore, ProgressReporter, Result, StoredObject};

/// Bytes written between progress updates and cancellation checks.
pub const WRITE_CHUNK_BYTES: usize = 256 * 1024;

/// Filesystem storage backend.
pub struct FilesystemBackend {
    base_path: PathBuf,
    public_base_url: String,
}

impl FilesystemBackend {
    /// Create a backend rooted at `base_path` whose objects are served under
    /// `public_base_url`.
    pub fn new(base_path: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a key to a path under the base directory, refusing keys that
    /// would escape it.
    fn full_path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(Error::InvalidInput(format!("Invalid object key: {}", key)));
        }
        Ok(self.base_path.join(relative))
    }

    /// Validate that the storage backend can write, read, and delete files.
    ///
    /// Performs a full round-trip at startup to catch permission errors and
    /// missing directories early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join(".health-check");
        let test_file = test_dir.join("test.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await;

        Ok(())
    }

    async fn write_chunks(
        &self,
        temp_path: &Path,
        data: &[u8],
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut file = fs::File::create(temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "file_storage: File::create failed");
            Error::Storage(format!("create failed: {}", e))
        })?;

        let total = data.len() as u64;
        let mut written = 0u64;
        for chunk in data.chunks(WRITE_CHUNK_BYTES) {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                res = file.write_all(chunk) => {
                    res.map_err(|e| Error::Storage(format!("write failed: {}", e)))?;
                }
            }
            written += chunk.len() as u64;
            // 100 is published only once the rename has landed.
            progress.report(((written * 99) / total) as u8);
            if written < total {
                trace!(written, total, "file_storage: chunk written");
            }
        }

        file.sync_all()
            .await
            .map_err(|e| Error::Storage(format!("sync failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FilesystemBackend {
    #[instrument(skip(self, data, progress, cancel), fields(subsystem = "storage", op = "put_object", object_key = %key, file_size = data.len()))]
    async fn put_object(
        &self,
        key: &str,
        data: &[u8],
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<StoredObject> {
        let full_path = self.full_path(key)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "file_storage: create_dir_all failed");
                Error::Storage(format!("create_dir_all failed: {}", e))
            })?;
        }

        let temp_path = full_path.with_extension("upload-tmp");
        if let Err(e) = self.write_chunks(&temp_path, data, progress, cancel).await {
            let _ = fs::remove_file(&temp_path).await;
            if matches!(e, Error::Cancelled) {
                debug!("file_storage: upload cancelled, temp file removed");
            }
            return Err(e);
        }

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "file_storage: rename failed");
            Error::Storage(format!("rename failed: {}", e))
        })?;

        // rw-r--r--, never executable
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        progress.complete();
        debug!(full_path = %full_path.display(), "file_storage: object stored");

        Ok(StoredObject {
            key: key.to_string(),
            url: self.url_for(key),
            size: data.len() as u64,
        })
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(key)?;
        match fs::read(&full_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("Object {}", key)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        let full_path = self.full_path(key)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let full_path = self.full_path(key)?;
        Ok(fs::try_exists(&full_path).await?)
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}
