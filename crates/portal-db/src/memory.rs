//! In-memory document and object stores.
//!
//! Same contracts as the PostgreSQL and filesystem backends, held in a
//! `tokio::sync::RwLock`. Transitions check and write the status under one
//! write lock, which gives the same "only if still pending" guarantee as the
//! conditional `UPDATE`.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use portal_core::{
    BrowseFilter, CreateNoteRecordRequest, Error, NoteRecord, NoteRecordRepository, NoteStatus,
    ObjectStore, ProgressReporter, Result, ReviewAction, StatusCounts, StoredObject,
};

/// In-memory implementation of NoteRecordRepository.
#[derive(Default)]
pub struct InMemoryNoteRepository {
    records: RwLock<HashMap<Uuid, NoteRecord>>,
    /// When set, `insert` fails as if the pool were exhausted.
    fail_inserts: std::sync::atomic::AtomicBool,
}

impl InMemoryNoteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent inserts fail, to exercise partial-failure handling.
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn matches_filter(record: &NoteRecord, filter: &BrowseFilter) -> bool {
    filter
        .subject
        .as_deref()
        .map_or(true, |s| record.subject.eq_ignore_ascii_case(s.trim()))
        && filter.semester.map_or(true, |s| record.semester == s)
        && filter.category.map_or(true, |c| record.category == c)
}

#[async_trait]
impl NoteRecordRepository for InMemoryNoteRepository {
    async fn insert(&self, req: CreateNoteRecordRequest) -> Result<NoteRecord> {
        if self.fail_inserts.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::PoolTimedOut));
        }
        let record = NoteRecord {
            id: Uuid::now_v7(),
            title: req.title,
            subject: req.subject,
            semester: req.semester,
            category: req.category,
            description: req.description,
            uploader_name: req.uploader_name,
            file_url: req.file_url,
            file_key: req.file_key,
            file_name: req.file_name,
            file_size: req.file_size,
            status: NoteStatus::Pending,
            upload_date: Utc::now(),
            approved_date: None,
            rejected_date: None,
            rejection_reason: None,
            download_count: 0,
            tags: req.tags,
        };
        self.records
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn fetch(&self, id: Uuid) -> Result<NoteRecord> {
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(Error::NoteNotFound(id))
    }

    async fn fetch_by_file_key(&self, file_key: &str) -> Result<NoteRecord> {
        self.records
            .read()
            .await
            .values()
            .find(|r| r.file_key == file_key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("File {}", file_key)))
    }

    async fn list_by_status(
        &self,
        status: NoteStatus,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NoteRecord>> {
        let records = self.records.read().await;
        let mut matching: Vec<NoteRecord> = records
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.upload_date.cmp(&a.upload_date).then(b.id.cmp(&a.id)));
        Ok(matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_approved(&self, filter: &BrowseFilter) -> Result<Vec<NoteRecord>> {
        let records = self.records.read().await;
        let mut approved: Vec<NoteRecord> = records
            .values()
            .filter(|r| r.status == NoteStatus::Approved && matches_filter(r, filter))
            .cloned()
            .collect();
        approved.sort_by(|a, b| {
            b.approved_date
                .cmp(&a.approved_date)
                .then(b.id.cmp(&a.id))
        });
        Ok(approved)
    }

    async fn transition(&self, id: Uuid, action: &ReviewAction) -> Result<NoteRecord> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(Error::NoteNotFound(id))?;
        let next = record.status.apply(id, action)?;
        let now = Utc::now();
        record.status = next;
        match next {
            NoteStatus::Approved => record.approved_date = Some(now),
            NoteStatus::Rejected => {
                record.rejected_date = Some(now);
                record.rejection_reason = action.rejection_reason();
            }
            NoteStatus::Pending => {}
        }
        Ok(record.clone())
    }

    async fn increment_downloads(&self, id: Uuid) -> Result<NoteRecord> {
        let mut records = self.records.write().await;
        match records.get_mut(&id) {
            Some(record) if record.status == NoteStatus::Approved => {
                record.download_count += 1;
                Ok(record.clone())
            }
            _ => Err(Error::NoteNotFound(id)),
        }
    }

    async fn status_counts(&self) -> Result<StatusCounts> {
        let records = self.records.read().await;
        let mut counts = StatusCounts::default();
        for record in records.values() {
            match record.status {
                NoteStatus::Pending => counts.pending += 1,
                NoteStatus::Approved => counts.approved += 1,
                NoteStatus::Rejected => counts.rejected += 1,
            }
        }
        Ok(counts)
    }
}

/// In-memory implementation of ObjectStore.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    fail_writes: std::sync::atomic::AtomicBool,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail with a storage error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put_object(
        &self,
        key: &str,
        data: &[u8],
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<StoredObject> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(Error::Storage("object store unavailable".to_string()));
        }
        let total = data.len() as u64;
        let half = total / 2;
        progress.report_bytes(half, total.max(1));
        self.objects
            .write()
            .await
            .insert(key.to_string(), data.to_vec());
        progress.complete();
        Ok(StoredObject {
            key: key.to_string(),
            url: self.url_for(key),
            size: total,
        })
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Object {}", key)))
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }

    fn url_for(&self, key: &str) -> String {
        format!("memory://{}", key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::NoteCategory;

    fn request(title: &str) -> CreateNoteRecordRequest {
        CreateNoteRecordRequest {
            title: title.to_string(),
            subject: "Mathematics".to_string(),
            semester: 1,
            category: NoteCategory::LectureNotes,
            description: "Limits, continuity and derivatives".to_string(),
            uploader_name: "Anonymous".to_string(),
            file_url: "memory://notes/x.pdf".to_string(),
            file_key: "notes/x.pdf".to_string(),
            file_name: "x.pdf".to_string(),
            file_size: 10,
            tags: vec!["limits".to_string()],
        }
    }

    #[tokio::test]
    async fn test_insert_creates_pending() {
        let repo = InMemoryNoteRepository::new();
        let record = repo.insert(request("Calculus I")).await.unwrap();
        assert_eq!(record.status, NoteStatus::Pending);
        assert_eq!(record.download_count, 0);
        assert!(record.check_review_invariant());
    }

    #[tokio::test]
    async fn test_transition_is_conditional() {
        let repo = InMemoryNoteRepository::new();
        let id = repo.insert(request("Calculus I")).await.unwrap().id;

        repo.transition(id, &ReviewAction::Approve).await.unwrap();
        let err = repo
            .transition(id, &ReviewAction::reject("late"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotPending { status: NoteStatus::Approved, .. }));

        let record = repo.fetch(id).await.unwrap();
        assert!(record.check_review_invariant());
        assert!(record.rejected_date.is_none());
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let repo = InMemoryNoteRepository::new();
        let err = repo
            .transition(Uuid::nil(), &ReviewAction::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoteNotFound(_)));
    }

    #[tokio::test]
    async fn test_downloads_only_for_approved() {
        let repo = InMemoryNoteRepository::new();
        let id = repo.insert(request("Calculus I")).await.unwrap().id;
        assert!(repo.increment_downloads(id).await.is_err());

        repo.transition(id, &ReviewAction::Approve).await.unwrap();
        assert_eq!(repo.increment_downloads(id).await.unwrap().download_count, 1);
        assert_eq!(repo.increment_downloads(id).await.unwrap().download_count, 2);
    }

    #[tokio::test]
    async fn test_concurrent_reviews_have_one_winner() {
        let repo = std::sync::Arc::new(InMemoryNoteRepository::new());
        let id = repo.insert(request("Calculus I")).await.unwrap().id;

        let mut handles = Vec::new();
        for i in 0..8 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                let action = if i % 2 == 0 {
                    ReviewAction::Approve
                } else {
                    ReviewAction::reject("conflict")
                };
                repo.transition(id, &action).await.is_ok()
            }));
        }
        let mut winners = 0;
        for h in handles {
            if h.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert!(repo.fetch(id).await.unwrap().check_review_invariant());
    }

    #[tokio::test]
    async fn test_status_counts() {
        let repo = InMemoryNoteRepository::new();
        let a = repo.insert(request("Calculus I")).await.unwrap().id;
        let b = repo.insert(request("Calculus II")).await.unwrap().id;
        repo.insert(request("Calculus III")).await.unwrap();
        repo.transition(a, &ReviewAction::Approve).await.unwrap();
        repo.transition(b, &ReviewAction::reject("dup")).await.unwrap();

        let counts = repo.status_counts().await.unwrap();
        assert_eq!(
            counts,
            StatusCounts {
                pending: 1,
                approved: 1,
                rejected: 1
            }
        );
    }

    #[tokio::test]
    async fn test_object_store_round_trip() {
        let store = InMemoryObjectStore::new();
        let (progress, rx) = ProgressReporter::channel();
        let stored = store
            .put_object("notes/a.pdf", b"abc", &progress, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(stored.url, "memory://notes/a.pdf");
        assert_eq!(*rx.borrow(), 100);
        assert_eq!(store.get_object("notes/a.pdf").await.unwrap(), b"abc");
        assert_eq!(store.keys().await, vec!["notes/a.pdf".to_string()]);
    }
}
