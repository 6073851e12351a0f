//! Public browse, fetch and download of approved notes.
//!
//! The approved set is fetched whole, ordered by approval date, then
//! narrowed by free-text search and sliced into fixed-size pages. "Load
//! more" is simply the next page over the same ordering.

use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use portal_core::{
    defaults, BrowseFilter, BrowsePage, DownloadTicket, Error, EventActor, EventBus, NoteRecord,
    NoteRecordRepository, ObjectStore, Result, ServerEvent,
};

/// Case-insensitive match of every whitespace-separated term against title,
/// subject, description or tags.
pub fn matches_search(record: &NoteRecord, search: &str) -> bool {
    let haystack = format!(
        "{} {} {} {}",
        record.title,
        record.subject,
        record.description,
        record.tags.join(" ")
    )
    .to_lowercase();
    search
        .split_whitespace()
        .all(|term| haystack.contains(&term.to_lowercase()))
}

pub struct BrowseService {
    notes: Arc<dyn NoteRecordRepository>,
    objects: Arc<dyn ObjectStore>,
    events: Arc<EventBus>,
}

impl BrowseService {
    pub fn new(
        notes: Arc<dyn NoteRecordRepository>,
        objects: Arc<dyn ObjectStore>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            notes,
            objects,
            events,
        }
    }

    /// Page `page` (0-based) of approved notes matching `filter`.
    #[instrument(skip(self, filter), fields(subsystem = "browse", op = "list"))]
    pub async fn list(&self, filter: &BrowseFilter, page: usize) -> Result<BrowsePage> {
        let mut notes = self.notes.list_approved(filter).await?;
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            notes.retain(|n| matches_search(n, search));
        }

        let page_size = defaults::BROWSE_PAGE_SIZE;
        let total = notes.len();
        let start = page.saturating_mul(page_size).min(total);
        let end = start.saturating_add(page_size).min(total);
        let page_notes: Vec<NoteRecord> = notes.drain(start..end).collect();

        debug!(total, returned = page_notes.len(), "Browse page built");
        Ok(BrowsePage {
            notes: page_notes,
            total,
            page,
            page_size,
            has_more: end < total,
        })
    }

    /// An approved note. Pending and rejected notes are not found.
    pub async fn get(&self, id: Uuid) -> Result<NoteRecord> {
        let record = self.notes.fetch(id).await?;
        if !record.is_downloadable() {
            return Err(Error::NoteNotFound(id));
        }
        Ok(record)
    }

    /// Count one download and hand back the file location.
    ///
    /// The increment happens before the caller fetches the file; a failed
    /// fetch afterwards still counts.
    #[instrument(skip(self), fields(subsystem = "browse", op = "download", note_id = %id))]
    pub async fn download(&self, id: Uuid) -> Result<DownloadTicket> {
        let record = self.notes.increment_downloads(id).await?;

        self.events.emit(
            ServerEvent::NoteDownloaded {
                note_id: record.id,
                download_count: record.download_count,
            },
            EventActor::system(),
        );
        info!(download_count = record.download_count, "Download counted");

        Ok(DownloadTicket {
            id: record.id,
            file_url: record.file_url,
            file_name: record.file_name,
            download_count: record.download_count,
        })
    }

    /// The record owning `key` and the stored bytes.
    ///
    /// Files of pending and rejected notes are readable by reviewers only.
    /// Everyone else, and anyone asking for an object no record owns, gets
    /// `NotFound`.
    #[instrument(skip(self), fields(subsystem = "browse", op = "read_file"))]
    pub async fn read_file(&self, key: &str, reviewer: bool) -> Result<(NoteRecord, Vec<u8>)> {
        let record = self.notes.fetch_by_file_key(key).await?;
        if !record.is_downloadable() && !reviewer {
            debug!(note_id = %record.id, status = %record.status, "File of unapproved note withheld");
            return Err(Error::NotFound(format!("File {}", key)));
        }
        let data = self.objects.get_object(key).await?;
        Ok((record, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::{
        CancellationToken, CreateNoteRecordRequest, NoteCategory, NoteStatus, ProgressReporter,
        ReviewAction,
    };
    use portal_db::{InMemoryNoteRepository, InMemoryObjectStore};

    fn request(i: usize, subject: &str) -> CreateNoteRecordRequest {
        CreateNoteRecordRequest {
            title: format!("Unit {} revision notes", i),
            subject: subject.to_string(),
            semester: 2,
            category: NoteCategory::LectureNotes,
            description: format!("Worked examples for unit {}", i),
            uploader_name: "Anonymous".to_string(),
            file_url: format!("memory://notes/{}.pdf", i),
            file_key: format!("notes/{}.pdf", i),
            file_name: format!("{}.pdf", i),
            file_size: 10,
            tags: vec![format!("unit{}", i)],
        }
    }

    async fn seeded(approved: usize) -> (BrowseService, Arc<InMemoryNoteRepository>) {
        let notes = Arc::new(InMemoryNoteRepository::new());
        for i in 0..approved {
            let subject = if i % 2 == 0 { "Physics" } else { "Chemistry" };
            let id = notes.insert(request(i, subject)).await.unwrap().id;
            notes.transition(id, &ReviewAction::Approve).await.unwrap();
        }
        let service = BrowseService::new(
            notes.clone(),
            Arc::new(InMemoryObjectStore::new()),
            Arc::new(EventBus::new(16)),
        );
        (service, notes)
    }

    #[tokio::test]
    async fn test_pages_of_twelve() {
        let (service, _) = seeded(30).await;
        let filter = BrowseFilter::default();

        let first = service.list(&filter, 0).await.unwrap();
        assert_eq!(first.notes.len(), 12);
        assert_eq!(first.total, 30);
        assert!(first.has_more);

        let last = service.list(&filter, 2).await.unwrap();
        assert_eq!(last.notes.len(), 6);
        assert!(!last.has_more);

        let beyond = service.list(&filter, 9).await.unwrap();
        assert!(beyond.notes.is_empty());
        assert!(!beyond.has_more);
    }

    #[tokio::test]
    async fn test_newest_approval_first() {
        let (service, _) = seeded(3).await;
        let page = service.list(&BrowseFilter::default(), 0).await.unwrap();
        let dates: Vec<_> = page.notes.iter().map(|n| n.approved_date).collect();
        assert!(dates.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn test_never_lists_unapproved() {
        let (service, notes) = seeded(2).await;
        notes.insert(request(99, "Physics")).await.unwrap();
        let page = service.list(&BrowseFilter::default(), 0).await.unwrap();
        assert_eq!(page.total, 2);
        assert!(page.notes.iter().all(|n| n.status == NoteStatus::Approved));
    }

    #[tokio::test]
    async fn test_subject_filter_and_search() {
        let (service, _) = seeded(6).await;
        let physics = service
            .list(
                &BrowseFilter {
                    subject: Some("physics".to_string()),
                    ..Default::default()
                },
                0,
            )
            .await
            .unwrap();
        assert_eq!(physics.total, 3);

        let searched = service
            .list(
                &BrowseFilter {
                    search: Some("UNIT 4".to_string()),
                    ..Default::default()
                },
                0,
            )
            .await
            .unwrap();
        assert_eq!(searched.total, 1);
        assert_eq!(searched.notes[0].title, "Unit 4 revision notes");
    }

    #[tokio::test]
    async fn test_download_counts_exactly_once_per_call() {
        let (service, _) = seeded(1).await;
        let id = service.list(&BrowseFilter::default(), 0).await.unwrap().notes[0].id;

        assert_eq!(service.download(id).await.unwrap().download_count, 1);
        let ticket = service.download(id).await.unwrap();
        assert_eq!(ticket.download_count, 2);
        assert_eq!(ticket.file_url, "memory://notes/0.pdf");
    }

    #[tokio::test]
    async fn test_unapproved_files_only_for_reviewers() {
        let notes = Arc::new(InMemoryNoteRepository::new());
        let objects = Arc::new(InMemoryObjectStore::new());
        let service = BrowseService::new(notes.clone(), objects.clone(), Arc::new(EventBus::new(16)));

        let record = notes.insert(request(1, "Physics")).await.unwrap();
        objects
            .put_object(
                &record.file_key,
                b"%PDF-1.4",
                &ProgressReporter::detached(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(matches!(
            service.read_file(&record.file_key, false).await,
            Err(Error::NotFound(_))
        ));
        let (owner, data) = service.read_file(&record.file_key, true).await.unwrap();
        assert_eq!(owner.id, record.id);
        assert_eq!(data, b"%PDF-1.4");

        notes
            .transition(record.id, &ReviewAction::Reject { reason: None })
            .await
            .unwrap();
        assert!(service.read_file(&record.file_key, false).await.is_err());

        // Objects with no owning record are never served.
        objects
            .put_object(
                "notes/orphan.pdf",
                b"%PDF-1.4",
                &ProgressReporter::detached(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(matches!(
            service.read_file("notes/orphan.pdf", true).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_approved_file_is_public() {
        let notes = Arc::new(InMemoryNoteRepository::new());
        let objects = Arc::new(InMemoryObjectStore::new());
        let service = BrowseService::new(notes.clone(), objects.clone(), Arc::new(EventBus::new(16)));

        let record = notes.insert(request(2, "Chemistry")).await.unwrap();
        objects
            .put_object(
                &record.file_key,
                b"%PDF-1.7",
                &ProgressReporter::detached(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        notes.transition(record.id, &ReviewAction::Approve).await.unwrap();

        let (_, data) = service.read_file(&record.file_key, false).await.unwrap();
        assert_eq!(data, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_pending_is_not_downloadable() {
        let (service, notes) = seeded(0).await;
        let id = notes.insert(request(1, "Physics")).await.unwrap().id;
        assert!(matches!(service.download(id).await, Err(Error::NoteNotFound(_))));
        assert!(matches!(service.get(id).await, Err(Error::NoteNotFound(_))));
        assert_eq!(notes.fetch(id).await.unwrap().download_count, 0);
    }
}
