//! Reviewer actions: approve, reject, and the review queue.

use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use portal_core::{
    defaults, EventActor, EventBus, NoteRecord, NoteRecordRepository, NoteStatus, Result,
    ReviewAction, ReviewerPrincipal, ServerEvent, StatusCounts,
};

pub struct ReviewService {
    notes: Arc<dyn NoteRecordRepository>,
    events: Arc<EventBus>,
}

impl ReviewService {
    pub fn new(notes: Arc<dyn NoteRecordRepository>, events: Arc<EventBus>) -> Self {
        Self { notes, events }
    }

    pub async fn approve(&self, principal: &ReviewerPrincipal, id: Uuid) -> Result<NoteRecord> {
        self.review(principal, id, ReviewAction::Approve).await
    }

    /// Reject a pending note. A blank or missing reason is stored as
    /// "No reason provided".
    pub async fn reject(
        &self,
        principal: &ReviewerPrincipal,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<NoteRecord> {
        self.review(principal, id, ReviewAction::Reject { reason })
            .await
    }

    #[instrument(skip(self, principal, action), fields(subsystem = "review", op = action.name(), note_id = %id, reviewer = %principal.id))]
    async fn review(
        &self,
        principal: &ReviewerPrincipal,
        id: Uuid,
        action: ReviewAction,
    ) -> Result<NoteRecord> {
        let record = self.notes.transition(id, &action).await?;

        let event = match record.status {
            NoteStatus::Rejected => ServerEvent::NoteRejected {
                note_id: record.id,
                title: record.title.clone(),
                reason: record.rejection_reason.clone().unwrap_or_default(),
            },
            _ => ServerEvent::NoteApproved {
                note_id: record.id,
                title: record.title.clone(),
            },
        };
        self.events.emit(
            event,
            EventActor::reviewer(principal.id.clone(), principal.display_name.clone()),
        );

        info!(status = %record.status, "Note reviewed");
        Ok(record)
    }

    /// One page of records in `status`, newest upload first.
    pub async fn queue(&self, status: NoteStatus, page: usize) -> Result<Vec<NoteRecord>> {
        let limit = defaults::REVIEW_PAGE_LIMIT;
        let offset = i64::try_from(page)
            .unwrap_or(i64::MAX)
            .saturating_mul(limit);
        self.notes.list_by_status(status, limit, offset).await
    }

    pub async fn counts(&self) -> Result<StatusCounts> {
        self.notes.status_counts().await
    }
}
