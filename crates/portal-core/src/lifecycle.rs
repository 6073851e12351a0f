//! Review state machine for note records.
//!
//! ```text
//!            approve
//!   pending ─────────▶ approved   (terminal)
//!      │
//!      │ reject
//!      ▼
//!   rejected                      (terminal)
//! ```
//!
//! Stores apply a transition as a conditional update: the write only happens
//! if the stored status is still `pending` at the time of the write, so two
//! reviewers racing on the same record cannot both succeed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::DEFAULT_REJECTION_REASON;
use crate::error::{Error, Result};
use crate::models::NoteStatus;

/// A reviewer's decision on a pending record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject { reason: Option<String> },
}

impl ReviewAction {
    pub fn reject(reason: impl Into<String>) -> Self {
        Self::Reject {
            reason: Some(reason.into()),
        }
    }

    /// Status the record moves to when this action succeeds.
    pub fn target_status(&self) -> NoteStatus {
        match self {
            Self::Approve => NoteStatus::Approved,
            Self::Reject { .. } => NoteStatus::Rejected,
        }
    }

    /// Reason to store for a rejection, with blank reasons replaced by the
    /// default placeholder. `None` for approvals.
    pub fn rejection_reason(&self) -> Option<String> {
        match self {
            Self::Approve => None,
            Self::Reject { reason } => Some(
                reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .unwrap_or(DEFAULT_REJECTION_REASON)
                    .to_string(),
            ),
        }
    }

    /// Event/log name of the action.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject { .. } => "reject",
        }
    }
}

impl NoteStatus {
    /// Apply a review action to a record in this status.
    ///
    /// Only `pending` records can be reviewed; anything else fails with
    /// [`Error::NotPending`] and leaves the record untouched.
    pub fn apply(self, id: Uuid, action: &ReviewAction) -> Result<NoteStatus> {
        match self {
            NoteStatus::Pending => Ok(action.target_status()),
            status => Err(Error::NotPending { id, status }),
        }
    }

    /// Whether a record may move from `self` to `next`.
    pub fn can_transition_to(self, next: NoteStatus) -> bool {
        matches!(
            (self, next),
            (NoteStatus::Pending, NoteStatus::Approved) | (NoteStatus::Pending, NoteStatus::Rejected)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [NoteStatus; 3] = [NoteStatus::Pending, NoteStatus::Approved, NoteStatus::Rejected];

    #[test]
    fn test_pending_approves() {
        let next = NoteStatus::Pending
            .apply(Uuid::nil(), &ReviewAction::Approve)
            .unwrap();
        assert_eq!(next, NoteStatus::Approved);
    }

    #[test]
    fn test_pending_rejects() {
        let next = NoteStatus::Pending
            .apply(Uuid::nil(), &ReviewAction::reject("duplicate content"))
            .unwrap();
        assert_eq!(next, NoteStatus::Rejected);
    }

    #[test]
    fn test_terminal_states_refuse_every_action() {
        let actions = [ReviewAction::Approve, ReviewAction::Reject { reason: None }];
        for status in [NoteStatus::Approved, NoteStatus::Rejected] {
            for action in &actions {
                let err = status.apply(Uuid::nil(), action).unwrap_err();
                assert!(
                    matches!(err, Error::NotPending { status: s, .. } if s == status),
                    "{} should refuse {}",
                    status,
                    action.name()
                );
            }
        }
    }

    #[test]
    fn test_transition_table() {
        for from in ALL {
            for to in ALL {
                let expected = from == NoteStatus::Pending && to != NoteStatus::Pending;
                assert_eq!(from.can_transition_to(to), expected, "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_rejection_reason_defaults() {
        assert_eq!(
            ReviewAction::Reject { reason: None }.rejection_reason().as_deref(),
            Some("No reason provided")
        );
        assert_eq!(
            ReviewAction::reject("   ").rejection_reason().as_deref(),
            Some("No reason provided")
        );
        assert_eq!(
            ReviewAction::reject("duplicate content")
                .rejection_reason()
                .as_deref(),
            Some("duplicate content")
        );
        assert_eq!(ReviewAction::Approve.rejection_reason(), None);
    }

    #[test]
    fn test_action_serde_shape() {
        let json = serde_json::to_value(ReviewAction::reject("blurry scan")).unwrap();
        assert_eq!(json["action"], "reject");
        assert_eq!(json["reason"], "blurry scan");
    }
}
