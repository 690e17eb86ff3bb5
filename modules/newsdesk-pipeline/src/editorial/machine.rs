//! The article lifecycle as a pure transition table. Storage, assignment and
//! events live in the desk; this module only answers "may this happen?".

use newsdesk_common::ArticleStatus;

use super::EditorialError;

/// Everything that can move an article between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Assign,
    Approve,
    RequestRevision,
    /// Revision request past the cap.
    Escalate,
    Reject,
    Redraft,
    Publish,
    SeniorApprove,
    SeniorReject,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::Approve => "approve",
            Self::RequestRevision => "request_revision",
            Self::Escalate => "escalate",
            Self::Reject => "reject",
            Self::Redraft => "redraft",
            Self::Publish => "publish",
            Self::SeniorApprove => "senior_approve",
            Self::SeniorReject => "senior_reject",
        }
    }

    /// The only status the action may start from.
    pub fn source(&self) -> ArticleStatus {
        match self {
            Self::Assign => ArticleStatus::Draft,
            Self::Approve | Self::RequestRevision | Self::Escalate | Self::Reject => {
                ArticleStatus::UnderReview
            }
            Self::Redraft => ArticleStatus::RevisionRequested,
            Self::Publish => ArticleStatus::Approved,
            Self::SeniorApprove | Self::SeniorReject => ArticleStatus::NeedsSeniorReview,
        }
    }

    pub fn target(&self) -> ArticleStatus {
        match self {
            Self::Assign => ArticleStatus::UnderReview,
            Self::Approve | Self::SeniorApprove => ArticleStatus::Approved,
            Self::RequestRevision => ArticleStatus::RevisionRequested,
            Self::Escalate => ArticleStatus::NeedsSeniorReview,
            Self::Reject | Self::SeniorReject => ArticleStatus::Archived,
            Self::Redraft => ArticleStatus::Draft,
            Self::Publish => ArticleStatus::Published,
        }
    }

    /// Human decisions carry an actor identity; automation does not. An
    /// escalation is triggered by the reviewer's over-cap revision request.
    pub fn requires_actor(&self) -> bool {
        !matches!(self, Self::Assign | Self::Redraft)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const ALL_ACTIONS: [Action; 9] = [
    Action::Assign,
    Action::Approve,
    Action::RequestRevision,
    Action::Escalate,
    Action::Reject,
    Action::Redraft,
    Action::Publish,
    Action::SeniorApprove,
    Action::SeniorReject,
];

/// Status after applying `action` to an article in `from`.
pub fn transition(from: ArticleStatus, action: Action) -> Result<ArticleStatus, EditorialError> {
    if action.source() == from {
        Ok(action.target())
    } else {
        Err(EditorialError::IllegalTransition {
            from,
            to: action.target(),
        })
    }
}

/// Whether any action moves `from` directly to `to`.
pub fn is_legal(from: ArticleStatus, to: ArticleStatus) -> bool {
    ALL_ACTIONS
        .iter()
        .any(|a| a.source() == from && a.target() == to)
}

/// Statuses reachable in one step from `from`.
pub fn next_statuses(from: ArticleStatus) -> Vec<ArticleStatus> {
    let mut out: Vec<ArticleStatus> = ALL_ACTIONS
        .iter()
        .filter(|a| a.source() == from)
        .map(|a| a.target())
        .collect();
    out.dedup();
    out
}

/// Every actor-supplied identity must be non-blank.
pub fn require_actor(actor: &str) -> Result<&str, EditorialError> {
    let actor = actor.trim();
    if actor.is_empty() {
        Err(EditorialError::MissingActor)
    } else {
        Ok(actor)
    }
}
