pub mod assignment;
pub mod desk;
pub mod machine;

use newsdesk_common::{ArticleStatus, CorrectionStatus};
use thiserror::Error;
use uuid::Uuid;

pub use desk::{EditorialDesk, ReviewQueues, RevisionOutcome};
pub use machine::Action;

/// Guard violations and workflow failures. A returned error never leaves a
/// partial write behind.
#[derive(Error, Debug)]
pub enum EditorialError {
    #[error("Illegal transition: {from} -> {to}")]
    IllegalTransition {
        from: ArticleStatus,
        to: ArticleStatus,
    },

    #[error("Illegal correction transition: {from} -> {to}")]
    IllegalCorrectionTransition {
        from: CorrectionStatus,
        to: CorrectionStatus,
    },

    #[error("Quality gate has not passed for article {0}")]
    QualityGateNotPassed(Uuid),

    #[error("Article {0} is not published")]
    NotPublished(Uuid),

    #[error("Topic {0} is not verified")]
    TopicNotVerified(Uuid),

    #[error("Revision request requires editorial notes")]
    EmptyNotes,

    #[error("Rejection requires a reason")]
    EmptyReason,

    #[error("Action requires an actor identity")]
    MissingActor,

    #[error("No active editor available for category {0}")]
    NoEditorAvailable(String),

    #[error("Concurrent modification of {0}")]
    ConcurrentModification(Uuid),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Correction {0} is published and immutable")]
    ImmutableCorrection(Uuid),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
