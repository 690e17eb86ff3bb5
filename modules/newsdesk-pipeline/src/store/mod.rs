// Persistence boundary for the decision pipeline.
//
// PipelineStore covers every durable entity: candidates, topics, sources and
// their reliability log, articles with revisions and editors, corrections,
// and the editorial event outbox.
//
// InMemoryStore backs tests and dry runs; PgStore is the Postgres deployment.

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use newsdesk_common::{
    Article, ArticleRevision, ArticleStatus, CandidateStatus, Correction, CorrectionStatus,
    DimensionScores, EditorialEvent, Editor, EventCandidate, OutboxEvent, ReliabilityEvent,
    Source, SourceKind, SourceReliabilityLogEntry, Topic, VerificationStatus,
};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

// ---------------------------------------------------------------------------
// Commit records
// ---------------------------------------------------------------------------

/// Revision content to append. The store assigns the next revision number.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRevision {
    pub actor: String,
    pub before: Option<String>,
    pub after: Option<String>,
    pub change_reason: String,
    pub created_at: DateTime<Utc>,
}

impl NewRevision {
    pub fn numbered(self, article_id: Uuid, revision_number: u32) -> ArticleRevision {
        ArticleRevision {
            id: Uuid::new_v4(),
            article_id,
            revision_number,
            actor: self.actor,
            before: self.before,
            after: self.after,
            change_reason: self.change_reason,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadDelta {
    pub editor_id: Uuid,
    pub delta: i32,
}

/// One editorial transition. Applied all-or-nothing, and only while the
/// article is still in `expected_status`.
#[derive(Debug, Clone)]
pub struct TransitionCommit {
    pub expected_status: ArticleStatus,
    pub article: Article,
    pub revision: Option<NewRevision>,
    pub workload: Vec<WorkloadDelta>,
    pub events: Vec<EditorialEvent>,
}

/// A correction status change, applied only while the correction is still in
/// `expected_status`.
#[derive(Debug, Clone)]
pub struct CorrectionCommit {
    pub expected_status: CorrectionStatus,
    pub correction: Correction,
    pub revision: Option<NewRevision>,
    pub events: Vec<EditorialEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome<S> {
    Committed { revision: Option<ArticleRevision> },
    /// Status moved underneath the caller; nothing was written. `None` when
    /// the record no longer exists.
    Conflict { actual: Option<S> },
}

// ---------------------------------------------------------------------------
// PipelineStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PipelineStore: Send + Sync {
    // --- Candidates ---

    /// Candidates discovered at or after `since`, oldest first.
    async fn candidates_since(&self, since: DateTime<Utc>) -> Result<Vec<EventCandidate>>;

    /// Titles of candidates approved and discovered at or after `since`, oldest first.
    async fn approved_titles_since(&self, since: DateTime<Utc>) -> Result<Vec<String>>;

    async fn save_candidate(&self, candidate: &EventCandidate) -> Result<()>;

    /// Terminal write of scores, status and reason. Fails when the candidate
    /// is already approved or rejected.
    async fn record_evaluation(
        &self,
        candidate_id: Uuid,
        dimensions: &DimensionScores,
        composite: f64,
        status: CandidateStatus,
        reason: Option<&str>,
    ) -> Result<()>;

    async fn candidates_with_status(&self, status: CandidateStatus) -> Result<Vec<EventCandidate>>;

    // --- Topics ---

    /// Approve the candidate with the topic's scores, insert the topic and
    /// backlink it, all in one unit. When the candidate was already promoted,
    /// returns the existing topic and writes nothing. Fails without writing
    /// when the candidate is missing or already rejected.
    async fn promote_topic(&self, topic: &Topic) -> Result<Topic>;

    async fn topic(&self, id: Uuid) -> Result<Option<Topic>>;

    /// Persist verification status, facts, plan and note.
    async fn record_verification(&self, topic: &Topic) -> Result<()>;

    async fn topics_with_status(&self, status: VerificationStatus) -> Result<Vec<Topic>>;

    // --- Sources ---

    async fn source_by_key(&self, key: &str) -> Result<Option<Source>>;

    /// Create the source at its tier's initial score on first citation, then
    /// count the citation once per citing topic. An existing source keeps its
    /// score and tier, and citing it again from the same topic is a no-op.
    async fn upsert_cited_source(
        &self,
        topic_id: Uuid,
        key: &str,
        name: &str,
        kind: SourceKind,
        at: DateTime<Utc>,
    ) -> Result<Source>;

    /// Adjust the running score by `delta`, clamped to [0, 100], and append
    /// the log entry in the same unit. `None` when the source is unknown.
    async fn log_reliability_event(
        &self,
        key: &str,
        event: ReliabilityEvent,
        delta: f64,
        article_id: Option<Uuid>,
        correction_id: Option<Uuid>,
        at: DateTime<Utc>,
    ) -> Result<Option<SourceReliabilityLogEntry>>;

    async fn reliability_log(&self, source_id: Uuid) -> Result<Vec<SourceReliabilityLogEntry>>;

    // --- Editorial ---

    /// Insert an editor, or update the profile of an existing one. The open
    /// workload is only taken on insert; afterwards transitions own it.
    async fn upsert_editor(&self, editor: &Editor) -> Result<()>;

    async fn editors(&self) -> Result<Vec<Editor>>;

    async fn insert_article(&self, article: &Article) -> Result<()>;

    async fn article(&self, id: Uuid) -> Result<Option<Article>>;

    /// Articles in any of `statuses`, oldest first.
    async fn articles_with_status(&self, statuses: &[ArticleStatus]) -> Result<Vec<Article>>;

    /// Under-review articles whose review deadline is before `now`.
    async fn overdue_articles(&self, now: DateTime<Utc>) -> Result<Vec<Article>>;

    async fn revisions(&self, article_id: Uuid) -> Result<Vec<ArticleRevision>>;

    async fn commit_transition(
        &self,
        commit: TransitionCommit,
    ) -> Result<CommitOutcome<ArticleStatus>>;

    // --- Corrections ---

    async fn insert_correction(&self, correction: &Correction) -> Result<()>;

    async fn correction(&self, id: Uuid) -> Result<Option<Correction>>;

    async fn commit_correction(
        &self,
        commit: CorrectionCommit,
    ) -> Result<CommitOutcome<CorrectionStatus>>;

    // --- Outbox ---

    /// Undispatched events, oldest first.
    async fn pending_events(&self, limit: usize) -> Result<Vec<OutboxEvent>>;

    async fn mark_dispatched(&self, ids: &[Uuid], at: DateTime<Utc>) -> Result<()>;
}

pub(crate) fn outbox_entries(events: Vec<EditorialEvent>, at: DateTime<Utc>) -> Vec<OutboxEvent> {
    events
        .into_iter()
        .map(|event| OutboxEvent {
            id: Uuid::new_v4(),
            event,
            created_at: at,
            dispatched_at: None,
        })
        .collect()
}
