// Editorial desk: the article state machine bound to storage.
//
// Every transition loads the article, checks the guard, and hands the store a
// TransitionCommit that only applies while the article is still in the status
// it was loaded in. Assignment additionally runs under a desk-wide lock so the
// workload snapshot used to pick an editor stays consistent with the counter
// increment written by the commit.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use newsdesk_common::{
    Article, ArticleRevision, ArticleStatus, CandidateStatus, EditorialEvent, PipelineConfig,
    SlaPolicy, VerificationStatus,
};

use super::assignment::{review_deadline, select_editor, workload_changes};
use super::machine::{require_actor, transition, Action};
use super::EditorialError;
use crate::store::{CommitOutcome, NewRevision, PipelineStore, TransitionCommit};

/// Actor recorded on revisions written by automation.
pub const AUTOMATION_ACTOR: &str = "newsdesk";

#[derive(Debug, Clone, PartialEq)]
pub enum RevisionOutcome {
    Requested {
        article: Article,
        revision: Option<ArticleRevision>,
    },
    /// The cap was already reached. The article moved to senior review and
    /// no revision was recorded.
    MaxRevisionsReached { article: Article },
}

impl RevisionOutcome {
    pub fn article(&self) -> &Article {
        match self {
            Self::Requested { article, .. } | Self::MaxRevisionsReached { article } => article,
        }
    }
}

/// Everything waiting on a human.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewQueues {
    pub drafts: Vec<Uuid>,
    pub under_review: Vec<Uuid>,
    pub revision_requested: Vec<Uuid>,
    pub overdue: Vec<Uuid>,
    pub needs_senior_review: Vec<Uuid>,
    pub held_candidates: Vec<Uuid>,
    /// Saved but never evaluated; `resume` finishes them.
    pub stranded_candidates: Vec<Uuid>,
    pub pending_topics: Vec<Uuid>,
    pub insufficient_topics: Vec<Uuid>,
    pub failed_topics: Vec<Uuid>,
}

impl std::fmt::Display for ReviewQueues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Review Queues ===")?;
        writeln!(f, "Drafts awaiting assignment: {}", self.drafts.len())?;
        writeln!(f, "Under review:               {}", self.under_review.len())?;
        writeln!(f, "  overdue:                  {}", self.overdue.len())?;
        writeln!(f, "Revision requested:         {}", self.revision_requested.len())?;
        writeln!(f, "Needs senior review:        {}", self.needs_senior_review.len())?;
        writeln!(f, "Held candidates:            {}", self.held_candidates.len())?;
        writeln!(f, "Stranded candidates:        {}", self.stranded_candidates.len())?;
        writeln!(f, "Pending verification:       {}", self.pending_topics.len())?;
        writeln!(f, "Insufficient sources:       {}", self.insufficient_topics.len())?;
        write!(f, "Failed verification:        {}", self.failed_topics.len())
    }
}

pub struct EditorialDesk {
    store: Arc<dyn PipelineStore>,
    sla: SlaPolicy,
    max_revisions: u32,
    assignment: Mutex<()>,
}

impl EditorialDesk {
    pub fn new(store: Arc<dyn PipelineStore>, config: &PipelineConfig) -> Self {
        Self {
            store,
            sla: config.sla.clone(),
            max_revisions: config.max_revisions,
            assignment: Mutex::new(()),
        }
    }

    /// Create a draft for a verified topic. The quality-gate flag comes from
    /// the drafting side.
    pub async fn submit_draft(
        &self,
        topic_id: Uuid,
        body: &str,
        quality_gate_passed: bool,
        now: DateTime<Utc>,
    ) -> Result<Article, EditorialError> {
        let topic = self
            .store
            .topic(topic_id)
            .await?
            .ok_or_else(|| EditorialError::NotFound(format!("topic {topic_id}")))?;
        if topic.verification_status != VerificationStatus::Verified {
            return Err(EditorialError::TopicNotVerified(topic_id));
        }

        let article = Article {
            id: Uuid::new_v4(),
            topic_id,
            title: topic.title,
            category: topic.category,
            body: body.to_string(),
            status: ArticleStatus::Draft,
            assigned_editor: None,
            review_deadline: None,
            editorial_notes: String::new(),
            revision_count: 0,
            quality_gate_passed,
            approved_by: None,
            archived_reason: None,
            published_at: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_article(&article).await?;
        info!(article_id = %article.id, topic_id = %topic_id, "Draft submitted");
        Ok(article)
    }

    /// draft -> under_review with the least-loaded matching editor.
    pub async fn assign(
        &self,
        article_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Article, EditorialError> {
        let _guard = self.assignment.lock().await;

        let article = self.load(article_id).await?;
        let to = transition(article.status, Action::Assign)?;
        if !article.quality_gate_passed {
            return Err(EditorialError::QualityGateNotPassed(article_id));
        }

        let editors = self.store.editors().await?;
        let editor = select_editor(&editors, &article.category, article.assigned_editor)
            .ok_or_else(|| EditorialError::NoEditorAvailable(article.category.clone()))?;
        let deadline = review_deadline(&self.sla, &article.category, now);

        let after = Article {
            status: to,
            assigned_editor: Some(editor.id),
            review_deadline: Some(deadline),
            updated_at: now,
            ..article.clone()
        };
        let revision = NewRevision {
            actor: AUTOMATION_ACTOR.to_string(),
            before: None,
            after: Some(after.body.clone()),
            change_reason: format!("Assigned to {} for review", editor.name),
            created_at: now,
        };
        let events = vec![EditorialEvent::AssignedForReview {
            article_id,
            editor_id: editor.id,
            review_deadline: deadline,
        }];

        let (article, _) = self.commit(&article, after, Some(revision), events).await?;
        Ok(article)
    }

    pub async fn approve(
        &self,
        article_id: Uuid,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Article, EditorialError> {
        let actor = require_actor(actor)?;
        let article = self.load(article_id).await?;
        let to = transition(article.status, Action::Approve)?;
        let after = Article {
            status: to,
            approved_by: Some(actor.to_string()),
            updated_at: now,
            ..article.clone()
        };
        let events = vec![EditorialEvent::Approved {
            article_id,
            approved_by: actor.to_string(),
        }];
        let (article, _) = self.commit(&article, after, None, events).await?;
        Ok(article)
    }

    /// under_review -> revision_requested, or -> needs_senior_review once the
    /// article has used all its revision cycles.
    pub async fn request_revision(
        &self,
        article_id: Uuid,
        actor: &str,
        notes: &str,
        now: DateTime<Utc>,
    ) -> Result<RevisionOutcome, EditorialError> {
        let actor = require_actor(actor)?;
        let notes = notes.trim();
        if notes.is_empty() {
            return Err(EditorialError::EmptyNotes);
        }

        let article = self.load(article_id).await?;
        let to = transition(article.status, Action::RequestRevision)?;

        if article.revision_count >= self.max_revisions {
            let to = transition(article.status, Action::Escalate)?;
            let after = Article {
                status: to,
                editorial_notes: append_escalation(&article.editorial_notes, actor, notes),
                updated_at: now,
                ..article.clone()
            };
            let events = vec![EditorialEvent::EscalatedToSeniorReview {
                article_id,
                revision_count: article.revision_count,
                requested_by: actor.to_string(),
                notes: notes.to_string(),
            }];
            let (article, _) = self.commit(&article, after, None, events).await?;
            warn!(
                article_id = %article_id,
                revision_count = article.revision_count,
                actor,
                "Max revisions reached, escalated to senior review"
            );
            return Ok(RevisionOutcome::MaxRevisionsReached { article });
        }

        let cycle = article.revision_count + 1;
        let after = Article {
            status: to,
            revision_count: cycle,
            editorial_notes: append_notes(&article.editorial_notes, cycle, actor, notes),
            updated_at: now,
            ..article.clone()
        };
        let revision = NewRevision {
            actor: actor.to_string(),
            before: Some(article.body.clone()),
            after: None,
            change_reason: notes.to_string(),
            created_at: now,
        };
        let events = vec![EditorialEvent::RevisionRequested {
            article_id,
            editor_id: article.assigned_editor,
            notes: notes.to_string(),
        }];
        let (article, revision) = self.commit(&article, after, Some(revision), events).await?;
        Ok(RevisionOutcome::Requested { article, revision })
    }

    pub async fn reject(
        &self,
        article_id: Uuid,
        actor: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Article, EditorialError> {
        self.archive(article_id, actor, reason, Action::Reject, now)
            .await
    }

    /// The drafting side produced a new body for a revision-requested article.
    /// Moves it back to draft and, when the new draft passed its quality gate,
    /// re-assigns it to the same editor if that editor is still active.
    pub async fn observe_redraft(
        &self,
        article_id: Uuid,
        body: &str,
        quality_gate_passed: bool,
        now: DateTime<Utc>,
    ) -> Result<Article, EditorialError> {
        let article = self.load(article_id).await?;
        let to = transition(article.status, Action::Redraft)?;
        let after = Article {
            status: to,
            body: body.to_string(),
            quality_gate_passed,
            review_deadline: None,
            updated_at: now,
            ..article.clone()
        };
        let (draft, _) = self.commit(&article, after, None, Vec::new()).await?;

        if !draft.quality_gate_passed {
            info!(article_id = %article_id, "Redraft waiting on quality gate");
            return Ok(draft);
        }
        self.assign(article_id, now).await
    }

    pub async fn publish(
        &self,
        article_id: Uuid,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Article, EditorialError> {
        let actor = require_actor(actor)?;
        let article = self.load(article_id).await?;
        let to = transition(article.status, Action::Publish)?;
        let after = Article {
            status: to,
            published_at: Some(now),
            updated_at: now,
            ..article.clone()
        };
        let events = vec![EditorialEvent::Published {
            article_id,
            published_by: actor.to_string(),
        }];
        let (article, _) = self.commit(&article, after, None, events).await?;
        info!(article_id = %article_id, actor, "Article published");
        Ok(article)
    }

    pub async fn senior_approve(
        &self,
        article_id: Uuid,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Article, EditorialError> {
        let actor = require_actor(actor)?;
        let article = self.load(article_id).await?;
        let to = transition(article.status, Action::SeniorApprove)?;
        let after = Article {
            status: to,
            approved_by: Some(actor.to_string()),
            updated_at: now,
            ..article.clone()
        };
        let events = vec![EditorialEvent::Approved {
            article_id,
            approved_by: actor.to_string(),
        }];
        let (article, _) = self.commit(&article, after, None, events).await?;
        Ok(article)
    }

    pub async fn senior_reject(
        &self,
        article_id: Uuid,
        actor: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Article, EditorialError> {
        self.archive(article_id, actor, reason, Action::SeniorReject, now)
            .await
    }

    /// Under-review articles past their deadline. Read-only: overdue is a
    /// signal for people, not a status.
    pub async fn overdue(&self, now: DateTime<Utc>) -> Result<Vec<Article>, EditorialError> {
        let overdue = self.store.overdue_articles(now).await?;
        if !overdue.is_empty() {
            warn!(count = overdue.len(), "Articles past review deadline");
        }
        Ok(overdue)
    }

    pub async fn queues(&self, now: DateTime<Utc>) -> Result<ReviewQueues, EditorialError> {
        let ids_in = |articles: &[Article], status: ArticleStatus| -> Vec<Uuid> {
            articles
                .iter()
                .filter(|a| a.status == status)
                .map(|a| a.id)
                .collect()
        };

        let open = self
            .store
            .articles_with_status(&[
                ArticleStatus::Draft,
                ArticleStatus::UnderReview,
                ArticleStatus::RevisionRequested,
                ArticleStatus::NeedsSeniorReview,
            ])
            .await?;
        let overdue = self.store.overdue_articles(now).await?;
        let held = self
            .store
            .candidates_with_status(CandidateStatus::Hold)
            .await?;
        let stranded = self
            .store
            .candidates_with_status(CandidateStatus::Discovered)
            .await?;
        let pending = self
            .store
            .topics_with_status(VerificationStatus::Pending)
            .await?;
        let insufficient = self
            .store
            .topics_with_status(VerificationStatus::InsufficientSources)
            .await?;
        let failed = self
            .store
            .topics_with_status(VerificationStatus::Failed)
            .await?;

        Ok(ReviewQueues {
            drafts: ids_in(&open, ArticleStatus::Draft),
            under_review: ids_in(&open, ArticleStatus::UnderReview),
            revision_requested: ids_in(&open, ArticleStatus::RevisionRequested),
            overdue: overdue.iter().map(|a| a.id).collect(),
            needs_senior_review: ids_in(&open, ArticleStatus::NeedsSeniorReview),
            held_candidates: held.iter().map(|c| c.id).collect(),
            stranded_candidates: stranded.iter().map(|c| c.id).collect(),
            pending_topics: pending.iter().map(|t| t.id).collect(),
            insufficient_topics: insufficient.iter().map(|t| t.id).collect(),
            failed_topics: failed.iter().map(|t| t.id).collect(),
        })
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn load(&self, article_id: Uuid) -> Result<Article, EditorialError> {
        self.store
            .article(article_id)
            .await?
            .ok_or_else(|| EditorialError::NotFound(format!("article {article_id}")))
    }

    async fn archive(
        &self,
        article_id: Uuid,
        actor: &str,
        reason: &str,
        action: Action,
        now: DateTime<Utc>,
    ) -> Result<Article, EditorialError> {
        let actor = require_actor(actor)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(EditorialError::EmptyReason);
        }
        let article = self.load(article_id).await?;
        let to = transition(article.status, action)?;
        let after = Article {
            status: to,
            archived_reason: Some(reason.to_string()),
            updated_at: now,
            ..article.clone()
        };
        let events = vec![EditorialEvent::Archived {
            article_id,
            archived_by: actor.to_string(),
            reason: reason.to_string(),
        }];
        let (article, _) = self.commit(&article, after, None, events).await?;
        info!(article_id = %article_id, actor, reason, "Article archived");
        Ok(article)
    }

    async fn commit(
        &self,
        before: &Article,
        after: Article,
        revision: Option<NewRevision>,
        events: Vec<EditorialEvent>,
    ) -> Result<(Article, Option<ArticleRevision>), EditorialError> {
        let commit = TransitionCommit {
            expected_status: before.status,
            workload: workload_changes(before, &after),
            article: after.clone(),
            revision,
            events,
        };

        match self.store.commit_transition(commit).await? {
            CommitOutcome::Committed { revision } => {
                info!(
                    article_id = %after.id,
                    from = %before.status,
                    to = %after.status,
                    "Article transitioned"
                );
                Ok((after, revision))
            }
            CommitOutcome::Conflict { actual } => {
                warn!(
                    article_id = %after.id,
                    expected = %before.status,
                    actual = ?actual,
                    "Article changed underneath transition"
                );
                match actual {
                    Some(_) => Err(EditorialError::ConcurrentModification(after.id)),
                    None => Err(EditorialError::NotFound(format!("article {}", after.id))),
                }
            }
        }
    }
}

fn append_notes(existing: &str, cycle: u32, actor: &str, notes: &str) -> String {
    append_entry(existing, format!("[revision {cycle}, {actor}] {notes}"))
}

fn append_escalation(existing: &str, actor: &str, notes: &str) -> String {
    append_entry(existing, format!("[escalated, {actor}] {notes}"))
}

fn append_entry(existing: &str, entry: String) -> String {
    if existing.is_empty() {
        entry
    } else {
        format!("{existing}\n{entry}")
    }
}
