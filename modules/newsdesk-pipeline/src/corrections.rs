//! Post-publication corrections.
//!
//! A correction moves pending -> verified -> published, or to rejected from
//! either open state. Publishing writes an article revision with the original
//! and corrected text, emits an outbox event, and feeds the reliability ledger
//! for every source the article's topic planned to cite. Published
//! corrections never change again.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use newsdesk_common::{
    ArticleRevision, ArticleStatus, Correction, CorrectionSeverity, CorrectionStatus,
    CorrectionType, EditorialEvent, ReliabilityDeltas, ReliabilityEvent,
};

use crate::editorial::machine::require_actor;
use crate::editorial::EditorialError;
use crate::reliability::{EventContext, ReliabilityLedger};
use crate::store::{CommitOutcome, CorrectionCommit, NewRevision, PipelineStore};

/// What a reporter knows when filing a correction.
#[derive(Debug, Clone, PartialEq, TypedBuilder)]
pub struct CorrectionReport {
    pub correction_type: CorrectionType,
    pub severity: CorrectionSeverity,
    #[builder(setter(into))]
    pub original_text: String,
    #[builder(setter(into))]
    pub corrected_text: String,
    #[builder(setter(into))]
    pub public_notice: String,
    #[builder(setter(into))]
    pub reported_by: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedCorrection {
    pub correction: Correction,
    pub revision: Option<ArticleRevision>,
    /// Source key and resulting score for every reliability event applied.
    pub reliability: Vec<(String, f64)>,
}

/// Reliability signal carried by a published correction, if any.
pub fn reliability_event_for(
    correction_type: CorrectionType,
    severity: CorrectionSeverity,
) -> Option<ReliabilityEvent> {
    match correction_type {
        CorrectionType::Retraction => Some(ReliabilityEvent::Retraction),
        CorrectionType::FactualError | CorrectionType::SourceError => {
            if severity == CorrectionSeverity::Minor {
                Some(ReliabilityEvent::MinorCorrection)
            } else {
                Some(ReliabilityEvent::CorrectionIssued)
            }
        }
        CorrectionType::Clarification | CorrectionType::Update => None,
    }
}

fn check_transition(correction: &Correction, to: CorrectionStatus) -> Result<(), EditorialError> {
    use CorrectionStatus::*;

    if correction.status == Published {
        return Err(EditorialError::ImmutableCorrection(correction.id));
    }
    match (correction.status, to) {
        (Pending, Verified) | (Pending, Rejected) | (Verified, Rejected) | (Verified, Published) => {
            Ok(())
        }
        (from, to) => Err(EditorialError::IllegalCorrectionTransition { from, to }),
    }
}

pub struct CorrectionDesk {
    store: Arc<dyn PipelineStore>,
    ledger: ReliabilityLedger,
}

impl CorrectionDesk {
    pub fn new(store: Arc<dyn PipelineStore>, deltas: ReliabilityDeltas) -> Self {
        let ledger = ReliabilityLedger::new(store.clone(), deltas);
        Self { store, ledger }
    }

    pub async fn report_correction(
        &self,
        article_id: Uuid,
        report: CorrectionReport,
        now: DateTime<Utc>,
    ) -> Result<Correction, EditorialError> {
        let reported_by = require_actor(&report.reported_by)?.to_string();
        let article = self
            .store
            .article(article_id)
            .await?
            .ok_or_else(|| EditorialError::NotFound(format!("article {article_id}")))?;
        if article.status != ArticleStatus::Published {
            return Err(EditorialError::NotPublished(article_id));
        }

        let correction = Correction {
            id: Uuid::new_v4(),
            article_id,
            correction_type: report.correction_type,
            severity: report.severity,
            original_text: report.original_text,
            corrected_text: report.corrected_text,
            public_notice: report.public_notice,
            status: CorrectionStatus::Pending,
            reported_by,
            reviewed_by: None,
            created_at: now,
            published_at: None,
        };
        self.store.insert_correction(&correction).await?;
        info!(
            correction_id = %correction.id,
            article_id = %article_id,
            correction_type = correction.correction_type.as_str(),
            severity = correction.severity.as_str(),
            "Correction reported"
        );
        Ok(correction)
    }

    pub async fn verify_correction(
        &self,
        correction_id: Uuid,
        actor: &str,
    ) -> Result<Correction, EditorialError> {
        let actor = require_actor(actor)?;
        let correction = self.load(correction_id).await?;
        check_transition(&correction, CorrectionStatus::Verified)?;
        let after = Correction {
            status: CorrectionStatus::Verified,
            reviewed_by: Some(actor.to_string()),
            ..correction.clone()
        };
        let (after, _) = self.commit(&correction, after, None, Vec::new()).await?;
        Ok(after)
    }

    pub async fn reject_correction(
        &self,
        correction_id: Uuid,
        actor: &str,
    ) -> Result<Correction, EditorialError> {
        let actor = require_actor(actor)?;
        let correction = self.load(correction_id).await?;
        check_transition(&correction, CorrectionStatus::Rejected)?;
        let after = Correction {
            status: CorrectionStatus::Rejected,
            reviewed_by: Some(actor.to_string()),
            ..correction.clone()
        };
        let (after, _) = self.commit(&correction, after, None, Vec::new()).await?;
        Ok(after)
    }

    pub async fn publish_correction(
        &self,
        correction_id: Uuid,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<PublishedCorrection, EditorialError> {
        let actor = require_actor(actor)?;
        let correction = self.load(correction_id).await?;
        check_transition(&correction, CorrectionStatus::Published)?;

        let after = Correction {
            status: CorrectionStatus::Published,
            published_at: Some(now),
            ..correction.clone()
        };
        let revision = NewRevision {
            actor: actor.to_string(),
            before: Some(correction.original_text.clone()),
            after: Some(correction.corrected_text.clone()),
            change_reason: correction.public_notice.clone(),
            created_at: now,
        };
        let events = vec![EditorialEvent::CorrectionPublished {
            article_id: correction.article_id,
            correction_id,
        }];
        let (correction, revision) = self
            .commit(&correction, after, Some(revision), events)
            .await?;

        let reliability = self.apply_reliability(&correction, now).await?;
        Ok(PublishedCorrection {
            correction,
            revision,
            reliability,
        })
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn load(&self, correction_id: Uuid) -> Result<Correction, EditorialError> {
        self.store
            .correction(correction_id)
            .await?
            .ok_or_else(|| EditorialError::NotFound(format!("correction {correction_id}")))
    }

    async fn commit(
        &self,
        before: &Correction,
        after: Correction,
        revision: Option<NewRevision>,
        events: Vec<EditorialEvent>,
    ) -> Result<(Correction, Option<ArticleRevision>), EditorialError> {
        let commit = CorrectionCommit {
            expected_status: before.status,
            correction: after.clone(),
            revision,
            events,
        };
        match self.store.commit_correction(commit).await? {
            CommitOutcome::Committed { revision } => {
                info!(
                    correction_id = %after.id,
                    from = %before.status,
                    to = %after.status,
                    "Correction transitioned"
                );
                Ok((after, revision))
            }
            CommitOutcome::Conflict {
                actual: Some(CorrectionStatus::Published),
            } => Err(EditorialError::ImmutableCorrection(after.id)),
            CommitOutcome::Conflict { actual: Some(_) } => {
                Err(EditorialError::ConcurrentModification(after.id))
            }
            CommitOutcome::Conflict { actual: None } => {
                Err(EditorialError::NotFound(format!("correction {}", after.id)))
            }
        }
    }

    /// One event per distinct planned source. A source that fails to update
    /// is logged and skipped; the correction itself is already published.
    async fn apply_reliability(
        &self,
        correction: &Correction,
        now: DateTime<Utc>,
    ) -> Result<Vec<(String, f64)>, EditorialError> {
        let Some(event) = reliability_event_for(correction.correction_type, correction.severity)
        else {
            return Ok(Vec::new());
        };

        let Some(article) = self.store.article(correction.article_id).await? else {
            return Ok(Vec::new());
        };
        let Some(plan) = self
            .store
            .topic(article.topic_id)
            .await?
            .and_then(|t| t.source_plan)
        else {
            return Ok(Vec::new());
        };

        let context = EventContext {
            article_id: Some(article.id),
            correction_id: Some(correction.id),
        };
        let mut seen = HashSet::new();
        let mut applied = Vec::new();
        for source in plan.ranked() {
            if !seen.insert(source.source_key.as_str()) {
                continue;
            }
            match self
                .ledger
                .log_event(&source.source_key, event, context, now)
                .await
            {
                Ok(score) => applied.push((source.source_key.clone(), score)),
                Err(e) => warn!(
                    source = source.source_key.as_str(),
                    correction_id = %correction.id,
                    error = %e,
                    "Failed to apply correction to source reliability"
                ),
            }
        }
        Ok(applied)
    }
}
