use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use newsdesk_common::{
    Article, ArticleRevision, ArticleStatus, CandidateStatus, Correction, CorrectionStatus,
    DimensionScores, Editor, EventCandidate, OutboxEvent, ReliabilityEvent, Source, SourceKind,
    SourceReliabilityLogEntry, Topic, VerificationStatus,
};

use super::{
    outbox_entries, CommitOutcome, CorrectionCommit, NewRevision, PipelineStore, TransitionCommit,
};
use crate::reliability::adjusted_score;

#[derive(Default)]
struct State {
    candidates: Vec<EventCandidate>,
    topics: Vec<Topic>,
    sources: Vec<Source>,
    citations: HashSet<(Uuid, String)>,
    reliability_log: Vec<SourceReliabilityLogEntry>,
    editors: Vec<Editor>,
    articles: Vec<Article>,
    revisions: Vec<ArticleRevision>,
    corrections: Vec<Correction>,
    outbox: Vec<OutboxEvent>,
    failures: Vec<&'static str>,
}

impl State {
    fn take_failure(&mut self, operation: &'static str) -> Result<()> {
        if let Some(i) = self.failures.iter().position(|f| *f == operation) {
            self.failures.remove(i);
            bail!("InMemoryStore: injected failure in {operation}");
        }
        Ok(())
    }

    fn append_revision(&mut self, article_id: Uuid, revision: NewRevision) -> ArticleRevision {
        let next = self
            .revisions
            .iter()
            .filter(|r| r.article_id == article_id)
            .map(|r| r.revision_number)
            .max()
            .unwrap_or(0)
            + 1;
        let revision = revision.numbered(article_id, next);
        self.revisions.push(revision.clone());
        revision
    }
}

/// Mutex-guarded store with deterministic insertion-order reads. Every trait
/// call runs under one lock, so each commit is atomic.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn candidate(&self, id: Uuid) -> Option<EventCandidate> {
        self.lock().candidates.iter().find(|c| c.id == id).cloned()
    }

    pub fn topic_count(&self) -> usize {
        self.lock().topics.len()
    }

    pub fn editor(&self, id: Uuid) -> Option<Editor> {
        self.lock().editors.iter().find(|e| e.id == id).cloned()
    }

    /// Make the next call to `operation` fail before it touches any state.
    /// Wired for `promote_topic`, `source_by_key` and `record_verification`.
    pub fn fail_next(&self, operation: &'static str) {
        self.lock().failures.push(operation);
    }

    /// Every outbox event ever written, dispatched or not.
    pub fn all_events(&self) -> Vec<OutboxEvent> {
        self.lock().outbox.clone()
    }
}

#[async_trait]
impl PipelineStore for InMemoryStore {
    async fn candidates_since(&self, since: DateTime<Utc>) -> Result<Vec<EventCandidate>> {
        let mut out: Vec<EventCandidate> = self
            .lock()
            .candidates
            .iter()
            .filter(|c| c.discovered_at >= since)
            .cloned()
            .collect();
        out.sort_by_key(|c| c.discovered_at);
        Ok(out)
    }

    async fn approved_titles_since(&self, since: DateTime<Utc>) -> Result<Vec<String>> {
        let mut approved: Vec<(DateTime<Utc>, String)> = self
            .lock()
            .candidates
            .iter()
            .filter(|c| c.status == CandidateStatus::Approved && c.discovered_at >= since)
            .map(|c| (c.discovered_at, c.title.clone()))
            .collect();
        approved.sort_by_key(|(at, _)| *at);
        Ok(approved.into_iter().map(|(_, title)| title).collect())
    }

    async fn save_candidate(&self, candidate: &EventCandidate) -> Result<()> {
        let mut state = self.lock();
        if state.candidates.iter().any(|c| c.id == candidate.id) {
            bail!("Candidate {} already exists", candidate.id);
        }
        state.candidates.push(candidate.clone());
        Ok(())
    }

    async fn record_evaluation(
        &self,
        candidate_id: Uuid,
        dimensions: &DimensionScores,
        composite: f64,
        status: CandidateStatus,
        reason: Option<&str>,
    ) -> Result<()> {
        let mut state = self.lock();
        let Some(candidate) = state.candidates.iter_mut().find(|c| c.id == candidate_id) else {
            bail!("Candidate {candidate_id} not found");
        };
        if candidate.status.is_final() {
            bail!("Candidate {candidate_id} is already {}", candidate.status);
        }
        candidate.dimensions = Some(*dimensions);
        candidate.composite_score = Some(composite);
        candidate.status = status;
        candidate.status_reason = reason.map(str::to_string);
        Ok(())
    }

    async fn candidates_with_status(&self, status: CandidateStatus) -> Result<Vec<EventCandidate>> {
        Ok(self
            .lock()
            .candidates
            .iter()
            .filter(|c| c.status == status)
            .cloned()
            .collect())
    }

    async fn promote_topic(&self, topic: &Topic) -> Result<Topic> {
        let mut state = self.lock();
        state.take_failure("promote_topic")?;
        if let Some(existing) = state.topics.iter().find(|t| t.candidate_id == topic.candidate_id) {
            return Ok(existing.clone());
        }
        let Some(candidate) = state.candidates.iter_mut().find(|c| c.id == topic.candidate_id) else {
            bail!("Candidate {} not found", topic.candidate_id);
        };
        if candidate.status.is_final() {
            bail!("Candidate {} is already {}", candidate.id, candidate.status);
        }
        candidate.dimensions = Some(topic.dimensions);
        candidate.composite_score = Some(topic.composite_score);
        candidate.status = CandidateStatus::Approved;
        candidate.status_reason = None;
        candidate.topic_id = Some(topic.id);
        state.topics.push(topic.clone());
        Ok(topic.clone())
    }

    async fn topic(&self, id: Uuid) -> Result<Option<Topic>> {
        Ok(self.lock().topics.iter().find(|t| t.id == id).cloned())
    }

    async fn record_verification(&self, topic: &Topic) -> Result<()> {
        let mut state = self.lock();
        state.take_failure("record_verification")?;
        let Some(stored) = state.topics.iter_mut().find(|t| t.id == topic.id) else {
            bail!("Topic {} not found", topic.id);
        };
        stored.verification_status = topic.verification_status;
        stored.verified_facts = topic.verified_facts.clone();
        stored.source_plan = topic.source_plan.clone();
        stored.verification_note = topic.verification_note.clone();
        stored.verified_at = topic.verified_at;
        Ok(())
    }

    async fn topics_with_status(&self, status: VerificationStatus) -> Result<Vec<Topic>> {
        Ok(self
            .lock()
            .topics
            .iter()
            .filter(|t| t.verification_status == status)
            .cloned()
            .collect())
    }

    async fn source_by_key(&self, key: &str) -> Result<Option<Source>> {
        let mut state = self.lock();
        state.take_failure("source_by_key")?;
        Ok(state.sources.iter().find(|s| s.key == key).cloned())
    }

    async fn upsert_cited_source(
        &self,
        topic_id: Uuid,
        key: &str,
        name: &str,
        kind: SourceKind,
        at: DateTime<Utc>,
    ) -> Result<Source> {
        let mut state = self.lock();
        let index = match state.sources.iter().position(|s| s.key == key) {
            Some(i) => i,
            None => {
                state.sources.push(Source::first_citation(key, name, kind, at));
                state.sources.len() - 1
            }
        };
        let first_from_topic = state.citations.insert((topic_id, key.to_string()));
        let source = &mut state.sources[index];
        if first_from_topic {
            source.citation_count += 1;
            source.updated_at = at;
        }
        Ok(source.clone())
    }

    async fn log_reliability_event(
        &self,
        key: &str,
        event: ReliabilityEvent,
        delta: f64,
        article_id: Option<Uuid>,
        correction_id: Option<Uuid>,
        at: DateTime<Utc>,
    ) -> Result<Option<SourceReliabilityLogEntry>> {
        let mut state = self.lock();
        let Some(source) = state.sources.iter_mut().find(|s| s.key == key) else {
            return Ok(None);
        };
        source.credibility_score = adjusted_score(source.credibility_score, delta);
        source.updated_at = at;
        let entry = SourceReliabilityLogEntry {
            id: Uuid::new_v4(),
            source_id: source.id,
            event,
            delta,
            resulting_score: source.credibility_score,
            article_id,
            correction_id,
            created_at: at,
        };
        state.reliability_log.push(entry.clone());
        Ok(Some(entry))
    }

    async fn reliability_log(&self, source_id: Uuid) -> Result<Vec<SourceReliabilityLogEntry>> {
        Ok(self
            .lock()
            .reliability_log
            .iter()
            .filter(|e| e.source_id == source_id)
            .cloned()
            .collect())
    }

    async fn upsert_editor(&self, editor: &Editor) -> Result<()> {
        let mut state = self.lock();
        match state.editors.iter_mut().find(|e| e.id == editor.id) {
            Some(existing) => {
                *existing = Editor {
                    open_workload: existing.open_workload,
                    ..editor.clone()
                }
            }
            None => state.editors.push(editor.clone()),
        }
        Ok(())
    }

    async fn editors(&self) -> Result<Vec<Editor>> {
        Ok(self.lock().editors.clone())
    }

    async fn insert_article(&self, article: &Article) -> Result<()> {
        let mut state = self.lock();
        if state.articles.iter().any(|a| a.id == article.id) {
            bail!("Article {} already exists", article.id);
        }
        state.articles.push(article.clone());
        Ok(())
    }

    async fn article(&self, id: Uuid) -> Result<Option<Article>> {
        Ok(self.lock().articles.iter().find(|a| a.id == id).cloned())
    }

    async fn articles_with_status(&self, statuses: &[ArticleStatus]) -> Result<Vec<Article>> {
        let mut out: Vec<Article> = self
            .lock()
            .articles
            .iter()
            .filter(|a| statuses.contains(&a.status))
            .cloned()
            .collect();
        out.sort_by_key(|a| a.created_at);
        Ok(out)
    }

    async fn overdue_articles(&self, now: DateTime<Utc>) -> Result<Vec<Article>> {
        let mut out: Vec<Article> = self
            .lock()
            .articles
            .iter()
            .filter(|a| a.status == ArticleStatus::UnderReview)
            .filter(|a| a.review_deadline.is_some_and(|d| d < now))
            .cloned()
            .collect();
        out.sort_by_key(|a| a.review_deadline);
        Ok(out)
    }

    async fn revisions(&self, article_id: Uuid) -> Result<Vec<ArticleRevision>> {
        let mut out: Vec<ArticleRevision> = self
            .lock()
            .revisions
            .iter()
            .filter(|r| r.article_id == article_id)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.revision_number);
        Ok(out)
    }

    async fn commit_transition(
        &self,
        commit: TransitionCommit,
    ) -> Result<CommitOutcome<ArticleStatus>> {
        let mut state = self.lock();
        let article_id = commit.article.id;
        let Some(index) = state.articles.iter().position(|a| a.id == article_id) else {
            return Ok(CommitOutcome::Conflict { actual: None });
        };
        let actual = state.articles[index].status;
        if actual != commit.expected_status {
            return Ok(CommitOutcome::Conflict {
                actual: Some(actual),
            });
        }

        state.articles[index] = commit.article;
        let revision = commit
            .revision
            .map(|r| state.append_revision(article_id, r));
        for change in &commit.workload {
            if let Some(editor) = state.editors.iter_mut().find(|e| e.id == change.editor_id) {
                editor.open_workload = editor.open_workload.saturating_add_signed(change.delta);
            }
        }
        let at = state.articles[index].updated_at;
        let entries = outbox_entries(commit.events, at);
        state.outbox.extend(entries);
        Ok(CommitOutcome::Committed { revision })
    }

    async fn insert_correction(&self, correction: &Correction) -> Result<()> {
        let mut state = self.lock();
        if state.corrections.iter().any(|c| c.id == correction.id) {
            bail!("Correction {} already exists", correction.id);
        }
        state.corrections.push(correction.clone());
        Ok(())
    }

    async fn correction(&self, id: Uuid) -> Result<Option<Correction>> {
        Ok(self.lock().corrections.iter().find(|c| c.id == id).cloned())
    }

    async fn commit_correction(
        &self,
        commit: CorrectionCommit,
    ) -> Result<CommitOutcome<CorrectionStatus>> {
        let mut state = self.lock();
        let id = commit.correction.id;
        let Some(index) = state.corrections.iter().position(|c| c.id == id) else {
            return Ok(CommitOutcome::Conflict { actual: None });
        };
        let actual = state.corrections[index].status;
        if actual != commit.expected_status {
            return Ok(CommitOutcome::Conflict {
                actual: Some(actual),
            });
        }

        let article_id = commit.correction.article_id;
        let at = commit
            .correction
            .published_at
            .unwrap_or(commit.correction.created_at);
        state.corrections[index] = commit.correction;
        let revision = commit
            .revision
            .map(|r| state.append_revision(article_id, r));
        let entries = outbox_entries(commit.events, at);
        state.outbox.extend(entries);
        Ok(CommitOutcome::Committed { revision })
    }

    async fn pending_events(&self, limit: usize) -> Result<Vec<OutboxEvent>> {
        Ok(self
            .lock()
            .outbox
            .iter()
            .filter(|e| e.dispatched_at.is_none())
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_dispatched(&self, ids: &[Uuid], at: DateTime<Utc>) -> Result<()> {
        let mut state = self.lock();
        for event in state.outbox.iter_mut().filter(|e| ids.contains(&e.id)) {
            event.dispatched_at.get_or_insert(at);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use newsdesk_common::SourceTier;

    fn candidate(title: &str, discovered_at: DateTime<Utc>) -> EventCandidate {
        EventCandidate::builder()
            .title(title)
            .discovered_at(discovered_at)
            .build()
    }

    #[tokio::test]
    async fn record_evaluation_freezes_final_candidates() {
        let store = InMemoryStore::new();
        let c = candidate("Walkout", Utc::now());
        store.save_candidate(&c).await.unwrap();
        store
            .record_evaluation(
                c.id,
                &DimensionScores::default(),
                10.0,
                CandidateStatus::Rejected,
                Some("low"),
            )
            .await
            .unwrap();
        let again = store
            .record_evaluation(
                c.id,
                &DimensionScores::default(),
                90.0,
                CandidateStatus::Approved,
                None,
            )
            .await;
        assert!(again.is_err());
        assert_eq!(store.candidate(c.id).unwrap().status, CandidateStatus::Rejected);
    }

    fn topic_of(candidate: &EventCandidate) -> Topic {
        Topic {
            id: Uuid::new_v4(),
            candidate_id: candidate.id,
            title: candidate.title.clone(),
            description: String::new(),
            category: "labor_action".into(),
            regional: newsdesk_common::RegionalClassification {
                scope: newsdesk_common::RegionScope::National,
                region_id: None,
            },
            dimensions: DimensionScores::default(),
            composite_score: 82.0,
            verification_status: VerificationStatus::Pending,
            verified_facts: Vec::new(),
            source_plan: None,
            verification_note: None,
            created_at: candidate.discovered_at,
            verified_at: None,
        }
    }

    #[tokio::test]
    async fn promotion_approves_in_the_same_write() {
        let store = InMemoryStore::new();
        let c = candidate("Walkout", Utc::now());
        store.save_candidate(&c).await.unwrap();

        let topic = store.promote_topic(&topic_of(&c)).await.unwrap();
        let stored = store.candidate(c.id).unwrap();
        assert_eq!(stored.status, CandidateStatus::Approved);
        assert_eq!(stored.composite_score, Some(82.0));
        assert_eq!(stored.topic_id, Some(topic.id));
    }

    #[tokio::test]
    async fn promotion_refuses_rejected_and_injected_failures() {
        let store = InMemoryStore::new();
        let rejected = candidate("Park renamed", Utc::now());
        store.save_candidate(&rejected).await.unwrap();
        store
            .record_evaluation(
                rejected.id,
                &DimensionScores::default(),
                10.0,
                CandidateStatus::Rejected,
                None,
            )
            .await
            .unwrap();
        assert!(store.promote_topic(&topic_of(&rejected)).await.is_err());
        assert_eq!(store.topic_count(), 0);

        let fresh = candidate("Walkout", Utc::now());
        store.save_candidate(&fresh).await.unwrap();
        store.fail_next("promote_topic");
        assert!(store.promote_topic(&topic_of(&fresh)).await.is_err());
        assert_eq!(store.candidate(fresh.id).unwrap().status, CandidateStatus::Discovered);
        assert_eq!(store.topic_count(), 0);
        assert!(store.promote_topic(&topic_of(&fresh)).await.is_ok());
    }

    #[tokio::test]
    async fn approved_titles_are_windowed_and_ordered() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        for (title, age) in [("old", 10), ("newer", 1), ("newest", 0)] {
            let c = candidate(title, now - Duration::days(age));
            store.save_candidate(&c).await.unwrap();
            store
                .record_evaluation(
                    c.id,
                    &DimensionScores::default(),
                    80.0,
                    CandidateStatus::Approved,
                    None,
                )
                .await
                .unwrap();
        }
        let titles = store.approved_titles_since(now - Duration::days(7)).await.unwrap();
        assert_eq!(titles, vec!["newer", "newest"]);
    }

    #[tokio::test]
    async fn cited_source_starts_at_tier_midpoint_and_counts_citations() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let (first_topic, second_topic) = (Uuid::new_v4(), Uuid::new_v4());
        store
            .upsert_cited_source(first_topic, "reuters.com", "Reuters", SourceKind::WireService, now)
            .await
            .unwrap();
        let s = store
            .upsert_cited_source(second_topic, "reuters.com", "Reuters", SourceKind::Opinion, now)
            .await
            .unwrap();
        assert_eq!(s.tier, SourceTier::Tier2);
        assert_eq!(s.credibility_score, 85.0);
        assert_eq!(s.citation_count, 2);

        let again = store
            .upsert_cited_source(second_topic, "reuters.com", "Reuters", SourceKind::WireService, now)
            .await
            .unwrap();
        assert_eq!(again.citation_count, 2);
    }

    #[tokio::test]
    async fn reliability_event_for_unknown_source_is_none() {
        let store = InMemoryStore::new();
        let logged = store
            .log_reliability_event(
                "nowhere.example",
                ReliabilityEvent::Retraction,
                -30.0,
                None,
                None,
                Utc::now(),
            )
            .await
            .unwrap();
        assert!(logged.is_none());
    }

    #[tokio::test]
    async fn dispatched_events_leave_the_pending_queue() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        store.lock().outbox = outbox_entries(
            vec![newsdesk_common::EditorialEvent::Published {
                article_id: Uuid::new_v4(),
                published_by: "chief".into(),
            }],
            now,
        );
        let pending = store.pending_events(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        store.mark_dispatched(&[pending[0].id], now).await.unwrap();
        assert!(store.pending_events(10).await.unwrap().is_empty());
        assert_eq!(store.all_events().len(), 1);
    }

    #[tokio::test]
    async fn editor_profile_update_keeps_live_workload() {
        let store = InMemoryStore::new();
        let mut editor = Editor {
            id: Uuid::new_v4(),
            name: "Xavier".into(),
            specializations: vec!["labor_action".into()],
            general: false,
            active: true,
            open_workload: 2,
        };
        store.upsert_editor(&editor).await.unwrap();

        editor.specializations.push("wages".into());
        editor.open_workload = 0;
        store.upsert_editor(&editor).await.unwrap();

        let stored = store.editor(editor.id).unwrap();
        assert_eq!(stored.specializations, vec!["labor_action", "wages"]);
        assert_eq!(stored.open_workload, 2);
    }
}
