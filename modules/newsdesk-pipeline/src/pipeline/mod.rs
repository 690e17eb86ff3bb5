// Batch runner: dedup -> score -> promote -> discover -> verify -> cite.
//
// Items run one at a time to completion. Any error on one candidate or topic
// is logged, counted, and isolated; siblings in the batch still run. Each
// stage ends in a single terminal store write. A candidate interrupted before
// its decision stays `discovered` and a topic interrupted mid-verification
// stays `pending` or `failed`; `resume` picks both up.

pub mod stats;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use newsdesk_common::{
    CandidateStatus, Decision, EventCandidate, PipelineConfig, Source, Topic, VerificationStatus,
};

use crate::dedup::{cache_entry_for, Deduplicator, RecentWindowCache};
use crate::scoring::{topic_for, ScoreCard, Scorer, ScoringContext};
use crate::store::PipelineStore;
use crate::traits::SourceDiscovery;
use crate::verification::{citation_key, mark_failed, Verifier};

pub use stats::BatchStats;

/// Batches smaller than this say nothing about the approval rate.
const APPROVAL_RATE_MIN_SAMPLE: u32 = 20;
const APPROVAL_RATE_BAND: (f64, f64) = (0.10, 0.20);

pub struct Pipeline {
    store: Arc<dyn PipelineStore>,
    dedup: Deduplicator,
    scorer: Scorer,
    verifier: Verifier,
}

impl Pipeline {
    pub fn new(store: Arc<dyn PipelineStore>, config: &PipelineConfig) -> Self {
        let cache = Arc::new(RecentWindowCache::new(config.dedup_cache_capacity));
        Self::with_cache(store, cache, config)
    }

    /// Build around an existing cache, e.g. one shared with another runner.
    pub fn with_cache(
        store: Arc<dyn PipelineStore>,
        cache: Arc<RecentWindowCache>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            store,
            dedup: Deduplicator::new(cache, config.fuzzy_title_ratio, config.dedup_window_days),
            scorer: Scorer::new(config),
            verifier: Verifier::new(config),
        }
    }

    pub fn deduplicator(&self) -> &Deduplicator {
        &self.dedup
    }

    /// Seed the dedup cache with everything persisted inside the window.
    pub async fn warm(&self, now: DateTime<Utc>) -> Result<usize> {
        let recent = self
            .store
            .candidates_since(self.dedup.window_start(now))
            .await?;
        let count = recent.len();
        self.dedup
            .cache()
            .seed(recent.iter().map(cache_entry_for));
        info!(count, "Dedup cache warmed");
        Ok(count)
    }

    pub async fn process_batch(
        &self,
        candidates: Vec<EventCandidate>,
        discovery: &dyn SourceDiscovery,
        now: DateTime<Utc>,
    ) -> BatchStats {
        let mut stats = BatchStats::default();
        let pruned = self.dedup.prune(now);
        if pruned > 0 {
            info!(pruned, "Pruned dedup cache to window");
        }

        let mut approved_titles = match self
            .store
            .approved_titles_since(self.dedup.window_start(now))
            .await
        {
            Ok(titles) => titles,
            Err(e) => {
                warn!(error = %e, "Failed to load recent approvals, scoring novelty without them");
                Vec::new()
            }
        };

        for candidate in candidates {
            stats.received += 1;
            let candidate_id = candidate.id;
            if let Err(e) = self
                .process_candidate(candidate, discovery, &mut approved_titles, now, &mut stats)
                .await
            {
                stats.errors += 1;
                warn!(candidate_id = %candidate_id, error = %e, "Candidate failed");
            }
        }

        let evaluated = stats.evaluated();
        let rate = stats.approval_rate();
        if evaluated >= APPROVAL_RATE_MIN_SAMPLE
            && !(APPROVAL_RATE_BAND.0..=APPROVAL_RATE_BAND.1).contains(&rate)
        {
            warn!(
                evaluated,
                approval_rate = rate,
                "Approval rate outside target band, review weights and thresholds"
            );
        }
        info!(
            received = stats.received,
            admitted = stats.admitted,
            approved = stats.approved,
            verified = stats.verified,
            errors = stats.errors,
            "Batch processed"
        );
        stats
    }

    /// Re-run verification for every topic whose discovery previously errored.
    pub async fn retry_failed_verifications(
        &self,
        discovery: &dyn SourceDiscovery,
        now: DateTime<Utc>,
    ) -> Result<BatchStats> {
        let mut stats = BatchStats::default();
        self.reverify(VerificationStatus::Failed, discovery, now, &mut stats)
            .await?;
        Ok(stats)
    }

    /// Pick up everything an earlier run left unfinished: candidates saved
    /// but never evaluated, and topics still pending or failed.
    pub async fn resume(
        &self,
        discovery: &dyn SourceDiscovery,
        now: DateTime<Utc>,
    ) -> Result<BatchStats> {
        let mut stats = BatchStats::default();
        let stranded = self
            .store
            .candidates_with_status(CandidateStatus::Discovered)
            .await?;
        if !stranded.is_empty() {
            info!(count = stranded.len(), "Resuming stranded candidates");
            let mut approved_titles = self
                .store
                .approved_titles_since(self.dedup.window_start(now))
                .await?;
            for candidate in stranded {
                stats.received += 1;
                stats.admitted += 1;
                let candidate_id = candidate.id;
                if let Err(e) = self
                    .evaluate(candidate, discovery, &mut approved_titles, now, &mut stats)
                    .await
                {
                    stats.errors += 1;
                    warn!(candidate_id = %candidate_id, error = %e, "Resumed candidate failed");
                }
            }
        }

        self.reverify(VerificationStatus::Pending, discovery, now, &mut stats)
            .await?;
        self.reverify(VerificationStatus::Failed, discovery, now, &mut stats)
            .await?;
        Ok(stats)
    }

    async fn reverify(
        &self,
        status: VerificationStatus,
        discovery: &dyn SourceDiscovery,
        now: DateTime<Utc>,
        stats: &mut BatchStats,
    ) -> Result<()> {
        let topics = self.store.topics_with_status(status).await?;
        if topics.is_empty() {
            return Ok(());
        }
        info!(count = topics.len(), status = %status, "Re-running verification");
        for topic in topics {
            let topic_id = topic.id;
            if let Err(e) = self.verify_or_fail(topic, discovery, now, stats).await {
                stats.errors += 1;
                warn!(topic_id = %topic_id, error = %e, "Verification retry failed");
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Per-item stages
    // -----------------------------------------------------------------------

    async fn process_candidate(
        &self,
        candidate: EventCandidate,
        discovery: &dyn SourceDiscovery,
        approved_titles: &mut Vec<String>,
        now: DateTime<Utc>,
        stats: &mut BatchStats,
    ) -> Result<()> {
        let admission = self.dedup.admit(&candidate);
        if !admission.admitted {
            stats.duplicates += 1;
            return Ok(());
        }
        stats.admitted += 1;
        self.store.save_candidate(&candidate).await?;
        self.evaluate(candidate, discovery, approved_titles, now, stats)
            .await
    }

    /// Score a saved candidate and write its decision. Approval goes through
    /// `promote_topic` alone, so status and topic land together or not at all.
    async fn evaluate(
        &self,
        candidate: EventCandidate,
        discovery: &dyn SourceDiscovery,
        approved_titles: &mut Vec<String>,
        now: DateTime<Utc>,
        stats: &mut BatchStats,
    ) -> Result<()> {
        let ctx = ScoringContext {
            now,
            recent_approved_titles: approved_titles.as_slice(),
        };
        let card = self.scorer.score(&candidate, &ctx);

        if card.decision == Decision::Approve {
            let topic = self
                .store
                .promote_topic(&topic_for(&candidate, &card, now))
                .await?;
            log_evaluation(&candidate, &card);
            stats.approved += 1;
            approved_titles.push(candidate.title.clone());
            if topic.verification_status == VerificationStatus::Pending {
                self.verify_or_fail(topic, discovery, now, stats).await?;
            }
            return Ok(());
        }

        self.store
            .record_evaluation(
                candidate.id,
                &card.dimensions,
                card.composite,
                card.decision.candidate_status(),
                card.reason.as_deref(),
            )
            .await?;
        log_evaluation(&candidate, &card);
        match card.decision {
            Decision::Hold => stats.held += 1,
            _ => stats.rejected += 1,
        }
        Ok(())
    }

    /// Verify the topic, or mark it failed so a later run picks it up again.
    /// Only an error persisting the failure itself escapes.
    async fn verify_or_fail(
        &self,
        mut topic: Topic,
        discovery: &dyn SourceDiscovery,
        now: DateTime<Utc>,
        stats: &mut BatchStats,
    ) -> Result<()> {
        match self.verify_topic(&topic, discovery, now).await {
            Ok(VerificationStatus::Verified) => stats.verified += 1,
            Ok(VerificationStatus::InsufficientSources) => stats.insufficient += 1,
            Ok(VerificationStatus::Failed) => stats.failed += 1,
            Ok(VerificationStatus::Pending) => {}
            Err(e) => {
                warn!(topic_id = %topic.id, error = %e, "Verification failed, topic retryable");
                mark_failed(&mut topic, &format!("Verification failed: {e:#}"));
                self.store.record_verification(&topic).await?;
                stats.failed += 1;
            }
        }
        Ok(())
    }

    async fn verify_topic(
        &self,
        topic: &Topic,
        discovery: &dyn SourceDiscovery,
        now: DateTime<Utc>,
    ) -> Result<VerificationStatus> {
        let discovered = discovery
            .discover(topic)
            .await
            .context("source discovery failed")?;

        let mut known: HashMap<String, Source> = HashMap::new();
        for source in &discovered {
            let key = citation_key(source);
            if known.contains_key(&key) {
                continue;
            }
            if let Some(record) = self.store.source_by_key(&key).await? {
                known.insert(key, record);
            }
        }

        let outcome = self.verifier.verify(&discovered, &known);
        let mut cited = HashSet::new();
        for planned in outcome.plan.ranked() {
            if !cited.insert(planned.source_key.as_str()) {
                continue;
            }
            self.store
                .upsert_cited_source(topic.id, &planned.source_key, &planned.name, planned.kind, now)
                .await?;
        }

        let status = outcome.status;
        info!(
            topic_id = %topic.id,
            status = %status,
            credible = outcome.credible_count,
            academic = outcome.academic_count,
            facts = outcome.facts.len(),
            "Topic verified"
        );
        let mut verified = topic.clone();
        outcome.apply_to(&mut verified, now);
        self.store.record_verification(&verified).await?;
        Ok(status)
    }
}

fn log_evaluation(candidate: &EventCandidate, card: &ScoreCard) {
    info!(
        candidate_id = %candidate.id,
        composite = card.composite,
        decision = %card.decision,
        "Candidate evaluated"
    );
}
