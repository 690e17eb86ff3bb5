//! End-to-end batch runs against the in-memory store: dedup, scoring,
//! topic promotion, verification and citation registration.

use std::sync::Arc;

use chrono::{Duration, Utc};

use newsdesk_common::{
    CandidateStatus, DimensionScores, PipelineConfig, SourceTier, VerificationStatus,
};
use newsdesk_pipeline::editorial::EditorialDesk;
use newsdesk_pipeline::pipeline::Pipeline;
use newsdesk_pipeline::store::{InMemoryStore, PipelineStore};
use newsdesk_pipeline::testing::{
    candidate, cited, scenario_a_candidate, scenario_a_sources, scenario_b_candidate,
    MockDiscovery, SCENARIO_A_TITLE,
};

fn pipeline() -> (Arc<InMemoryStore>, Pipeline) {
    let store = Arc::new(InMemoryStore::new());
    let pipeline = Pipeline::new(store.clone(), &PipelineConfig::default());
    (store, pipeline)
}

#[tokio::test]
async fn scenario_a_strike_is_approved_and_verified() {
    let (store, pipeline) = pipeline();
    let now = Utc::now();
    let discovery = MockDiscovery::new().on_topic(SCENARIO_A_TITLE, scenario_a_sources());
    let strike = scenario_a_candidate(now);
    let id = strike.id;

    let stats = pipeline.process_batch(vec![strike], &discovery, now).await;

    assert_eq!(stats.approved, 1, "{stats}");
    assert_eq!(stats.verified, 1, "{stats}");
    assert_eq!(stats.errors, 0);

    let stored = store.candidate(id).unwrap();
    assert_eq!(stored.status, CandidateStatus::Approved);
    let dims = stored.dimensions.unwrap();
    assert_close(dims.worker_impact, 10.0);
    assert_close(dims.timeliness, 10.0);
    assert_close(dims.verifiability, 8.5);
    assert_close(dims.regional_relevance, 10.0);
    assert_close(dims.conflict, 9.0);
    assert_close(dims.novelty, 7.0);
    assert_close(stored.composite_score.unwrap(), 94.5);
    let topic_id = stored.topic_id.expect("approved candidate links its topic");

    let topic = store.topic(topic_id).await.unwrap().unwrap();
    assert_eq!(topic.verification_status, VerificationStatus::Verified);
    assert_eq!(topic.category, "labor_action");
    let plan = topic.source_plan.unwrap();
    assert_eq!(plan.primary[0].tier, SourceTier::Tier1);
    assert!(plan.attribution_strategy.starts_with("Lead with osha.gov"));

    let walkout = topic
        .verified_facts
        .iter()
        .find(|f| f.text.contains("walked off the job"))
        .unwrap();
    assert!(walkout.cross_referenced);
    assert!(walkout.conflicting_info.is_none());

    let reuters = store.source_by_key("reuters.com").await.unwrap().unwrap();
    assert_eq!(reuters.citation_count, 1);
    assert_eq!(reuters.credibility_score, 85.0);
}

#[tokio::test]
async fn scenario_b_press_release_creates_no_topic() {
    let (store, pipeline) = pipeline();
    let now = Utc::now();
    let discovery = MockDiscovery::new();
    let release = scenario_b_candidate(now);
    let id = release.id;

    let stats = pipeline.process_batch(vec![release], &discovery, now).await;

    assert_eq!(stats.approved, 0);
    assert_eq!(stats.held, 1, "{stats}");
    let stored = store.candidate(id).unwrap();
    assert_eq!(stored.status, CandidateStatus::Hold);
    // "Record profits" reads as a first-of-its-kind story, so novelty stays
    // high and lifts the composite into the hold band instead of a reject.
    assert_close(stored.dimensions.unwrap().novelty, 8.5);
    let composite = stored.composite_score.unwrap();
    assert!((35.0..36.0).contains(&composite), "composite {composite}");
    assert!(stored.topic_id.is_none());
    assert_eq!(store.topic_count(), 0);
    assert!(discovery.calls().is_empty());
}

#[tokio::test]
async fn scenario_c_two_wire_one_regional_is_insufficient() {
    let (store, pipeline) = pipeline();
    let now = Utc::now();
    let discovery = MockDiscovery::new().on_topic(
        SCENARIO_A_TITLE,
        vec![
            cited("https://www.reuters.com/a", &["Workers walked out Monday."]),
            cited("https://www.nytimes.com/b", &["Workers walked out Monday."]),
            cited("https://www.courtlistener.com/c", &["A complaint was filed."]),
        ],
    );

    let stats = pipeline
        .process_batch(vec![scenario_a_candidate(now)], &discovery, now)
        .await;

    assert_eq!(stats.insufficient, 1, "{stats}");
    let queued = store
        .topics_with_status(VerificationStatus::InsufficientSources)
        .await
        .unwrap();
    assert_eq!(queued.len(), 1);
    let note = queued[0].verification_note.as_deref().unwrap();
    assert!(note.starts_with("2 credible and 0 academic"), "{note}");
}

#[tokio::test]
async fn tier_four_sources_never_verify() {
    let (store, pipeline) = pipeline();
    let now = Utc::now();
    let social = [
        "https://twitter.com/a/status/1",
        "https://www.reddit.com/r/labor/comments/2",
        "https://www.facebook.com/posts/3",
        "https://tiktok.com/@x/video/4",
        "https://someone.substack.com/p/5",
        "https://medium.com/@y/6",
    ]
    .iter()
    .map(|url| cited(url, &["Thousands of workers walked off the job."]))
    .collect();
    let discovery = MockDiscovery::new().on_topic(SCENARIO_A_TITLE, social);

    let stats = pipeline
        .process_batch(vec![scenario_a_candidate(now)], &discovery, now)
        .await;

    assert_eq!(stats.verified, 0);
    assert_eq!(stats.insufficient, 1);
    assert_eq!(
        store
            .topics_with_status(VerificationStatus::Verified)
            .await
            .unwrap()
            .len(),
        0
    );
}

#[tokio::test]
async fn identical_titles_in_one_batch_are_deduplicated() {
    let (store, pipeline) = pipeline();
    let now = Utc::now();
    let first = candidate("Nurses Strike at Three Hospitals", "https://a.example/1", now);
    let second = candidate("nurses strike at three hospitals!", "https://b.example/2", now);
    let second_id = second.id;

    let stats = pipeline
        .process_batch(vec![first, second], &MockDiscovery::new(), now)
        .await;

    assert_eq!(stats.admitted, 1);
    assert_eq!(stats.duplicates, 1);
    assert!(store.candidate(second_id).is_none(), "duplicates are never persisted");
}

#[tokio::test]
async fn warmed_cache_catches_duplicates_across_runs() {
    let store = Arc::new(InMemoryStore::new());
    let config = PipelineConfig::default();
    let now = Utc::now();
    let discovery = MockDiscovery::new().on_topic(SCENARIO_A_TITLE, scenario_a_sources());

    let first_run = Pipeline::new(store.clone(), &config);
    first_run
        .process_batch(vec![scenario_a_candidate(now)], &discovery, now)
        .await;

    let later = now + Duration::hours(3);
    let second_run = Pipeline::new(store.clone(), &config);
    assert_eq!(second_run.warm(later).await.unwrap(), 1);
    let stats = second_run
        .process_batch(vec![scenario_a_candidate(later)], &discovery, later)
        .await;

    assert_eq!(stats.duplicates, 1);
    assert_eq!(store.topic_count(), 1);
}

#[tokio::test]
async fn entries_outside_the_window_no_longer_match() {
    let (_, pipeline) = pipeline();
    let then = Utc::now();
    let old = candidate("Port Workers Reject Contract Offer", "https://a.example/1", then);
    pipeline
        .process_batch(vec![old], &MockDiscovery::new(), then)
        .await;

    let later = then + Duration::days(8);
    let again = candidate("Port Workers Reject Contract Offer", "https://a.example/1", later);
    let stats = pipeline
        .process_batch(vec![again], &MockDiscovery::new(), later)
        .await;
    assert_eq!(stats.admitted, 1);
    assert_eq!(stats.duplicates, 0);
}

#[tokio::test]
async fn discovery_failure_is_isolated_and_retryable() {
    let (store, pipeline) = pipeline();
    let now = Utc::now();
    let other = candidate("City Council Renames Park", "https://a.example/park", now);

    let stats = pipeline
        .process_batch(
            vec![scenario_a_candidate(now), other],
            &MockDiscovery::new(),
            now,
        )
        .await;
    assert_eq!(stats.failed, 1, "{stats}");
    assert_eq!(stats.admitted, 2, "sibling still processed");
    assert_eq!(stats.errors, 0);

    let failed = store
        .topics_with_status(VerificationStatus::Failed)
        .await
        .unwrap();
    assert_eq!(failed.len(), 1);

    let discovery = MockDiscovery::new().on_topic(SCENARIO_A_TITLE, scenario_a_sources());
    let retry = pipeline
        .retry_failed_verifications(&discovery, now)
        .await
        .unwrap();
    assert_eq!(retry.verified, 1);
    assert!(store
        .topics_with_status(VerificationStatus::Failed)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn promotion_is_idempotent_per_candidate() {
    let (store, pipeline) = pipeline();
    let now = Utc::now();
    let discovery = MockDiscovery::new().on_topic(SCENARIO_A_TITLE, scenario_a_sources());
    let strike = scenario_a_candidate(now);
    let id = strike.id;
    pipeline.process_batch(vec![strike], &discovery, now).await;

    let first = store.candidate(id).unwrap().topic_id.unwrap();
    let existing = store.topic(first).await.unwrap().unwrap();
    let mut again = existing.clone();
    again.id = uuid::Uuid::new_v4();

    let returned = store.promote_topic(&again).await.unwrap();
    assert_eq!(returned.id, first);
    assert_eq!(store.topic_count(), 1);
}

#[tokio::test]
async fn evaluated_candidates_are_frozen() {
    let (store, pipeline) = pipeline();
    let now = Utc::now();
    let discovery = MockDiscovery::new().on_topic(SCENARIO_A_TITLE, scenario_a_sources());
    let strike = scenario_a_candidate(now);
    let approved_id = strike.id;
    pipeline.process_batch(vec![strike], &discovery, now).await;

    let approved = store.candidate(approved_id).unwrap();
    assert_eq!(approved.status, CandidateStatus::Approved);
    let rewrite = store
        .record_evaluation(
            approved_id,
            &approved.dimensions.unwrap(),
            10.0,
            CandidateStatus::Rejected,
            Some("second thoughts"),
        )
        .await;
    assert!(rewrite.is_err());
    assert_eq!(store.candidate(approved_id).unwrap(), approved);

    let filler = candidate("City Council Renames Park", "https://a.example/park", now);
    let rejected_id = filler.id;
    store.save_candidate(&filler).await.unwrap();
    store
        .record_evaluation(
            rejected_id,
            &DimensionScores::default(),
            12.0,
            CandidateStatus::Rejected,
            Some("No labor angle"),
        )
        .await
        .unwrap();
    let rewrite = store
        .record_evaluation(
            rejected_id,
            &DimensionScores::default(),
            99.0,
            CandidateStatus::Approved,
            None,
        )
        .await;
    assert!(rewrite.is_err());
    assert_eq!(store.candidate(rejected_id).unwrap().composite_score, Some(12.0));
}

#[tokio::test]
async fn failed_promotion_leaves_candidate_resumable() {
    let (store, pipeline) = pipeline();
    let now = Utc::now();
    let discovery = MockDiscovery::new().on_topic(SCENARIO_A_TITLE, scenario_a_sources());
    let strike = scenario_a_candidate(now);
    let id = strike.id;

    store.fail_next("promote_topic");
    let stats = pipeline.process_batch(vec![strike], &discovery, now).await;

    assert_eq!(stats.errors, 1, "{stats}");
    assert_eq!(stats.approved, 0);
    let stranded = store.candidate(id).unwrap();
    assert_eq!(stranded.status, CandidateStatus::Discovered);
    assert!(stranded.topic_id.is_none());
    assert_eq!(store.topic_count(), 0);

    let desk = EditorialDesk::new(store.clone(), &PipelineConfig::default());
    assert_eq!(desk.queues(now).await.unwrap().stranded_candidates, vec![id]);

    let resumed = pipeline.resume(&discovery, now).await.unwrap();
    assert_eq!(resumed.approved, 1, "{resumed}");
    assert_eq!(resumed.verified, 1);
    let stored = store.candidate(id).unwrap();
    assert_eq!(stored.status, CandidateStatus::Approved);
    assert!(stored.topic_id.is_some());
    assert!(desk.queues(now).await.unwrap().stranded_candidates.is_empty());
}

#[tokio::test]
async fn store_error_during_verification_marks_topic_failed() {
    let (store, pipeline) = pipeline();
    let now = Utc::now();
    let discovery = MockDiscovery::new().on_topic(SCENARIO_A_TITLE, scenario_a_sources());

    store.fail_next("source_by_key");
    let stats = pipeline
        .process_batch(vec![scenario_a_candidate(now)], &discovery, now)
        .await;

    assert_eq!(stats.failed, 1, "{stats}");
    assert_eq!(stats.errors, 0);
    let failed = store
        .topics_with_status(VerificationStatus::Failed)
        .await
        .unwrap();
    assert_eq!(failed.len(), 1);
    let note = failed[0].verification_note.as_deref().unwrap();
    assert!(note.starts_with("Verification failed"), "{note}");
    assert!(store
        .topics_with_status(VerificationStatus::Pending)
        .await
        .unwrap()
        .is_empty());

    let retry = pipeline
        .retry_failed_verifications(&discovery, now)
        .await
        .unwrap();
    assert_eq!(retry.verified, 1, "{retry}");
}

#[tokio::test]
async fn retried_verification_does_not_recount_citations() {
    let (store, pipeline) = pipeline();
    let now = Utc::now();
    let mut sources = scenario_a_sources();
    sources.push(cited(
        "https://www.reuters.com/world/us/amazon-strike-day-two",
        &["More than 3,000 workers walked off the job Monday at the Staten Island warehouse."],
    ));
    let discovery = MockDiscovery::new().on_topic(SCENARIO_A_TITLE, sources);

    // Citations land, then persisting the verified topic fails.
    store.fail_next("record_verification");
    let stats = pipeline
        .process_batch(vec![scenario_a_candidate(now)], &discovery, now)
        .await;
    assert_eq!(stats.failed, 1, "{stats}");

    let retry = pipeline.resume(&discovery, now).await.unwrap();
    assert_eq!(retry.verified, 1, "{retry}");

    let reuters = store.source_by_key("reuters.com").await.unwrap().unwrap();
    assert_eq!(reuters.citation_count, 1, "two URLs and two attempts, one topic");
}

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 0.01, "expected {expected}, got {actual}");
}
