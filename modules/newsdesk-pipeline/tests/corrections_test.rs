//! Corrections on published articles and their effect on source reliability.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use newsdesk_common::{
    CorrectionSeverity, CorrectionStatus, CorrectionType, PipelineConfig, ReliabilityDeltas,
    ReliabilityEvent, SourceTier,
};
use newsdesk_pipeline::corrections::{CorrectionDesk, CorrectionReport};
use newsdesk_pipeline::editorial::{EditorialDesk, EditorialError};
use newsdesk_pipeline::store::{InMemoryStore, PipelineStore};
use newsdesk_pipeline::testing::{planned, seed_verified_topic, specialist, SCENARIO_A_TITLE};

struct Newsroom {
    store: Arc<InMemoryStore>,
    desk: EditorialDesk,
    corrections: CorrectionDesk,
}

impl Newsroom {
    fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let desk = EditorialDesk::new(store.clone(), &PipelineConfig::default());
        let corrections = CorrectionDesk::new(store.clone(), ReliabilityDeltas::default());
        Self {
            store,
            desk,
            corrections,
        }
    }

    /// A published article whose topic planned reuters, apnews and osha.gov.
    async fn published_article(&self) -> Uuid {
        let now = Utc::now();
        self.store
            .upsert_editor(&specialist("Xavier", &["labor_action"], 0))
            .await
            .unwrap();
        let topic = seed_verified_topic(
            self.store.as_ref(),
            SCENARIO_A_TITLE,
            "labor_action",
            vec![
                planned("https://www.osha.gov/news/1"),
                planned("https://www.reuters.com/a"),
                planned("https://apnews.com/b"),
            ],
            now,
        )
        .await
        .unwrap();
        let draft = self
            .desk
            .submit_draft(topic.id, "3,000 workers walked out.", true, now)
            .await
            .unwrap();
        self.desk.assign(draft.id, now).await.unwrap();
        self.desk.approve(draft.id, "dana", now).await.unwrap();
        self.desk.publish(draft.id, "dana", now).await.unwrap();
        draft.id
    }
}

fn report(correction_type: CorrectionType, severity: CorrectionSeverity) -> CorrectionReport {
    CorrectionReport::builder()
        .correction_type(correction_type)
        .severity(severity)
        .original_text("3,000 workers walked out.")
        .corrected_text("2,000 workers walked out.")
        .public_notice("An earlier version overstated the number of strikers.")
        .reported_by("reader desk")
        .build()
}

#[tokio::test]
async fn published_correction_records_revision_and_penalizes_sources() {
    let room = Newsroom::new();
    let now = Utc::now();
    let article_id = room.published_article().await;
    let revisions_before = room.store.revisions(article_id).await.unwrap().len();

    let filed = room
        .corrections
        .report_correction(
            article_id,
            report(CorrectionType::FactualError, CorrectionSeverity::Major),
            now,
        )
        .await
        .unwrap();
    assert_eq!(filed.status, CorrectionStatus::Pending);

    room.corrections
        .verify_correction(filed.id, "standards")
        .await
        .unwrap();
    let published = room
        .corrections
        .publish_correction(filed.id, "standards", now)
        .await
        .unwrap();

    assert_eq!(published.correction.status, CorrectionStatus::Published);
    let revision = published.revision.unwrap();
    assert_eq!(revision.before.as_deref(), Some("3,000 workers walked out."));
    assert_eq!(revision.after.as_deref(), Some("2,000 workers walked out."));
    assert_eq!(
        room.store.revisions(article_id).await.unwrap().len(),
        revisions_before + 1
    );

    let mut scores = published.reliability.clone();
    scores.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        scores,
        vec![
            ("apnews.com".to_string(), 75.0),
            ("osha.gov".to_string(), 85.0),
            ("reuters.com".to_string(), 75.0),
        ]
    );

    let osha = room.store.source_by_key("osha.gov").await.unwrap().unwrap();
    assert_eq!(osha.tier, SourceTier::Tier1);
    let log = room.store.reliability_log(osha.id).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].event, ReliabilityEvent::CorrectionIssued);
    assert_eq!(log[0].correction_id, Some(filed.id));

    let kinds: Vec<&str> = room
        .store
        .all_events()
        .iter()
        .map(|e| e.event.kind())
        .collect();
    assert_eq!(kinds.last(), Some(&"correction_published"));
}

#[tokio::test]
async fn retraction_hits_tier_one_by_thirty() {
    let room = Newsroom::new();
    let now = Utc::now();
    let article_id = room.published_article().await;
    let filed = room
        .corrections
        .report_correction(
            article_id,
            report(CorrectionType::Retraction, CorrectionSeverity::Critical),
            now,
        )
        .await
        .unwrap();
    room.corrections
        .verify_correction(filed.id, "standards")
        .await
        .unwrap();
    room.corrections
        .publish_correction(filed.id, "standards", now)
        .await
        .unwrap();

    let osha = room.store.source_by_key("osha.gov").await.unwrap().unwrap();
    assert_eq!(osha.credibility_score, 65.0);
}

#[tokio::test]
async fn clarifications_leave_scores_alone() {
    let room = Newsroom::new();
    let now = Utc::now();
    let article_id = room.published_article().await;
    let filed = room
        .corrections
        .report_correction(
            article_id,
            report(CorrectionType::Clarification, CorrectionSeverity::Minor),
            now,
        )
        .await
        .unwrap();
    room.corrections
        .verify_correction(filed.id, "standards")
        .await
        .unwrap();
    let published = room
        .corrections
        .publish_correction(filed.id, "standards", now)
        .await
        .unwrap();

    assert!(published.reliability.is_empty());
    let reuters = room.store.source_by_key("reuters.com").await.unwrap().unwrap();
    assert_eq!(reuters.credibility_score, 85.0);
}

#[tokio::test]
async fn published_corrections_are_immutable() {
    let room = Newsroom::new();
    let now = Utc::now();
    let article_id = room.published_article().await;
    let filed = room
        .corrections
        .report_correction(
            article_id,
            report(CorrectionType::FactualError, CorrectionSeverity::Minor),
            now,
        )
        .await
        .unwrap();

    assert!(matches!(
        room.corrections
            .publish_correction(filed.id, "standards", now)
            .await,
        Err(EditorialError::IllegalCorrectionTransition { .. })
    ));

    room.corrections
        .verify_correction(filed.id, "standards")
        .await
        .unwrap();
    room.corrections
        .publish_correction(filed.id, "standards", now)
        .await
        .unwrap();

    for attempt in [
        room.corrections.reject_correction(filed.id, "standards").await,
        room.corrections.verify_correction(filed.id, "standards").await,
    ] {
        assert!(matches!(attempt, Err(EditorialError::ImmutableCorrection(_))));
    }
    assert!(matches!(
        room.corrections
            .publish_correction(filed.id, "standards", now)
            .await,
        Err(EditorialError::ImmutableCorrection(_))
    ));
}

#[tokio::test]
async fn corrections_need_a_published_article() {
    let room = Newsroom::new();
    let now = Utc::now();
    let topic = seed_verified_topic(
        room.store.as_ref(),
        SCENARIO_A_TITLE,
        "labor_action",
        Vec::new(),
        now,
    )
    .await
    .unwrap();
    let draft = room
        .desk
        .submit_draft(topic.id, "body", true, now)
        .await
        .unwrap();

    let result = room
        .corrections
        .report_correction(
            draft.id,
            report(CorrectionType::Update, CorrectionSeverity::Minor),
            now,
        )
        .await;
    assert!(matches!(result, Err(EditorialError::NotPublished(_))));
}
