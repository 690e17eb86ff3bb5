use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use newsdesk_common::{
    Article, ArticleRevision, ArticleStatus, CandidateStatus, Correction, CorrectionStatus,
    DimensionScores, EditorialEvent, Editor, EventCandidate, OutboxEvent, RegionalClassification,
    ReliabilityEvent, Source, SourceKind, SourcePlan, SourceReliabilityLogEntry, SourceTier, Topic,
    VerificationStatus, VerifiedFact,
};

use super::{
    outbox_entries, CommitOutcome, CorrectionCommit, NewRevision, PipelineStore, TransitionCommit,
};

const CANDIDATE_COLUMNS: &str = "id, title, description, source_url, discovered_from, \
    discovered_at, event_at, dimensions, composite_score, status, status_reason, topic_id";

const TOPIC_COLUMNS: &str = "id, candidate_id, title, description, category, regional, \
    dimensions, composite_score, verification_status, verified_facts, source_plan, \
    verification_note, created_at, verified_at";

const SOURCE_COLUMNS: &str =
    "id, key, name, kind, tier, credibility_score, citation_count, created_at, updated_at";

const ARTICLE_COLUMNS: &str = "id, topic_id, title, category, body, status, assigned_editor, \
    review_deadline, editorial_notes, revision_count, quality_gate_passed, approved_by, \
    archived_reason, published_at, created_at, updated_at";

const CORRECTION_COLUMNS: &str = "id, article_id, correction_type, severity, original_text, \
    corrected_text, public_notice, status, reported_by, reviewed_by, created_at, published_at";

/// Postgres-backed store. Every multi-row write runs in one transaction.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply the embedded schema migrations. Idempotent.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Pipeline schema migrations applied");
        Ok(())
    }

    async fn insert_revision(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        article_id: Uuid,
        revision: NewRevision,
    ) -> Result<ArticleRevision> {
        let next: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(revision_number), 0) + 1 FROM article_revisions WHERE article_id = $1",
        )
        .bind(article_id)
        .fetch_one(&mut **tx)
        .await?;

        let revision = revision.numbered(article_id, next as u32);
        sqlx::query(
            "INSERT INTO article_revisions
                (id, article_id, revision_number, actor, before_text, after_text, change_reason, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(revision.id)
        .bind(revision.article_id)
        .bind(revision.revision_number as i32)
        .bind(&revision.actor)
        .bind(&revision.before)
        .bind(&revision.after)
        .bind(&revision.change_reason)
        .bind(revision.created_at)
        .execute(&mut **tx)
        .await?;
        Ok(revision)
    }

    async fn insert_events(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        events: Vec<EditorialEvent>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        for entry in outbox_entries(events, at) {
            sqlx::query(
                "INSERT INTO editorial_outbox (id, event_type, article_id, payload, created_at)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(entry.id)
            .bind(entry.event.kind())
            .bind(entry.event.article_id())
            .bind(Json(&entry.event))
            .bind(entry.created_at)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn candidate_from_row(row: &PgRow) -> Result<EventCandidate> {
    Ok(EventCandidate {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        source_url: row.try_get("source_url")?,
        discovered_from: row.try_get("discovered_from")?,
        discovered_at: row.try_get("discovered_at")?,
        event_at: row.try_get("event_at")?,
        dimensions: row
            .try_get::<Option<Json<DimensionScores>>, _>("dimensions")?
            .map(|j| j.0),
        composite_score: row.try_get("composite_score")?,
        status: row.try_get::<String, _>("status")?.parse()?,
        status_reason: row.try_get("status_reason")?,
        topic_id: row.try_get("topic_id")?,
    })
}

fn topic_from_row(row: &PgRow) -> Result<Topic> {
    Ok(Topic {
        id: row.try_get("id")?,
        candidate_id: row.try_get("candidate_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        regional: row.try_get::<Json<RegionalClassification>, _>("regional")?.0,
        dimensions: row.try_get::<Json<DimensionScores>, _>("dimensions")?.0,
        composite_score: row.try_get("composite_score")?,
        verification_status: row.try_get::<String, _>("verification_status")?.parse()?,
        verified_facts: row.try_get::<Json<Vec<VerifiedFact>>, _>("verified_facts")?.0,
        source_plan: row
            .try_get::<Option<Json<SourcePlan>>, _>("source_plan")?
            .map(|j| j.0),
        verification_note: row.try_get("verification_note")?,
        created_at: row.try_get("created_at")?,
        verified_at: row.try_get("verified_at")?,
    })
}

fn source_from_row(row: &PgRow) -> Result<Source> {
    let level: i16 = row.try_get("tier")?;
    Ok(Source {
        id: row.try_get("id")?,
        key: row.try_get("key")?,
        name: row.try_get("name")?,
        kind: row.try_get::<String, _>("kind")?.parse()?,
        tier: SourceTier::from_level(level as u8)
            .ok_or_else(|| anyhow!("Invalid source tier: {level}"))?,
        credibility_score: row.try_get("credibility_score")?,
        citation_count: row.try_get::<i32, _>("citation_count")? as u32,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn log_entry_from_row(row: &PgRow) -> Result<SourceReliabilityLogEntry> {
    Ok(SourceReliabilityLogEntry {
        id: row.try_get("id")?,
        source_id: row.try_get("source_id")?,
        event: row.try_get::<String, _>("event")?.parse()?,
        delta: row.try_get("delta")?,
        resulting_score: row.try_get("resulting_score")?,
        article_id: row.try_get("article_id")?,
        correction_id: row.try_get("correction_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn editor_from_row(row: &PgRow) -> Result<Editor> {
    Ok(Editor {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        specializations: row.try_get("specializations")?,
        general: row.try_get("general")?,
        active: row.try_get("active")?,
        open_workload: row.try_get::<i32, _>("open_workload")?.max(0) as u32,
    })
}

fn article_from_row(row: &PgRow) -> Result<Article> {
    Ok(Article {
        id: row.try_get("id")?,
        topic_id: row.try_get("topic_id")?,
        title: row.try_get("title")?,
        category: row.try_get("category")?,
        body: row.try_get("body")?,
        status: row.try_get::<String, _>("status")?.parse()?,
        assigned_editor: row.try_get("assigned_editor")?,
        review_deadline: row.try_get("review_deadline")?,
        editorial_notes: row.try_get("editorial_notes")?,
        revision_count: row.try_get::<i32, _>("revision_count")?.max(0) as u32,
        quality_gate_passed: row.try_get("quality_gate_passed")?,
        approved_by: row.try_get("approved_by")?,
        archived_reason: row.try_get("archived_reason")?,
        published_at: row.try_get("published_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn revision_from_row(row: &PgRow) -> Result<ArticleRevision> {
    Ok(ArticleRevision {
        id: row.try_get("id")?,
        article_id: row.try_get("article_id")?,
        revision_number: row.try_get::<i32, _>("revision_number")? as u32,
        actor: row.try_get("actor")?,
        before: row.try_get("before_text")?,
        after: row.try_get("after_text")?,
        change_reason: row.try_get("change_reason")?,
        created_at: row.try_get("created_at")?,
    })
}

fn correction_from_row(row: &PgRow) -> Result<Correction> {
    Ok(Correction {
        id: row.try_get("id")?,
        article_id: row.try_get("article_id")?,
        correction_type: row.try_get::<String, _>("correction_type")?.parse()?,
        severity: row.try_get::<String, _>("severity")?.parse()?,
        original_text: row.try_get("original_text")?,
        corrected_text: row.try_get("corrected_text")?,
        public_notice: row.try_get("public_notice")?,
        status: row.try_get::<String, _>("status")?.parse()?,
        reported_by: row.try_get("reported_by")?,
        reviewed_by: row.try_get("reviewed_by")?,
        created_at: row.try_get("created_at")?,
        published_at: row.try_get("published_at")?,
    })
}

fn outbox_from_row(row: &PgRow) -> Result<OutboxEvent> {
    Ok(OutboxEvent {
        id: row.try_get("id")?,
        event: row.try_get::<Json<EditorialEvent>, _>("payload")?.0,
        created_at: row.try_get("created_at")?,
        dispatched_at: row.try_get("dispatched_at")?,
    })
}

// ---------------------------------------------------------------------------
// PipelineStore
// ---------------------------------------------------------------------------

#[async_trait]
impl PipelineStore for PgStore {
    async fn candidates_since(&self, since: DateTime<Utc>) -> Result<Vec<EventCandidate>> {
        let sql = format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE discovered_at >= $1 ORDER BY discovered_at, id"
        );
        let rows = sqlx::query(&sql).bind(since).fetch_all(&self.pool).await?;
        rows.iter().map(candidate_from_row).collect()
    }

    async fn approved_titles_since(&self, since: DateTime<Utc>) -> Result<Vec<String>> {
        let titles = sqlx::query_scalar::<_, String>(
            "SELECT title FROM candidates
             WHERE status = 'approved' AND discovered_at >= $1
             ORDER BY discovered_at, id",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(titles)
    }

    async fn save_candidate(&self, c: &EventCandidate) -> Result<()> {
        sqlx::query(
            "INSERT INTO candidates
                (id, title, description, source_url, discovered_from, discovered_at, event_at,
                 dimensions, composite_score, status, status_reason, topic_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(c.id)
        .bind(&c.title)
        .bind(&c.description)
        .bind(&c.source_url)
        .bind(&c.discovered_from)
        .bind(c.discovered_at)
        .bind(c.event_at)
        .bind(c.dimensions.map(Json))
        .bind(c.composite_score)
        .bind(c.status.as_str())
        .bind(&c.status_reason)
        .bind(c.topic_id)
        .execute(&self.pool)
        .await?;
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
        let result = sqlx::query(
            "UPDATE candidates
             SET dimensions = $2, composite_score = $3, status = $4, status_reason = $5
             WHERE id = $1 AND status NOT IN ('approved', 'rejected')",
        )
        .bind(candidate_id)
        .bind(Json(dimensions))
        .bind(composite)
        .bind(status.as_str())
        .bind(reason)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            bail!("Candidate {candidate_id} is missing or already final");
        }
        Ok(())
    }

    async fn candidates_with_status(&self, status: CandidateStatus) -> Result<Vec<EventCandidate>> {
        let sql = format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE status = $1 ORDER BY discovered_at, id"
        );
        let rows = sqlx::query(&sql)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(candidate_from_row).collect()
    }

    async fn promote_topic(&self, t: &Topic) -> Result<Topic> {
        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query(
            "INSERT INTO topics
                (id, candidate_id, title, description, category, regional, dimensions,
                 composite_score, verification_status, verified_facts, source_plan,
                 verification_note, created_at, verified_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             ON CONFLICT (candidate_id) DO NOTHING",
        )
        .bind(t.id)
        .bind(t.candidate_id)
        .bind(&t.title)
        .bind(&t.description)
        .bind(&t.category)
        .bind(Json(&t.regional))
        .bind(Json(&t.dimensions))
        .bind(t.composite_score)
        .bind(t.verification_status.as_str())
        .bind(Json(&t.verified_facts))
        .bind(t.source_plan.as_ref().map(Json))
        .bind(&t.verification_note)
        .bind(t.created_at)
        .bind(t.verified_at)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            let sql = format!("SELECT {TOPIC_COLUMNS} FROM topics WHERE candidate_id = $1");
            let row = sqlx::query(&sql)
                .bind(t.candidate_id)
                .fetch_one(&mut *tx)
                .await?;
            tx.rollback().await?;
            return topic_from_row(&row);
        }

        let approved = sqlx::query(
            "UPDATE candidates
             SET dimensions = $3, composite_score = $4, status = 'approved',
                 status_reason = NULL, topic_id = $2
             WHERE id = $1 AND status NOT IN ('approved', 'rejected')",
        )
        .bind(t.candidate_id)
        .bind(t.id)
        .bind(Json(&t.dimensions))
        .bind(t.composite_score)
        .execute(&mut *tx)
        .await?;
        if approved.rows_affected() == 0 {
            tx.rollback().await?;
            bail!("Candidate {} is missing or already final", t.candidate_id);
        }
        tx.commit().await?;
        Ok(t.clone())
    }

    async fn topic(&self, id: Uuid) -> Result<Option<Topic>> {
        let sql = format!("SELECT {TOPIC_COLUMNS} FROM topics WHERE id = $1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(topic_from_row).transpose()
    }

    async fn record_verification(&self, t: &Topic) -> Result<()> {
        let result = sqlx::query(
            "UPDATE topics
             SET verification_status = $2, verified_facts = $3, source_plan = $4,
                 verification_note = $5, verified_at = $6
             WHERE id = $1",
        )
        .bind(t.id)
        .bind(t.verification_status.as_str())
        .bind(Json(&t.verified_facts))
        .bind(t.source_plan.as_ref().map(Json))
        .bind(&t.verification_note)
        .bind(t.verified_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            bail!("Topic {} not found", t.id);
        }
        Ok(())
    }

    async fn topics_with_status(&self, status: VerificationStatus) -> Result<Vec<Topic>> {
        let sql = format!(
            "SELECT {TOPIC_COLUMNS} FROM topics WHERE verification_status = $1 ORDER BY created_at, id"
        );
        let rows = sqlx::query(&sql)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(topic_from_row).collect()
    }

    async fn source_by_key(&self, key: &str) -> Result<Option<Source>> {
        let sql = format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE key = $1");
        let row = sqlx::query(&sql).bind(key).fetch_optional(&self.pool).await?;
        row.as_ref().map(source_from_row).transpose()
    }

    async fn upsert_cited_source(
        &self,
        topic_id: Uuid,
        key: &str,
        name: &str,
        kind: SourceKind,
        at: DateTime<Utc>,
    ) -> Result<Source> {
        let fresh = Source::first_citation(key, name, kind, at);
        let mut tx = self.pool.begin().await?;
        let source_id: Uuid = sqlx::query_scalar(
            "INSERT INTO sources
                (id, key, name, kind, tier, credibility_score, citation_count, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, 0, $7, $7)
             ON CONFLICT (key) DO UPDATE SET key = EXCLUDED.key
             RETURNING id",
        )
        .bind(fresh.id)
        .bind(&fresh.key)
        .bind(&fresh.name)
        .bind(fresh.kind.as_str())
        .bind(fresh.tier.level() as i16)
        .bind(fresh.credibility_score)
        .bind(at)
        .fetch_one(&mut *tx)
        .await?;

        let cited = sqlx::query(
            "INSERT INTO source_citations (source_id, topic_id, cited_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (source_id, topic_id) DO NOTHING",
        )
        .bind(source_id)
        .bind(topic_id)
        .bind(at)
        .execute(&mut *tx)
        .await?;
        if cited.rows_affected() > 0 {
            sqlx::query(
                "UPDATE sources SET citation_count = citation_count + 1, updated_at = $2
                 WHERE id = $1",
            )
            .bind(source_id)
            .bind(at)
            .execute(&mut *tx)
            .await?;
        }

        let sql = format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE id = $1");
        let row = sqlx::query(&sql).bind(source_id).fetch_one(&mut *tx).await?;
        tx.commit().await?;
        source_from_row(&row)
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
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_as::<_, (Uuid, f64)>(
            "UPDATE sources
             SET credibility_score = LEAST(100.0, GREATEST(0.0, credibility_score + $2)),
                 updated_at = $3
             WHERE key = $1
             RETURNING id, credibility_score",
        )
        .bind(key)
        .bind(delta)
        .bind(at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((source_id, resulting_score)) = updated else {
            tx.rollback().await?;
            return Ok(None);
        };

        let entry = SourceReliabilityLogEntry {
            id: Uuid::new_v4(),
            source_id,
            event,
            delta,
            resulting_score,
            article_id,
            correction_id,
            created_at: at,
        };
        sqlx::query(
            "INSERT INTO source_reliability_log
                (id, source_id, event, delta, resulting_score, article_id, correction_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(entry.id)
        .bind(entry.source_id)
        .bind(entry.event.as_str())
        .bind(entry.delta)
        .bind(entry.resulting_score)
        .bind(entry.article_id)
        .bind(entry.correction_id)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(entry))
    }

    async fn reliability_log(&self, source_id: Uuid) -> Result<Vec<SourceReliabilityLogEntry>> {
        let rows = sqlx::query(
            "SELECT id, source_id, event, delta, resulting_score, article_id, correction_id, created_at
             FROM source_reliability_log
             WHERE source_id = $1
             ORDER BY created_at, id",
        )
        .bind(source_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(log_entry_from_row).collect()
    }

    async fn upsert_editor(&self, e: &Editor) -> Result<()> {
        sqlx::query(
            "INSERT INTO editors (id, name, specializations, general, active, open_workload)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE
             SET name = EXCLUDED.name, specializations = EXCLUDED.specializations,
                 general = EXCLUDED.general, active = EXCLUDED.active",
        )
        .bind(e.id)
        .bind(&e.name)
        .bind(&e.specializations)
        .bind(e.general)
        .bind(e.active)
        .bind(e.open_workload as i32)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn editors(&self) -> Result<Vec<Editor>> {
        let rows = sqlx::query(
            "SELECT id, name, specializations, general, active, open_workload
             FROM editors ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(editor_from_row).collect()
    }

    async fn insert_article(&self, a: &Article) -> Result<()> {
        sqlx::query(
            "INSERT INTO articles
                (id, topic_id, title, category, body, status, assigned_editor, review_deadline,
                 editorial_notes, revision_count, quality_gate_passed, approved_by,
                 archived_reason, published_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(a.id)
        .bind(a.topic_id)
        .bind(&a.title)
        .bind(&a.category)
        .bind(&a.body)
        .bind(a.status.as_str())
        .bind(a.assigned_editor)
        .bind(a.review_deadline)
        .bind(&a.editorial_notes)
        .bind(a.revision_count as i32)
        .bind(a.quality_gate_passed)
        .bind(&a.approved_by)
        .bind(&a.archived_reason)
        .bind(a.published_at)
        .bind(a.created_at)
        .bind(a.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn article(&self, id: Uuid) -> Result<Option<Article>> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(article_from_row).transpose()
    }

    async fn articles_with_status(&self, statuses: &[ArticleStatus]) -> Result<Vec<Article>> {
        let wanted: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE status = ANY($1) ORDER BY created_at, id"
        );
        let rows = sqlx::query(&sql).bind(&wanted).fetch_all(&self.pool).await?;
        rows.iter().map(article_from_row).collect()
    }

    async fn overdue_articles(&self, now: DateTime<Utc>) -> Result<Vec<Article>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles
             WHERE status = 'under_review' AND review_deadline < $1
             ORDER BY review_deadline, id"
        );
        let rows = sqlx::query(&sql).bind(now).fetch_all(&self.pool).await?;
        rows.iter().map(article_from_row).collect()
    }

    async fn revisions(&self, article_id: Uuid) -> Result<Vec<ArticleRevision>> {
        let rows = sqlx::query(
            "SELECT id, article_id, revision_number, actor, before_text, after_text, change_reason, created_at
             FROM article_revisions
             WHERE article_id = $1
             ORDER BY revision_number",
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(revision_from_row).collect()
    }

    async fn commit_transition(
        &self,
        commit: TransitionCommit,
    ) -> Result<CommitOutcome<ArticleStatus>> {
        let a = &commit.article;
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE articles
             SET status = $3, assigned_editor = $4, review_deadline = $5, editorial_notes = $6,
                 revision_count = $7, approved_by = $8, archived_reason = $9, published_at = $10,
                 body = $11, updated_at = $12
             WHERE id = $1 AND status = $2",
        )
        .bind(a.id)
        .bind(commit.expected_status.as_str())
        .bind(a.status.as_str())
        .bind(a.assigned_editor)
        .bind(a.review_deadline)
        .bind(&a.editorial_notes)
        .bind(a.revision_count as i32)
        .bind(&a.approved_by)
        .bind(&a.archived_reason)
        .bind(a.published_at)
        .bind(&a.body)
        .bind(a.updated_at)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let actual = sqlx::query_scalar::<_, String>("SELECT status FROM articles WHERE id = $1")
                .bind(a.id)
                .fetch_optional(&mut *tx)
                .await?;
            tx.rollback().await?;
            return Ok(CommitOutcome::Conflict {
                actual: actual.map(|s| s.parse()).transpose()?,
            });
        }

        let article_id = a.id;
        let at = a.updated_at;
        let revision = match commit.revision {
            Some(r) => Some(Self::insert_revision(&mut tx, article_id, r).await?),
            None => None,
        };
        for change in &commit.workload {
            sqlx::query(
                "UPDATE editors SET open_workload = GREATEST(0, open_workload + $2) WHERE id = $1",
            )
            .bind(change.editor_id)
            .bind(change.delta)
            .execute(&mut *tx)
            .await?;
        }
        Self::insert_events(&mut tx, commit.events, at).await?;
        tx.commit().await?;
        Ok(CommitOutcome::Committed { revision })
    }

    async fn insert_correction(&self, c: &Correction) -> Result<()> {
        sqlx::query(
            "INSERT INTO corrections
                (id, article_id, correction_type, severity, original_text, corrected_text,
                 public_notice, status, reported_by, reviewed_by, created_at, published_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(c.id)
        .bind(c.article_id)
        .bind(c.correction_type.as_str())
        .bind(c.severity.as_str())
        .bind(&c.original_text)
        .bind(&c.corrected_text)
        .bind(&c.public_notice)
        .bind(c.status.as_str())
        .bind(&c.reported_by)
        .bind(&c.reviewed_by)
        .bind(c.created_at)
        .bind(c.published_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn correction(&self, id: Uuid) -> Result<Option<Correction>> {
        let sql = format!("SELECT {CORRECTION_COLUMNS} FROM corrections WHERE id = $1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(correction_from_row).transpose()
    }

    async fn commit_correction(
        &self,
        commit: CorrectionCommit,
    ) -> Result<CommitOutcome<CorrectionStatus>> {
        let c = &commit.correction;
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE corrections
             SET status = $3, reviewed_by = $4, published_at = $5
             WHERE id = $1 AND status = $2",
        )
        .bind(c.id)
        .bind(commit.expected_status.as_str())
        .bind(c.status.as_str())
        .bind(&c.reviewed_by)
        .bind(c.published_at)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let actual =
                sqlx::query_scalar::<_, String>("SELECT status FROM corrections WHERE id = $1")
                    .bind(c.id)
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await?;
            return Ok(CommitOutcome::Conflict {
                actual: actual.map(|s| s.parse()).transpose()?,
            });
        }

        let article_id = c.article_id;
        let at = c.published_at.unwrap_or(c.created_at);
        let revision = match commit.revision {
            Some(r) => Some(Self::insert_revision(&mut tx, article_id, r).await?),
            None => None,
        };
        Self::insert_events(&mut tx, commit.events, at).await?;
        tx.commit().await?;
        Ok(CommitOutcome::Committed { revision })
    }

    async fn pending_events(&self, limit: usize) -> Result<Vec<OutboxEvent>> {
        let rows = sqlx::query(
            "SELECT id, payload, created_at, dispatched_at
             FROM editorial_outbox
             WHERE dispatched_at IS NULL
             ORDER BY created_at, id
             LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(outbox_from_row).collect()
    }

    async fn mark_dispatched(&self, ids: &[Uuid], at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "UPDATE editorial_outbox SET dispatched_at = $2
             WHERE id = ANY($1) AND dispatched_at IS NULL",
        )
        .bind(ids)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
