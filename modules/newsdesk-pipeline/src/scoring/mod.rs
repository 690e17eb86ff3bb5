//! Newsworthiness scoring: six weighted dimensions, a 0-100 composite, and an
//! approve / hold / reject decision.

pub mod classify;
pub mod dimensions;
pub mod keywords;

use chrono::{DateTime, Utc};
use newsdesk_common::{
    DimensionScores, Decision, EventCandidate, PipelineConfig, Thresholds, Topic,
    VerificationStatus, Weights,
};
use uuid::Uuid;

/// Read-only context shared by every candidate in a batch.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub now: DateTime<Utc>,
    /// Titles approved in the trailing window, oldest first.
    pub recent_approved_titles: &'a [String],
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    pub dimensions: DimensionScores,
    pub composite: f64,
    pub decision: Decision,
    pub reason: Option<String>,
}

/// Composite precision. Thresholds compare against the rounded value.
const COMPOSITE_PRECISION: f64 = 10_000.0;

/// Composite = Σ(dimension × weight) × 10, clamped to [0, 100] and rounded to
/// four decimal places.
pub fn composite(dims: &DimensionScores, w: &Weights) -> f64 {
    let sum = dims.worker_impact * w.worker_impact
        + dims.timeliness * w.timeliness
        + dims.verifiability * w.verifiability
        + dims.regional_relevance * w.regional_relevance
        + dims.conflict * w.conflict
        + dims.novelty * w.novelty;
    let scaled = (sum * 10.0).clamp(0.0, 100.0);
    (scaled * COMPOSITE_PRECISION).round() / COMPOSITE_PRECISION
}

/// Approve at or above `approve`, hold at or above `hold`, otherwise reject.
pub fn decide(composite: f64, t: &Thresholds) -> Decision {
    if composite >= t.approve {
        Decision::Approve
    } else if composite >= t.hold {
        Decision::Hold
    } else {
        Decision::Reject
    }
}

pub struct Scorer {
    weights: Weights,
    thresholds: Thresholds,
    half_life_hours: f64,
    novelty_match_ratio: f64,
}

impl Scorer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            weights: config.weights,
            thresholds: config.thresholds,
            half_life_hours: config.timeliness_half_life_hours,
            novelty_match_ratio: config.novelty_match_ratio,
        }
    }

    pub fn dimensions(&self, candidate: &EventCandidate, ctx: &ScoringContext<'_>) -> DimensionScores {
        let text = candidate.text();
        let lower = text.to_lowercase();
        DimensionScores {
            worker_impact: dimensions::worker_impact(&lower),
            timeliness: dimensions::timeliness(
                candidate.event_at,
                ctx.now,
                &lower,
                self.half_life_hours,
            ),
            verifiability: dimensions::verifiability(&text, &lower, &candidate.source_url),
            regional_relevance: dimensions::regional_relevance(&lower),
            conflict: dimensions::conflict(&lower),
            novelty: dimensions::novelty(
                &candidate.title,
                &lower,
                ctx.recent_approved_titles,
                self.novelty_match_ratio,
            ),
        }
    }

    pub fn score(&self, candidate: &EventCandidate, ctx: &ScoringContext<'_>) -> ScoreCard {
        let dims = self.dimensions(candidate, ctx);
        self.card(dims)
    }

    /// Composite, decision and reason for already-computed dimensions.
    pub fn card(&self, dims: DimensionScores) -> ScoreCard {
        let composite = composite(&dims, &self.weights);
        let decision = decide(composite, &self.thresholds);
        let reason = match decision {
            Decision::Approve => None,
            Decision::Hold => Some(format!("Score {composite:.1} requires editorial review")),
            Decision::Reject => Some(format!("Score {composite:.1} below threshold")),
        };
        ScoreCard {
            dimensions: dims,
            composite,
            decision,
            reason,
        }
    }
}

/// Build the topic an approved candidate is promoted to.
pub fn topic_for(candidate: &EventCandidate, card: &ScoreCard, now: DateTime<Utc>) -> Topic {
    let lower = candidate.text().to_lowercase();
    Topic {
        id: Uuid::new_v4(),
        candidate_id: candidate.id,
        title: candidate.title.clone(),
        description: candidate.description.clone(),
        category: classify::infer_category(&lower).to_string(),
        regional: classify::classify_region(&lower),
        dimensions: card.dimensions,
        composite_score: card.composite,
        verification_status: VerificationStatus::Pending,
        verified_facts: Vec::new(),
        source_plan: None,
        verification_note: None,
        created_at: now,
        verified_at: None,
    }
}
