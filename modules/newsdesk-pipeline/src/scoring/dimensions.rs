//! The six newsworthiness dimensions. Each is a pure function returning a
//! score in [0, 10].

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use newsdesk_common::text::{keywords, sequence_ratio};
use newsdesk_common::{SourceKind, SourceTier};
use regex::Regex;

use super::keywords::*;
use crate::verification::tiers::classify_url;

/// Score for a candidate with no worker-impact signal at all.
pub const WORKER_IMPACT_BASELINE: f64 = 2.0;

/// Timeliness when the event timestamp is unknown.
pub const TIMELINESS_UNKNOWN: f64 = 5.0;

/// Novelty before overlap penalties and escalation boosts.
pub const NOVELTY_BASELINE: f64 = 7.0;

static HEADCOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,3}(?:,\d{3})+|\d+)\s+(?:workers|employees|members|jobs|nurses|teachers|drivers)")
        .expect("valid regex")
});

static DOLLAR_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\s?\d|\b\d+(?:\.\d+)?\s+(?:million|billion)\b").expect("valid regex")
});

static QUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["“][^"”]{8,}["”]"#).expect("valid regex"));

static NAMED_PERSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:said|says|according to)\s+(?:[a-z]+\s+){0,3}[A-Z][a-z]+\s+[A-Z][a-z]+|\b[A-Z][a-z]+\s+[A-Z][a-z]+,?\s+(?:said|says)\b",
    )
    .expect("valid regex")
});

static DATE_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday|january|february|march|april|june|july|august|september|october|november|december)\b|\b\d{1,2}/\d{1,2}(?:/\d{2,4})?\b",
    )
    .expect("valid regex")
});

static STATE_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:in|across)\s+\d+\s+states\b").expect("valid regex"));

fn clamp10(x: f64) -> f64 {
    x.clamp(0.0, 10.0)
}

/// Labor actions, worker terms, scale and money signals.
pub fn worker_impact(lower: &str) -> f64 {
    let mut score = WORKER_IMPACT_BASELINE;

    let actions = count_terms(lower, LABOR_ACTIONS);
    if actions > 0 {
        score += 4.0 + (actions - 1).min(2) as f64;
    }
    if any_term(lower, WORKER_TERMS) {
        score += 1.5;
    }

    let largest_headcount = HEADCOUNT
        .captures_iter(lower)
        .filter_map(|c| c[1].replace(',', "").parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    let scale = if largest_headcount >= 1000 {
        2.0
    } else if any_term(lower, SCALE_TERMS) {
        1.5
    } else if largest_headcount >= 100 {
        1.0
    } else {
        0.0
    };
    score += scale;

    if DOLLAR_AMOUNT.is_match(lower) {
        score += 1.0;
    }

    clamp10(score)
}

/// Exponential decay from the event timestamp, boosted by breaking or
/// deadline language. Events in the future count as fresh.
pub fn timeliness(
    event_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    lower: &str,
    half_life_hours: f64,
) -> f64 {
    let base = match event_at {
        Some(at) => {
            let hours = ((now - at).num_seconds() as f64 / 3600.0).max(0.0);
            10.0 * 0.5_f64.powf(hours / half_life_hours)
        }
        None => TIMELINESS_UNKNOWN,
    };

    let mut boost = 0.0;
    if any_term(lower, BREAKING_TERMS) {
        boost += 2.0;
    }
    if any_term(lower, DEADLINE_TERMS) {
        boost += 1.0;
    }
    clamp10(base + boost)
}

fn source_bonus(source_url: &str) -> f64 {
    let Some(kind) = classify_url(source_url) else {
        return 2.5;
    };
    match (kind.tier(), kind) {
        (SourceTier::Tier1, _) => 6.5,
        (SourceTier::Tier2, _) => 6.0,
        (SourceTier::Tier3, _) => 4.0,
        (SourceTier::Tier4, SourceKind::PressRelease) => 2.0,
        (SourceTier::Tier4, SourceKind::UnverifiedSocial) => 1.0,
        (SourceTier::Tier4, _) => 1.5,
    }
}

/// Source credibility plus concrete facts, minus unattributed hedging.
pub fn verifiability(text: &str, lower: &str, source_url: &str) -> f64 {
    let mut score = source_bonus(source_url);
    if any_term(lower, WIRE_MENTIONS) {
        score = score.max(5.5);
    }

    let named = NAMED_PERSON.is_match(text);
    if QUOTE.is_match(text) {
        score += 1.0;
    }
    if named {
        score += 1.0;
    }
    if DATE_MENTION.is_match(text) {
        score += 0.5;
    }
    if lower.chars().any(|c| c.is_ascii_digit()) {
        score += 0.5;
    }

    let attributed = named || has_term(lower, "according to");
    if !attributed {
        let hedges = count_terms(lower, HEDGES).min(2);
        score -= 1.5 * hedges as f64;
    }

    clamp10(score)
}

/// National or major-metro scope scores highest, unnamed local lowest.
pub fn regional_relevance(lower: &str) -> f64 {
    if any_term(lower, NATIONAL_TERMS) {
        return 10.0;
    }
    if MAJOR_METROS.iter().any(|(term, _)| has_term(lower, term)) {
        return 10.0;
    }
    if any_term(lower, MULTI_STATE_TERMS) || STATE_COUNT.is_match(lower) {
        return 7.5;
    }
    if any_term(lower, STATES) {
        return 5.5;
    }
    if any_term(lower, LOCAL_TERMS) {
        return 3.5;
    }
    2.0
}

/// Dispute language raises the score, resolution language lowers it.
pub fn conflict(lower: &str) -> f64 {
    let disputes = count_terms(lower, CONFLICT_TERMS);
    let mut score = if disputes == 0 {
        0.0
    } else {
        6.0 + 1.5 * (disputes - 1) as f64
    };
    score -= 3.0 * count_terms(lower, RESOLUTION_TERMS) as f64;
    clamp10(score)
}

/// Penalized by overlap with the first recently approved title above
/// `match_ratio` (greedy, in the order given), boosted by escalation language.
pub fn novelty(title: &str, lower: &str, recent_approved: &[String], match_ratio: f64) -> f64 {
    let mine = keywords(title);
    let overlap = if mine.is_empty() {
        0.0
    } else {
        recent_approved
            .iter()
            .map(|other| sequence_ratio(&mine, &keywords(other)))
            .find(|ratio| *ratio >= match_ratio)
            .unwrap_or(0.0)
    };

    let boosts = count_terms(lower, NOVELTY_TERMS).min(2) as f64 * 1.5;
    clamp10(NOVELTY_BASELINE * (1.0 - overlap) + boosts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn worker_impact_without_signals_is_low() {
        assert_eq!(worker_impact("city unveils new park benches"), WORKER_IMPACT_BASELINE);
    }

    #[test]
    fn worker_impact_strike_with_scale() {
        let s = worker_impact("12,000 nurses strike at hospitals statewide");
        assert!(s >= 9.0, "got {s}");
    }

    #[test]
    fn worker_impact_counts_dollar_amounts() {
        let with = worker_impact("company pays $4 million");
        let without = worker_impact("company pays");
        assert_eq!(with - without, 1.0);
    }

    #[test]
    fn timeliness_decays_over_weeks() {
        let now = Utc::now();
        let fresh = timeliness(Some(now - Duration::hours(1)), now, "", 48.0);
        let stale = timeliness(Some(now - Duration::weeks(3)), now, "", 48.0);
        assert!(fresh > 9.5);
        assert!(stale < 0.1);
    }

    #[test]
    fn timeliness_half_life() {
        let now = Utc::now();
        let s = timeliness(Some(now - Duration::hours(48)), now, "", 48.0);
        assert!((s - 5.0).abs() < 1e-6);
    }

    #[test]
    fn timeliness_breaking_boost() {
        let now = Utc::now();
        let at = Some(now - Duration::hours(48));
        let plain = timeliness(at, now, "workers walk out", 48.0);
        let breaking = timeliness(at, now, "breaking: workers walk out", 48.0);
        assert!((breaking - plain - 2.0).abs() < 1e-6);
    }

    #[test]
    fn timeliness_unknown_event_time_is_neutral() {
        assert_eq!(timeliness(None, Utc::now(), "", 48.0), TIMELINESS_UNKNOWN);
    }

    #[test]
    fn verifiability_wire_beats_social() {
        let text = "Workers walked out";
        let lower = text.to_lowercase();
        let wire = verifiability(text, &lower, "https://www.reuters.com/a");
        let social = verifiability(text, &lower, "https://twitter.com/someone/status/1");
        assert!(wire > social + 4.0);
    }

    #[test]
    fn verifiability_hedging_penalized_without_attribution() {
        let url = "https://example-news.com/a";
        let hedged = "Workers were reportedly fired";
        let attributed = "Workers were reportedly fired, according to the union";
        let h = verifiability(hedged, &hedged.to_lowercase(), url);
        let a = verifiability(attributed, &attributed.to_lowercase(), url);
        assert!(a > h);
    }

    #[test]
    fn regional_national_beats_local() {
        assert_eq!(regional_relevance("a federal ruling on overtime"), 10.0);
        assert_eq!(regional_relevance("strike in chicago"), 10.0);
        assert_eq!(regional_relevance("walkouts in 4 states"), 7.5);
        assert_eq!(regional_relevance("ohio plant closes"), 5.5);
        assert_eq!(regional_relevance("county clerks protest"), 3.5);
        assert_eq!(regional_relevance("workers protest"), 2.0);
    }

    #[test]
    fn conflict_resolution_reduces_score() {
        let dispute = conflict("strike and lawsuit over safety violations");
        let settled = conflict("strike and lawsuit over safety violations end in settlement");
        assert!(dispute >= 9.0);
        assert_eq!(dispute - settled, 3.0);
        assert_eq!(conflict("a quiet day"), 0.0);
    }

    #[test]
    fn novelty_penalized_by_recent_overlap() {
        let recent = vec!["Amazon warehouse workers strike in NYC".to_string()];
        let repeat = novelty("Amazon warehouse workers strike in NYC again", "", &recent, 0.5);
        let fresh = novelty("Teachers in Ohio vote on contract", "", &recent, 0.5);
        assert!(repeat < 2.0, "got {repeat}");
        assert_eq!(fresh, NOVELTY_BASELINE);
    }

    #[test]
    fn novelty_escalation_boost() {
        let s = novelty("Strike", "first-ever strike escalates", &[], 0.5);
        assert_eq!(s, NOVELTY_BASELINE + 3.0);
    }
}
