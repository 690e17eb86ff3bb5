//! Source credibility verification for approved topics.
//!
//! Each discovered citation is classified into a tier, ranked, and counted
//! toward the verification threshold. Claims are cross-referenced across
//! citations and a source plan is produced for the writer.

pub mod claims;
pub mod tiers;

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use newsdesk_common::text::{normalize_url, source_key};
use newsdesk_common::{
    DiscoveredSource, PipelineConfig, PlannedSource, Source, SourcePlan, Topic,
    VerificationStatus, VerifiedFact,
};

/// Most sources listed as primary in a plan.
const MAX_PRIMARY: usize = 3;

/// Most corroborating outlets named in the attribution strategy.
const MAX_CORROBORATORS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct VerificationOutcome {
    pub status: VerificationStatus,
    pub facts: Vec<VerifiedFact>,
    pub plan: SourcePlan,
    /// Distinct Tier 1/2 outlets cited.
    pub credible_count: usize,
    /// Distinct peer-reviewed documents cited.
    pub academic_count: usize,
    pub note: Option<String>,
}

impl VerificationOutcome {
    /// Copy the outcome onto the topic it was computed for.
    pub fn apply_to(self, topic: &mut Topic, now: DateTime<Utc>) {
        topic.verification_status = self.status;
        topic.verified_facts = self.facts;
        topic.source_plan = Some(self.plan);
        topic.verification_note = self.note;
        topic.verified_at = Some(now);
    }
}

/// Mark a topic whose source discovery errored. Failed topics are retried.
pub fn mark_failed(topic: &mut Topic, reason: &str) {
    topic.verification_status = VerificationStatus::Failed;
    topic.verification_note = Some(reason.to_string());
}

/// Reliability key for a citation: the outlet's host, or a name-based
/// placeholder when the URL has none.
pub fn citation_key(source: &DiscoveredSource) -> String {
    source_key(&source.url).unwrap_or_else(|| {
        let label = source.name.as_deref().unwrap_or(source.url.trim());
        format!("unknown:{}", label.to_lowercase())
    })
}

pub struct Verifier {
    min_credible: usize,
    min_academic: usize,
}

impl Verifier {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            min_credible: config.min_credible_sources,
            min_academic: config.min_academic_sources,
        }
    }

    /// Resolve discovered citations into planned sources with their
    /// statements, deduplicated by URL and sorted best first.
    ///
    /// `known` maps source keys to their running reliability record; unknown
    /// outlets start from their tier's initial score.
    pub fn rank(
        &self,
        discovered: &[DiscoveredSource],
        known: &HashMap<String, Source>,
    ) -> Vec<(PlannedSource, Vec<String>)> {
        let mut seen_urls = HashSet::new();
        let mut cited = Vec::new();
        for d in discovered {
            if let Some(url) = normalize_url(&d.url) {
                if !seen_urls.insert(url) {
                    continue;
                }
            }
            let kind = tiers::classify_source(d);
            let tier = kind.tier();
            let key = citation_key(d);
            let record = known.get(&key);
            let name = d
                .name
                .clone()
                .or_else(|| record.map(|s| s.name.clone()))
                .unwrap_or_else(|| key.clone());
            let credibility_score = record
                .map(|s| s.credibility_score)
                .unwrap_or_else(|| tier.initial_score());
            cited.push((
                PlannedSource {
                    url: d.url.trim().to_string(),
                    name,
                    source_key: key,
                    kind,
                    tier,
                    credibility_score,
                },
                claims::statements_of(d),
            ));
        }
        cited.sort_by(|(a, _), (b, _)| {
            a.tier
                .cmp(&b.tier)
                .then(b.credibility_score.total_cmp(&a.credibility_score))
                .then_with(|| a.url.cmp(&b.url))
        });
        cited
    }

    pub fn verify(
        &self,
        discovered: &[DiscoveredSource],
        known: &HashMap<String, Source>,
    ) -> VerificationOutcome {
        let cited = self.rank(discovered, known);

        let credible_count = cited
            .iter()
            .filter(|(s, _)| s.tier.is_credible())
            .map(|(s, _)| s.source_key.as_str())
            .collect::<HashSet<_>>()
            .len();
        let academic_count = cited
            .iter()
            .filter(|(s, _)| s.kind.is_academic())
            .map(|(s, _)| s.url.as_str())
            .collect::<HashSet<_>>()
            .len();

        let verified = credible_count >= self.min_credible || academic_count >= self.min_academic;
        let (status, note) = if verified {
            (VerificationStatus::Verified, None)
        } else {
            (
                VerificationStatus::InsufficientSources,
                Some(format!(
                    "{credible_count} credible and {academic_count} academic sources found; need {} credible or {} academic",
                    self.min_credible, self.min_academic
                )),
            )
        };

        let facts = claims::cross_reference(&cited);
        let plan = build_plan(cited.into_iter().map(|(s, _)| s).collect());

        VerificationOutcome {
            status,
            facts,
            plan,
            credible_count,
            academic_count,
            note,
        }
    }
}

/// Split ranked sources into primary and supporting and write the
/// attribution guidance.
pub fn build_plan(ranked: Vec<PlannedSource>) -> SourcePlan {
    let mut primary = Vec::new();
    let mut supporting = Vec::new();
    for source in ranked {
        if primary.len() < MAX_PRIMARY && source.tier.is_credible() {
            primary.push(source);
        } else {
            supporting.push(source);
        }
    }
    if primary.is_empty() && !supporting.is_empty() {
        primary.push(supporting.remove(0));
    }

    let attribution_strategy = attribution(&primary, &supporting);
    SourcePlan {
        primary,
        supporting,
        attribution_strategy,
    }
}

fn attribution(primary: &[PlannedSource], supporting: &[PlannedSource]) -> String {
    let Some(lead) = primary.first() else {
        return "No sources available for attribution.".to_string();
    };
    let mut out = format!(
        "Lead with {} ({}, credibility {:.0}).",
        lead.name, lead.tier, lead.credibility_score
    );

    let mut named = vec![lead.source_key.as_str()];
    let corroborators: Vec<&str> = primary[1..]
        .iter()
        .chain(supporting)
        .filter(|s| {
            if named.contains(&s.source_key.as_str()) {
                false
            } else {
                named.push(s.source_key.as_str());
                true
            }
        })
        .take(MAX_CORROBORATORS)
        .map(|s| s.name.as_str())
        .collect();

    if corroborators.is_empty() {
        out.push_str(" No independent corroboration; attribute every claim to the lead source.");
    } else {
        out.push_str(&format!(" Corroborate with {}.", corroborators.join(", ")));
    }
    if !lead.tier.is_credible() {
        out.push_str(" Treat all claims as unconfirmed.");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsdesk_common::{SourceKind, SourceTier};

    fn src(url: &str) -> DiscoveredSource {
        DiscoveredSource {
            url: url.to_string(),
            name: None,
            kind: None,
            claims: Vec::new(),
            excerpt: None,
        }
    }

    fn verifier() -> Verifier {
        Verifier::new(&PipelineConfig::default())
    }

    #[test]
    fn three_credible_outlets_verify() {
        let discovered = vec![
            src("https://www.reuters.com/a"),
            src("https://apnews.com/b"),
            src("https://www.bls.gov/c"),
        ];
        let outcome = verifier().verify(&discovered, &HashMap::new());
        assert_eq!(outcome.status, VerificationStatus::Verified);
        assert_eq!(outcome.credible_count, 3);
        assert!(outcome.note.is_none());
    }

    #[test]
    fn two_credible_and_one_regional_is_insufficient() {
        let discovered = vec![
            src("https://www.reuters.com/a"),
            src("https://apnews.com/b"),
            src("https://www.toledoblade.com/c"),
        ];
        let outcome = verifier().verify(&discovered, &HashMap::new());
        assert_eq!(outcome.status, VerificationStatus::InsufficientSources);
        assert_eq!(outcome.credible_count, 2);
        assert!(outcome.note.unwrap().contains("2 credible"));
    }

    #[test]
    fn two_papers_verify_on_their_own() {
        let discovered = vec![src("https://doi.org/10.1/a"), src("https://doi.org/10.1/b")];
        let outcome = verifier().verify(&discovered, &HashMap::new());
        assert_eq!(outcome.academic_count, 2);
        assert_eq!(outcome.status, VerificationStatus::Verified);
    }

    #[test]
    fn tier_four_never_verifies() {
        let discovered: Vec<_> = (0..10)
            .map(|i| src(&format!("https://twitter.com/user{i}/status/1")))
            .collect();
        let outcome = verifier().verify(&discovered, &HashMap::new());
        assert_eq!(outcome.status, VerificationStatus::InsufficientSources);
        assert_eq!(outcome.credible_count, 0);
    }

    #[test]
    fn same_outlet_counts_once() {
        let discovered = vec![
            src("https://www.reuters.com/a"),
            src("https://www.reuters.com/b"),
            src("https://www.reuters.com/c"),
        ];
        let outcome = verifier().verify(&discovered, &HashMap::new());
        assert_eq!(outcome.credible_count, 1);
        assert_eq!(outcome.status, VerificationStatus::InsufficientSources);
    }

    #[test]
    fn duplicate_urls_are_cited_once() {
        let discovered = vec![
            src("https://www.reuters.com/a?utm=1"),
            src("https://www.reuters.com/a"),
        ];
        assert_eq!(verifier().rank(&discovered, &HashMap::new()).len(), 1);
    }

    #[test]
    fn ranking_puts_best_tier_first_then_running_score() {
        let mut known = HashMap::new();
        let mut degraded = Source::first_citation("reuters.com", "Reuters", SourceKind::WireService, Utc::now());
        degraded.credibility_score = 55.0;
        known.insert("reuters.com".to_string(), degraded);

        let discovered = vec![
            src("https://twitter.com/someone/status/1"),
            src("https://www.reuters.com/a"),
            src("https://apnews.com/b"),
            src("https://www.osha.gov/c"),
        ];
        let ranked = verifier().rank(&discovered, &known);
        let keys: Vec<_> = ranked.iter().map(|(s, _)| s.source_key.as_str()).collect();
        assert_eq!(keys, vec!["osha.gov", "apnews.com", "reuters.com", "twitter.com"]);
        assert_eq!(ranked[2].0.tier, SourceTier::Tier2);
        assert_eq!(ranked[2].0.credibility_score, 55.0);
    }

    #[test]
    fn plan_leads_with_best_credible_source() {
        let discovered = vec![
            src("https://www.toledoblade.com/c"),
            src("https://www.reuters.com/a"),
        ];
        let outcome = verifier().verify(&discovered, &HashMap::new());
        assert_eq!(outcome.plan.primary.len(), 1);
        assert_eq!(outcome.plan.primary[0].source_key, "reuters.com");
        assert_eq!(outcome.plan.supporting.len(), 1);
        assert_eq!(
            outcome.plan.attribution_strategy,
            "Lead with reuters.com (Tier 2, credibility 85). Corroborate with toledoblade.com."
        );
    }

    #[test]
    fn plan_without_credible_sources_is_flagged() {
        let ranked = verifier().rank(&[src("https://medium.com/@a/post")], &HashMap::new());
        let plan = build_plan(ranked.into_iter().map(|(s, _)| s).collect());
        assert_eq!(plan.primary.len(), 1);
        assert!(plan.attribution_strategy.ends_with("Treat all claims as unconfirmed."));
    }

    #[test]
    fn empty_discovery_yields_empty_plan() {
        let outcome = verifier().verify(&[], &HashMap::new());
        assert_eq!(outcome.status, VerificationStatus::InsufficientSources);
        assert_eq!(outcome.plan.attribution_strategy, "No sources available for attribution.");
    }
}
