//! Claim classification and cross-referencing across cited sources.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use newsdesk_common::text::{normalize_title, sentences, sequence_ratio};
use newsdesk_common::{ClaimClass, DiscoveredSource, PlannedSource, VerifiedFact};
use regex::Regex;

/// Minimum skeleton similarity for two statements to describe the same fact.
pub const SAME_FACT_RATIO: f64 = 0.8;

/// Confidence multiplier for facts stated by a single source.
const UNCORROBORATED_FACTOR: f64 = 0.8;

/// Confidence penalty when sources disagree on a detail.
const CONFLICT_PENALTY: f64 = 0.2;

static INTERPRETIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:could|may|might|would|likely|unlikely|expected to|experts? say|analysts? say|suggests?|appears? to|predict\w*|possibly|perhaps|seems?|projected)\b",
    )
    .expect("valid regex")
});

static ATTRIBUTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\baccording to\b|\b(?:said|says|claimed|claims|alleged|alleges|stated|told|announced)\b|["“]"#)
        .expect("valid regex")
});

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("valid regex"));

static PROPER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)+\b").expect("valid regex"));

static DATE_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday|january|february|march|april|june|july|august|september|october|november|december|yesterday|today)\b",
    )
    .expect("valid regex")
});

/// Interpretation beats attribution beats direct observation.
pub fn classify_claim(text: &str) -> ClaimClass {
    if INTERPRETIVE.is_match(text) {
        ClaimClass::Interpreted
    } else if ATTRIBUTED.is_match(text) {
        ClaimClass::Claimed
    } else {
        ClaimClass::Observed
    }
}

/// Statements offered by a source: extracted claims, or excerpt sentences.
pub fn statements_of(source: &DiscoveredSource) -> Vec<String> {
    let claims: Vec<String> = source
        .claims
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if !claims.is_empty() {
        return claims;
    }
    source.excerpt.as_deref().map(sentences).unwrap_or_default()
}

/// A statement with its numbers and proper names removed. Two sources
/// reporting the same fact with different figures share a skeleton.
fn skeleton(text: &str) -> String {
    let kept: Vec<&str> = text
        .split_whitespace()
        .filter(|w| !w.chars().any(|c| c.is_ascii_digit()))
        .filter(|w| !w.chars().next().is_some_and(char::is_uppercase))
        .collect();
    let s = normalize_title(&kept.join(" "));
    if s.is_empty() {
        normalize_title(text)
    } else {
        s
    }
}

#[derive(Debug, Default, PartialEq)]
struct Details {
    numbers: BTreeSet<String>,
    names: BTreeSet<String>,
    dates: BTreeSet<String>,
}

impl Details {
    fn of(text: &str) -> Self {
        Self {
            numbers: NUMBER
                .find_iter(text)
                .map(|m| m.as_str().replace(',', "").trim_end_matches('.').to_string())
                .collect(),
            names: PROPER_NAME
                .find_iter(text)
                .map(|m| m.as_str().to_string())
                .collect(),
            dates: DATE_WORD
                .find_iter(text)
                .map(|m| m.as_str().to_lowercase())
                .collect(),
        }
    }

    /// True when both sides state a detail of the same kind and disagree.
    fn disagrees_with(&self, other: &Self) -> bool {
        fn differs(a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
            !a.is_empty() && !b.is_empty() && a != b
        }
        differs(&self.numbers, &other.numbers)
            || differs(&self.names, &other.names)
            || differs(&self.dates, &other.dates)
    }
}

struct Statement<'a> {
    source: &'a PlannedSource,
    text: &'a str,
    details: Details,
}

struct FactGroup<'a> {
    skeleton: String,
    statements: Vec<Statement<'a>>,
}

impl FactGroup<'_> {
    fn conflicting_info(&self) -> Option<String> {
        let mut conflicting = false;
        for (i, a) in self.statements.iter().enumerate() {
            for b in &self.statements[i + 1..] {
                if a.source.source_key != b.source.source_key && a.details.disagrees_with(&b.details) {
                    conflicting = true;
                }
            }
        }
        if !conflicting {
            return None;
        }
        let quoted: Vec<String> = self
            .statements
            .iter()
            .map(|s| format!("{}: \"{}\"", s.source.source_key, s.text))
            .collect();
        Some(quoted.join("; "))
    }

    fn into_fact(self) -> VerifiedFact {
        let conflicting_info = self.conflicting_info();

        let mut urls: Vec<String> = Vec::new();
        let mut keys: BTreeSet<&str> = BTreeSet::new();
        let mut credibility_sum = 0.0;
        for s in &self.statements {
            if !urls.contains(&s.source.url) {
                urls.push(s.source.url.clone());
                credibility_sum += s.source.credibility_score;
            }
            keys.insert(s.source.source_key.as_str());
        }
        let cross_referenced = keys.len() >= 2;

        let mut confidence = credibility_sum / urls.len().max(1) as f64 / 100.0;
        if !cross_referenced {
            confidence *= UNCORROBORATED_FACTOR;
        }
        if conflicting_info.is_some() {
            confidence -= CONFLICT_PENALTY;
        }
        let confidence = (confidence.clamp(0.0, 1.0) * 100.0).round() / 100.0;

        let text = self.statements[0].text.to_string();
        VerifiedFact {
            classification: classify_claim(&text),
            text,
            supporting_sources: urls,
            confidence,
            conflicting_info,
            cross_referenced,
        }
    }
}

/// Group statements that describe the same fact and score each group.
///
/// `cited` must be in rank order: each statement joins the first existing
/// group it matches, and a fact's text is taken from its best-ranked source.
pub fn cross_reference(cited: &[(PlannedSource, Vec<String>)]) -> Vec<VerifiedFact> {
    let mut groups: Vec<FactGroup<'_>> = Vec::new();
    for (source, statements) in cited {
        for text in statements {
            let sk = skeleton(text);
            let statement = Statement {
                source,
                text,
                details: Details::of(text),
            };
            match groups
                .iter_mut()
                .find(|g| sequence_ratio(&g.skeleton, &sk) >= SAME_FACT_RATIO)
            {
                Some(group) => group.statements.push(statement),
                None => groups.push(FactGroup {
                    skeleton: sk,
                    statements: vec![statement],
                }),
            }
        }
    }
    groups.into_iter().map(FactGroup::into_fact).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsdesk_common::{SourceKind, SourceTier};

    fn planned(key: &str, credibility: f64) -> PlannedSource {
        PlannedSource {
            url: format!("https://{key}/story"),
            name: key.to_string(),
            source_key: key.to_string(),
            kind: SourceKind::WireService,
            tier: SourceTier::Tier2,
            credibility_score: credibility,
        }
    }

    #[test]
    fn classification_precedence() {
        assert_eq!(classify_claim("Workers walked off the job."), ClaimClass::Observed);
        assert_eq!(
            classify_claim("The union said workers walked off the job."),
            ClaimClass::Claimed
        );
        assert_eq!(
            classify_claim("The union said the strike could spread."),
            ClaimClass::Interpreted
        );
    }

    #[test]
    fn excerpt_is_split_when_no_claims() {
        let source = DiscoveredSource {
            url: "https://apnews.com/a".to_string(),
            name: None,
            kind: None,
            claims: vec!["  ".to_string()],
            excerpt: Some("Pickets formed at dawn. Talks resume Friday.".to_string()),
        };
        assert_eq!(
            statements_of(&source),
            vec!["Pickets formed at dawn.", "Talks resume Friday."]
        );
    }

    #[test]
    fn agreeing_sources_cross_reference() {
        let cited = vec![
            (planned("reuters.com", 85.0), vec!["Workers walked off the job at the plant.".to_string()]),
            (planned("apnews.com", 85.0), vec!["Workers walked off the job at the plant.".to_string()]),
        ];
        let facts = cross_reference(&cited);
        assert_eq!(facts.len(), 1);
        assert!(facts[0].cross_referenced);
        assert!(facts[0].conflicting_info.is_none());
        assert_eq!(facts[0].confidence, 0.85);
        assert_eq!(facts[0].supporting_sources.len(), 2);
    }

    #[test]
    fn disagreeing_numbers_are_recorded_verbatim() {
        let a = "About 5,000 workers walked off the job on Monday.";
        let b = "About 4,000 workers walked off the job on Monday.";
        let cited = vec![
            (planned("reuters.com", 85.0), vec![a.to_string()]),
            (planned("apnews.com", 85.0), vec![b.to_string()]),
        ];
        let facts = cross_reference(&cited);
        assert_eq!(facts.len(), 1);
        let info = facts[0].conflicting_info.as_deref().unwrap();
        assert!(info.contains(a));
        assert!(info.contains(b));
        assert_eq!(facts[0].confidence, 0.65);
        assert_eq!(facts[0].text, a);
    }

    #[test]
    fn single_source_fact_is_not_cross_referenced() {
        let cited = vec![(
            planned("reuters.com", 85.0),
            vec!["Management locked the gates.".to_string()],
        )];
        let facts = cross_reference(&cited);
        assert!(!facts[0].cross_referenced);
        assert_eq!(facts[0].confidence, 0.68);
    }

    #[test]
    fn unrelated_statements_form_separate_facts() {
        let cited = vec![
            (planned("reuters.com", 85.0), vec!["Workers walked off the job.".to_string()]),
            (planned("apnews.com", 85.0), vec!["The company declined to comment on wages.".to_string()]),
        ];
        assert_eq!(cross_reference(&cited).len(), 2);
    }

    #[test]
    fn same_outlet_twice_is_not_independent() {
        let mut second = planned("reuters.com", 85.0);
        second.url = "https://reuters.com/other".to_string();
        let cited = vec![
            (planned("reuters.com", 85.0), vec!["Workers walked off the job.".to_string()]),
            (second, vec!["Workers walked off the job.".to_string()]),
        ];
        let facts = cross_reference(&cited);
        assert_eq!(facts.len(), 1);
        assert!(!facts[0].cross_referenced);
    }
}
