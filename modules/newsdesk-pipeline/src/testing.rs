// Test helpers for the decision pipeline.
//
// - MockDiscovery (SourceDiscovery): title -> sources, Err for unregistered titles
// - Fixture builders for the canonical scenarios, citations, editors, and
//   verified topics seeded straight into a store.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use newsdesk_common::text::normalize_title;
use newsdesk_common::{
    DimensionScores, DiscoveredSource, Editor, EventCandidate, PlannedSource, RegionScope,
    RegionalClassification, SourceKind, Topic, VerificationStatus,
};

use crate::store::PipelineStore;
use crate::traits::SourceDiscovery;
use crate::verification::{build_plan, citation_key, tiers};

// ---------------------------------------------------------------------------
// MockDiscovery
// ---------------------------------------------------------------------------

/// HashMap-based source discovery keyed by normalized topic title. Returns
/// `Err` for unregistered titles, which the pipeline treats as a transient
/// discovery failure.
#[derive(Default)]
pub struct MockDiscovery {
    by_title: HashMap<String, Vec<DiscoveredSource>>,
    calls: Mutex<Vec<String>>,
}

impl MockDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_topic(mut self, title: &str, sources: Vec<DiscoveredSource>) -> Self {
        self.by_title.insert(normalize_title(title), sources);
        self
    }

    /// Titles discovery was asked about, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SourceDiscovery for MockDiscovery {
    async fn discover(&self, topic: &Topic) -> Result<Vec<DiscoveredSource>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(topic.title.clone());
        }
        match self.by_title.get(&normalize_title(&topic.title)) {
            Some(sources) => Ok(sources.clone()),
            None => bail!("MockDiscovery: no sources registered for {}", topic.title),
        }
    }
}

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

pub const SCENARIO_A_TITLE: &str =
    "Amazon Warehouse Workers in NYC Launch Strike Over Safety Violations";
pub const SCENARIO_B_TITLE: &str = "CEO Announces Record Profits for Tech Company";

/// Breaking NYC strike with safety violations, Reuters-sourced, with a quote.
pub fn scenario_a_candidate(now: DateTime<Utc>) -> EventCandidate {
    EventCandidate::builder()
        .title(SCENARIO_A_TITLE)
        .description(
            "Breaking: Thousands of Amazon warehouse workers in New York City walked off the job \
             Monday over repeated OSHA safety violations, according to Reuters. \"We will not keep \
             working in unsafe conditions,\" said union organizer Maria Lopez. The strike vote is \
             set for Friday.",
        )
        .source_url("https://www.reuters.com/world/us/amazon-warehouse-workers-nyc-strike")
        .discovered_from("rss:reuters")
        .discovered_at(now)
        .event_at(now - Duration::hours(2))
        .build()
}

/// Press-release profit announcement with no labor angle.
pub fn scenario_b_candidate(now: DateTime<Utc>) -> EventCandidate {
    EventCandidate::builder()
        .title(SCENARIO_B_TITLE)
        .description(
            "Press release: the company reported record quarterly profits of $4.2 billion, \
             the CEO announced.",
        )
        .source_url("https://www.prnewswire.com/news-releases/ceo-announces-record-profits")
        .discovered_from("rss:prnewswire")
        .discovered_at(now)
        .event_at(now - Duration::hours(24))
        .build()
}

pub fn candidate(title: &str, url: &str, now: DateTime<Utc>) -> EventCandidate {
    EventCandidate::builder()
        .title(title)
        .source_url(url)
        .discovered_from("test")
        .discovered_at(now)
        .build()
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

pub fn cited(url: &str, claims: &[&str]) -> DiscoveredSource {
    DiscoveredSource {
        url: url.to_string(),
        name: None,
        kind: None,
        claims: claims.iter().map(|c| c.to_string()).collect(),
        excerpt: None,
    }
}

pub fn cited_as(url: &str, kind: SourceKind, claims: &[&str]) -> DiscoveredSource {
    DiscoveredSource {
        kind: Some(kind),
        ..cited(url, claims)
    }
}

/// Two wire services and a government record agreeing on the walkout.
pub fn scenario_a_sources() -> Vec<DiscoveredSource> {
    vec![
        cited(
            "https://www.reuters.com/world/us/amazon-warehouse-workers-nyc-strike",
            &["More than 3,000 workers walked off the job Monday at the Staten Island warehouse."],
        ),
        cited(
            "https://apnews.com/article/amazon-strike-new-york",
            &["More than 3,000 workers walked off the job on Monday at the Staten Island warehouse."],
        ),
        cited(
            "https://www.osha.gov/news/newsreleases/region2/amazon-citations",
            &["OSHA cited the warehouse for 14 safety violations."],
        ),
    ]
}

/// Ranked plan entry for a URL, scored at its tier's initial credibility.
pub fn planned(url: &str) -> PlannedSource {
    let source = cited(url, &[]);
    let kind = tiers::classify_source(&source);
    PlannedSource {
        url: url.to_string(),
        name: citation_key(&source),
        source_key: citation_key(&source),
        kind,
        tier: kind.tier(),
        credibility_score: kind.tier().initial_score(),
    }
}

// ---------------------------------------------------------------------------
// Editors
// ---------------------------------------------------------------------------

pub fn specialist(name: &str, categories: &[&str], open_workload: u32) -> Editor {
    Editor::builder()
        .name(name)
        .specializations(categories.iter().map(|c| c.to_string()).collect())
        .open_workload(open_workload)
        .build()
}

pub fn general_editor(name: &str) -> Editor {
    Editor::builder().name(name).general(true).build()
}

// ---------------------------------------------------------------------------
// Topics
// ---------------------------------------------------------------------------

/// Save a candidate, approve and promote it, register its planned sources and
/// mark the topic verified. Returns the stored topic.
pub async fn seed_verified_topic(
    store: &dyn PipelineStore,
    title: &str,
    category: &str,
    sources: Vec<PlannedSource>,
    now: DateTime<Utc>,
) -> Result<Topic> {
    let candidate = EventCandidate::builder()
        .title(title)
        .discovered_at(now)
        .build();
    store.save_candidate(&candidate).await?;

    let mut topic = Topic {
        id: Uuid::new_v4(),
        candidate_id: candidate.id,
        title: title.to_string(),
        description: String::new(),
        category: category.to_string(),
        regional: RegionalClassification {
            scope: RegionScope::National,
            region_id: None,
        },
        dimensions: DimensionScores::default(),
        composite_score: 75.0,
        verification_status: VerificationStatus::Pending,
        verified_facts: Vec::new(),
        source_plan: None,
        verification_note: None,
        created_at: now,
        verified_at: None,
    };
    topic = store.promote_topic(&topic).await?;
    for source in &sources {
        store
            .upsert_cited_source(topic.id, &source.source_key, &source.name, source.kind, now)
            .await?;
    }
    topic.verification_status = VerificationStatus::Verified;
    topic.source_plan = Some(build_plan(sources));
    topic.verified_at = Some(now);
    store.record_verification(&topic).await?;
    Ok(topic)
}
