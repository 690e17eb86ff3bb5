// Collaborator seams for the batch pipeline.
//
// SourceDiscovery finds citations for an approved topic. The pipeline never
// fetches anything itself; a discovery error marks the topic `failed` and
// leaves it retryable.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use newsdesk_common::text::normalize_title;
use newsdesk_common::{DiscoveredSource, Topic};

#[async_trait]
pub trait SourceDiscovery: Send + Sync {
    /// Citations found for `topic`. An empty list is a valid answer and
    /// leads to `insufficient_sources`, not failure.
    async fn discover(&self, topic: &Topic) -> Result<Vec<DiscoveredSource>>;
}

// ---------------------------------------------------------------------------
// StaticDiscovery: pre-collected sources keyed by topic title
// ---------------------------------------------------------------------------

/// Sources gathered ahead of time, looked up by normalized topic title.
/// Used by `newsdesk ingest` with a sources sidecar file.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    by_title: HashMap<String, Vec<DiscoveredSource>>,
}

impl StaticDiscovery {
    pub fn new(entries: HashMap<String, Vec<DiscoveredSource>>) -> Self {
        let by_title = entries
            .into_iter()
            .map(|(title, sources)| (normalize_title(&title), sources))
            .collect();
        Self { by_title }
    }
}

#[async_trait]
impl SourceDiscovery for StaticDiscovery {
    async fn discover(&self, topic: &Topic) -> Result<Vec<DiscoveredSource>> {
        Ok(self
            .by_title
            .get(&normalize_title(&topic.title))
            .cloned()
            .unwrap_or_default())
    }
}
