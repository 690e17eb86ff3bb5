//! Near-duplicate suppression for discovered candidates.
//!
//! Layers are checked in order, short-circuiting on the first hit:
//! 1. Exact normalized URL (scheme + host + path)
//! 2. Normalized-title hash
//! 3. Greedy fuzzy title scan (LCS ratio ≥ threshold, insertion order)

pub mod cache;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use newsdesk_common::text::{normalize_title, normalize_url, title_hash};
use newsdesk_common::{EventCandidate, MAX_DEDUP_WINDOW_DAYS};
use tracing::debug;
use uuid::Uuid;

pub use cache::{CacheEntry, DuplicateMatch, MatchLayer, RecentWindowCache};

/// Result of an admission check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Admission {
    pub admitted: bool,
    pub duplicate_of: Option<Uuid>,
    pub layer: Option<MatchLayer>,
}

impl Admission {
    fn admitted() -> Self {
        Self {
            admitted: true,
            duplicate_of: None,
            layer: None,
        }
    }

    fn duplicate(found: DuplicateMatch) -> Self {
        Self {
            admitted: false,
            duplicate_of: Some(found.existing_id),
            layer: Some(found.layer),
        }
    }
}

/// Build the cache keys for a candidate. Blank fields become `None`.
pub fn cache_entry_for(candidate: &EventCandidate) -> CacheEntry {
    let normalized = Some(normalize_title(&candidate.title)).filter(|t| !t.is_empty());
    CacheEntry {
        id: candidate.id,
        url: normalize_url(&candidate.source_url),
        title_hash: normalized.as_deref().map(title_hash),
        normalized_title: normalized,
        seen_at: candidate.discovered_at,
    }
}

pub struct Deduplicator {
    cache: Arc<RecentWindowCache>,
    fuzzy_threshold: f64,
    window: Duration,
}

impl Deduplicator {
    pub fn new(cache: Arc<RecentWindowCache>, fuzzy_threshold: f64, window_days: i64) -> Self {
        Self {
            cache,
            fuzzy_threshold,
            window: Duration::days(window_days.clamp(1, MAX_DEDUP_WINDOW_DAYS)),
        }
    }

    /// Admit a candidate or name the item it duplicates. Never fails; a
    /// candidate with neither title nor URL is always admitted.
    pub fn admit(&self, candidate: &EventCandidate) -> Admission {
        match self
            .cache
            .check_and_insert(cache_entry_for(candidate), self.fuzzy_threshold)
        {
            Some(found) => {
                debug!(
                    candidate_id = %candidate.id,
                    duplicate_of = %found.existing_id,
                    layer = %found.layer,
                    "Duplicate candidate"
                );
                Admission::duplicate(found)
            }
            None => Admission::admitted(),
        }
    }

    /// Drop cache entries that fell out of the trailing window.
    pub fn prune(&self, now: DateTime<Utc>) -> usize {
        self.cache.prune_before(now - self.window)
    }

    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }

    pub fn cache(&self) -> &Arc<RecentWindowCache> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dedup() -> Deduplicator {
        Deduplicator::new(Arc::new(RecentWindowCache::new(100)), 0.80, 7)
    }

    fn candidate(title: &str, url: &str) -> EventCandidate {
        EventCandidate::builder().title(title).source_url(url).build()
    }

    #[test]
    fn first_sighting_is_admitted() {
        let d = dedup();
        let a = d.admit(&candidate("Port workers strike", "https://news.com/a"));
        assert!(a.admitted);
        assert!(a.duplicate_of.is_none());
    }

    #[test]
    fn same_url_with_different_query_is_duplicate() {
        let d = dedup();
        let first = candidate("Port workers strike", "https://news.com/a?utm_source=rss");
        d.admit(&first);
        let a = d.admit(&candidate("Totally different", "https://news.com/a?ref=home"));
        assert!(!a.admitted);
        assert_eq!(a.duplicate_of, Some(first.id));
        assert_eq!(a.layer, Some(MatchLayer::ExactUrl));
    }

    #[test]
    fn identical_normalized_titles_are_duplicates() {
        let d = dedup();
        let first = candidate("Port Workers Strike!", "https://a.com/1");
        d.admit(&first);
        let a = d.admit(&candidate("port workers   strike", "https://b.com/2"));
        assert_eq!(a.duplicate_of, Some(first.id));
        assert_eq!(a.layer, Some(MatchLayer::TitleHash));
    }

    #[test]
    fn near_identical_titles_are_fuzzy_duplicates() {
        let d = dedup();
        let first = candidate("Amazon warehouse workers launch strike in NYC", "https://a.com/1");
        d.admit(&first);
        let a = d.admit(&candidate("Amazon warehouse workers launch strikes in NYC", "https://b.com/2"));
        assert!(!a.admitted);
        assert!(matches!(a.layer, Some(MatchLayer::FuzzyTitle { ratio }) if ratio >= 0.8));
    }

    #[test]
    fn unrelated_titles_pass() {
        let d = dedup();
        d.admit(&candidate("Amazon warehouse workers launch strike", "https://a.com/1"));
        let a = d.admit(&candidate("City council passes transit budget", "https://b.com/2"));
        assert!(a.admitted);
    }

    #[test]
    fn missing_url_falls_through_to_title() {
        let d = dedup();
        let first = candidate("Teachers vote to authorize strike", "");
        d.admit(&first);
        let a = d.admit(&candidate("Teachers vote to authorize strike", ""));
        assert_eq!(a.duplicate_of, Some(first.id));
    }

    #[test]
    fn item_without_title_or_url_is_never_duplicate() {
        let d = dedup();
        assert!(d.admit(&candidate("", "")).admitted);
        assert!(d.admit(&candidate("", "")).admitted);
        assert!(d.admit(&candidate("!!!", " ")).admitted);
    }

    #[test]
    fn duplicate_check_has_no_side_effect() {
        let d = dedup();
        d.admit(&candidate("Port workers strike", "https://a.com/1"));
        d.admit(&candidate("Port workers strike", "https://a.com/1"));
        assert_eq!(d.cache().len(), 1);
    }

    #[test]
    fn oversized_window_is_clamped() {
        let d = Deduplicator::new(Arc::new(RecentWindowCache::new(10)), 0.80, i64::MAX);
        let now = Utc::now();
        assert_eq!(
            now - d.window_start(now),
            Duration::days(MAX_DEDUP_WINDOW_DAYS)
        );
        assert_eq!(d.prune(now), 0);
    }
}
