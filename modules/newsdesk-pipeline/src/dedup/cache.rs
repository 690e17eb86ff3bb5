//! Bounded in-memory window of recently admitted items.
//!
//! Seeded from the persisted trailing window at startup and appended on every
//! admission, so duplicates inside a single discovery batch are caught before
//! anything has been written to the store.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use newsdesk_common::text::sequence_ratio;
use uuid::Uuid;

/// Which dedup layer produced a match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchLayer {
    ExactUrl,
    TitleHash,
    FuzzyTitle { ratio: f64 },
}

impl std::fmt::Display for MatchLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExactUrl => write!(f, "exact_url"),
            Self::TitleHash => write!(f, "title_hash"),
            Self::FuzzyTitle { ratio } => write!(f, "fuzzy_title({ratio:.2})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuplicateMatch {
    pub existing_id: Uuid,
    pub layer: MatchLayer,
}

/// Normalized lookup keys for one item. Absent fields cannot match.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub id: Uuid,
    pub url: Option<String>,
    pub title_hash: Option<String>,
    pub normalized_title: Option<String>,
    pub seen_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_empty(&self) -> bool {
        self.url.is_none() && self.title_hash.is_none()
    }
}

#[derive(Default)]
struct CacheState {
    /// Insertion order drives the greedy fuzzy scan.
    entries: VecDeque<CacheEntry>,
    by_url: HashMap<String, Uuid>,
    by_title_hash: HashMap<String, Uuid>,
}

impl CacheState {
    fn find(&self, key: &CacheEntry, fuzzy_threshold: f64) -> Option<DuplicateMatch> {
        if let Some(existing_id) = key.url.as_ref().and_then(|u| self.by_url.get(u)) {
            return Some(DuplicateMatch {
                existing_id: *existing_id,
                layer: MatchLayer::ExactUrl,
            });
        }

        if let Some(existing_id) = key.title_hash.as_ref().and_then(|h| self.by_title_hash.get(h)) {
            return Some(DuplicateMatch {
                existing_id: *existing_id,
                layer: MatchLayer::TitleHash,
            });
        }

        let title = key.normalized_title.as_deref()?;
        self.entries.iter().find_map(|entry| {
            let other = entry.normalized_title.as_deref()?;
            let ratio = sequence_ratio(title, other);
            (ratio >= fuzzy_threshold).then_some(DuplicateMatch {
                existing_id: entry.id,
                layer: MatchLayer::FuzzyTitle { ratio },
            })
        })
    }

    fn insert(&mut self, entry: CacheEntry) {
        if let Some(url) = &entry.url {
            self.by_url.entry(url.clone()).or_insert(entry.id);
        }
        if let Some(hash) = &entry.title_hash {
            self.by_title_hash.entry(hash.clone()).or_insert(entry.id);
        }
        self.entries.push_back(entry);
    }

    fn forget(&mut self, entry: &CacheEntry) {
        if let Some(url) = &entry.url {
            if self.by_url.get(url) == Some(&entry.id) {
                self.by_url.remove(url);
            }
        }
        if let Some(hash) = &entry.title_hash {
            if self.by_title_hash.get(hash) == Some(&entry.id) {
                self.by_title_hash.remove(hash);
            }
        }
    }
}

pub struct RecentWindowCache {
    state: Mutex<CacheState>,
    capacity: usize,
}

impl RecentWindowCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            capacity: capacity.max(1),
        }
    }

    /// Load entries in the order given. Callers pass them oldest first.
    pub fn seed(&self, entries: impl IntoIterator<Item = CacheEntry>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        for entry in entries {
            if entry.is_empty() {
                continue;
            }
            state.insert(entry);
        }
        Self::enforce_capacity(&mut state, self.capacity);
    }

    /// Look for a duplicate of `key`; when none exists, record `key` before
    /// releasing the lock. Check and insert happen in one critical section.
    pub fn check_and_insert(&self, key: CacheEntry, fuzzy_threshold: f64) -> Option<DuplicateMatch> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(found) = state.find(&key, fuzzy_threshold) {
            return Some(found);
        }
        if !key.is_empty() {
            state.insert(key);
            Self::enforce_capacity(&mut state, self.capacity);
        }
        None
    }

    /// Drop entries seen before `cutoff`. Returns how many were removed.
    pub fn prune_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let before = state.entries.len();
        let (keep, drop): (VecDeque<_>, VecDeque<_>) = std::mem::take(&mut state.entries)
            .into_iter()
            .partition(|e| e.seen_at >= cutoff);
        for entry in &drop {
            state.forget(entry);
        }
        state.entries = keep;
        before - state.entries.len()
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = CacheState::default();
    }

    fn enforce_capacity(state: &mut CacheState, capacity: usize) {
        while state.entries.len() > capacity {
            if let Some(oldest) = state.entries.pop_front() {
                state.forget(&oldest);
            }
        }
    }
}
