//! Parsed-template cache.
//!
//! Maps the exact template text to its parsed tree so repeated renders skip
//! tokenizing and parsing. Entries live until [`TemplateCache::clear`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use super::parser::Template;

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
    /// Number of times a template was tokenized and parsed.
    pub parses: usize,
}

impl CacheStats {
    /// Hit rate as a percentage.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Concurrent cache of parsed templates.
///
/// Two threads missing on the same text may both parse it; parsing is pure,
/// so whichever insert lands last wins and both results are equivalent.
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: DashMap<String, Arc<Template>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
    parses: AtomicUsize,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached tree for `source`, counting the hit or miss.
    pub fn get(&self, source: &str) -> Option<Arc<Template>> {
        match self.entries.get(source) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(entry.value()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a freshly parsed tree.
    pub fn insert(&self, source: &str, template: Arc<Template>) {
        self.parses.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(source.to_string(), template);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.parses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            parses: self.parses.load(Ordering::Relaxed),
        }
    }
}
