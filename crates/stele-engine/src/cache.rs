//! Engine caches.
//!
//! Results are memoized per engine for the engine's lifetime: no TTL, no
//! eviction. Concurrent misses on the same key may both compute; the later
//! insert overwrites an identical value.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use stele_core::{Annotation, AnnotationAttributes, Element};

use crate::merge::MergeOptions;
use crate::search::SearchKind;

/// Names of the memoized lookups, used as the `cache` metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheName {
    /// Merged attribute stores.
    Merged,
    /// First raw matches of `find_annotation`.
    Found,
    /// Whether an interface declares annotated methods.
    AnnotatedInterfaces,
}

impl CacheName {
    /// Returns the metric label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Merged => "merged",
            Self::Found => "found",
            Self::AnnotatedInterfaces => "annotated_interfaces",
        }
    }
}

pub(crate) fn record_lookup(cache: CacheName, hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    metrics::counter!("stele_cache_lookups_total", "cache" => cache.as_str(), "outcome" => outcome)
        .increment(1);
}

/// Key of a merged result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct MergeKey {
    pub kind: SearchKind,
    pub element: Element,
    pub annotation: String,
    pub options: MergeOptions,
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of merged results held.
    pub merged_entries: usize,
    /// Number of `find_annotation` results held.
    pub found_entries: usize,
    /// Number of interface checks held.
    pub interface_entries: usize,
}

/// Memoized results of one engine.
#[derive(Debug, Default)]
pub struct EngineCaches {
    merged: DashMap<MergeKey, Option<AnnotationAttributes>>,
    found: DashMap<(Element, String), Option<Annotation>>,
    pub(crate) annotated_interfaces: DashMap<String, bool>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EngineCaches {
    /// Creates empty caches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn merged(&self, key: &MergeKey) -> Option<Option<AnnotationAttributes>> {
        let hit = self.merged.get(key).map(|entry| entry.clone());
        self.record(CacheName::Merged, hit.is_some());
        hit
    }

    pub(crate) fn store_merged(&self, key: MergeKey, value: Option<AnnotationAttributes>) {
        self.merged.insert(key, value);
    }

    pub(crate) fn found(&self, element: &Element, annotation: &str) -> Option<Option<Annotation>> {
        let hit = self
            .found
            .get(&(element.clone(), annotation.to_string()))
            .map(|entry| entry.clone());
        self.record(CacheName::Found, hit.is_some());
        hit
    }

    pub(crate) fn store_found(&self, element: Element, annotation: String, value: Option<Annotation>) {
        self.found.insert((element, annotation), value);
    }

    fn record(&self, cache: CacheName, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        record_lookup(cache, hit);
    }

    /// Returns hit/miss counters and entry counts.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            merged_entries: self.merged.len(),
            found_entries: self.found.len(),
            interface_entries: self.annotated_interfaces.len(),
        }
    }

    /// Drops every cached result.
    pub fn clear(&self) {
        self.merged.clear();
        self.found.clear();
        self.annotated_interfaces.clear();
    }
}
