//! Content-addressed cache of parsed documents.
//!
//! Keys are blake3 digests of the raw text, so a one-character change
//! is a different entry and identical snapshots parse exactly once.
//! Eviction is true LRU: a hit refreshes recency, an insert past
//! capacity drops the least recently used entry.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ir::Document;
use tracing::debug;

struct CacheInner {
    map: HashMap<String, Arc<Document>>,
    /// Recency order, least recently used at the front.
    order: VecDeque<String>,
    capacity: usize,
}

/// Concurrency-safe memoization of [`parsers::parse`].
pub struct AstCache {
    inner: Mutex<CacheInner>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl AstCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                map: HashMap::new(),
                order: VecDeque::new(),
                capacity: capacity.max(1),
            }),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Digest used as the cache key for `text`.
    pub fn content_hash(text: &str) -> String {
        blake3::hash(text.as_bytes()).to_hex().to_string()
    }

    /// Returns the cached document for `text`, parsing at most once
    /// per distinct content.
    pub fn get_or_parse(&self, text: &str) -> Arc<Document> {
        let key = Self::content_hash(text);
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(doc) = inner.map.get(&key).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            touch(&mut inner.order, &key);
            return doc;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let doc = Arc::new(parsers::parse(text));
        inner.map.insert(key.clone(), Arc::clone(&doc));
        inner.order.push_back(key);
        while inner.map.len() > inner.capacity {
            if let Some(evicted) = inner.order.pop_front() {
                inner.map.remove(&evicted);
                debug!(key = %evicted, "evicted least recently used document");
            } else {
                break;
            }
        }
        doc
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(hits, misses)` counters, monotonic for the cache lifetime.
    pub fn stats(&self) -> (usize, usize) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

fn touch(order: &mut VecDeque<String>, key: &str) {
    if let Some(pos) = order.iter().position(|k| k == key) {
        if let Some(k) = order.remove(pos) {
            order.push_back(k);
        }
    }
}
