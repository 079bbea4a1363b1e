//! In-memory document cache for chaining tool calls

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// A cached PDF and the file name it should be offered under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedDocument {
    pub data: Vec<u8>,
    pub file_name: String,
}

impl CachedDocument {
    pub fn new(data: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            data,
            file_name: file_name.into(),
        }
    }
}

struct Entries {
    lru: LruCache<String, CachedDocument>,
    total_bytes: usize,
}

impl Entries {
    fn take(&mut self, key: &str) -> Option<CachedDocument> {
        let doc = self.lru.pop(key)?;
        self.total_bytes = self.total_bytes.saturating_sub(doc.data.len());
        Some(doc)
    }
}

/// LRU cache bounded by entry count and total byte size
pub struct DocumentCache {
    entries: Mutex<Entries>,
    max_bytes: usize,
}

impl DocumentCache {
    pub fn new(max_entries: usize, max_bytes: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(Entries {
                lru: LruCache::new(capacity),
                total_bytes: 0,
            }),
            max_bytes,
        }
    }

    /// Store `doc` under a fresh key.
    ///
    /// Returns `None` when the document alone exceeds the byte budget;
    /// otherwise least recently used entries are evicted to make room.
    pub fn insert(&self, doc: CachedDocument) -> Option<String> {
        let size = doc.data.len();
        if size > self.max_bytes {
            tracing::debug!(size, max_bytes = self.max_bytes, "document too large to cache");
            return None;
        }

        let mut entries = self.entries.lock();
        while entries.total_bytes + size > self.max_bytes {
            let Some((_, evicted)) = entries.lru.pop_lru() else {
                break;
            };
            entries.total_bytes = entries.total_bytes.saturating_sub(evicted.data.len());
        }

        let key = loop {
            let candidate = uuid::Uuid::new_v4().to_string();
            if !entries.lru.contains(&candidate) {
                break candidate;
            }
        };
        if let Some((_, evicted)) = entries.lru.push(key.clone(), doc) {
            entries.total_bytes = entries.total_bytes.saturating_sub(evicted.data.len());
        }
        entries.total_bytes += size;
        Some(key)
    }

    pub fn get(&self, key: &str) -> Option<CachedDocument> {
        self.entries.lock().lru.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().lru.contains(key)
    }

    pub fn remove(&self, key: &str) -> Option<CachedDocument> {
        self.entries.lock().take(key)
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.lru.clear();
        entries.total_bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().lru.is_empty()
    }

    /// Sum of cached document sizes
    pub fn total_bytes(&self) -> usize {
        self.entries.lock().total_bytes
    }
}
