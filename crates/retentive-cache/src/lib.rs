//! Bounded document cache
//!
//! LRU cache for fetched URLs and files, capped by total bytes and entry
//! count. Eviction order is deterministic: least-recent access first, with
//! the lower access count losing ties. Large entries are gzip-compressed on
//! the way in and inflated on the way out.

use retentive_core::config::CacheSettings;
use retentive_core::{format_bytes, gzip_compress, gzip_decompress};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fraction of the byte cap a single entry may occupy
const MAX_ENTRY_FRACTION: f64 = 0.80;

#[derive(Debug, Clone)]
struct CacheEntry {
    content: Vec<u8>,
    compressed: bool,
    /// Stored size in bytes (compressed size when compressed)
    size: usize,
    /// Logical tick of the last read or write
    last_access: u64,
    access_count: u64,
}

/// Cache statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entry_count: usize,
    pub total_bytes: usize,
    /// Fill level against the byte cap, 0.0 to 1.0
    pub utilization: f64,
    pub average_entry_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub rejected: u64,
}

/// Deterministic snapshot entry, ordered by URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub url: String,
    pub size: usize,
    pub compressed: bool,
    pub access_count: u64,
}

/// LRU document cache
pub struct DocumentCache {
    settings: CacheSettings,
    entries: HashMap<String, CacheEntry>,
    total_bytes: usize,
    clock: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    rejected: u64,
}

impl DocumentCache {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            entries: HashMap::new(),
            total_bytes: 0,
            clock: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
            rejected: 0,
        }
    }

    /// Insert a document, evicting in LRU order until it fits. Returns
    /// whether the entry was stored.
    pub fn insert(&mut self, url: &str, content: &str) -> bool {
        let key = normalize_url(url);
        let raw_size = content.len();

        let per_entry_cap = (self.settings.max_bytes as f64 * MAX_ENTRY_FRACTION) as usize;
        if raw_size > per_entry_cap {
            self.rejected += 1;
            tracing::warn!(
                url = %key,
                size = raw_size,
                cap = per_entry_cap,
                "document too large for cache; rejected"
            );
            return false;
        }

        // Overwrites release the old accounting before the new is added.
        if let Some(old) = self.entries.remove(&key) {
            self.total_bytes -= old.size;
        }

        let (stored, compressed) = if raw_size > self.settings.compress_threshold {
            match gzip_compress(content.as_bytes()) {
                Ok(packed) if packed.len() < raw_size => (packed, true),
                _ => (content.as_bytes().to_vec(), false),
            }
        } else {
            (content.as_bytes().to_vec(), false)
        };
        let size = stored.len();

        while (self.total_bytes + size > self.settings.max_bytes
            || self.entries.len() + 1 > self.settings.max_entries)
            && !self.entries.is_empty()
        {
            self.evict_one();
        }

        self.clock += 1;
        self.total_bytes += size;
        self.entries.insert(
            key,
            CacheEntry {
                content: stored,
                compressed,
                size,
                last_access: self.clock,
                access_count: 1,
            },
        );
        true
    }

    /// Read a document, bumping its recency
    pub fn get(&mut self, url: &str) -> Option<String> {
        let key = normalize_url(url);
        self.clock += 1;
        let clock = self.clock;
        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.last_access = clock;
                entry.access_count += 1;
                self.hits += 1;
                let bytes = if entry.compressed {
                    match gzip_decompress(&entry.content) {
                        Ok(inflated) => inflated,
                        Err(e) => {
                            tracing::error!(url = %key, "cache entry failed to inflate: {e}");
                            return None;
                        }
                    }
                } else {
                    entry.content.clone()
                };
                Some(String::from_utf8_lossy(&bytes).into_owned())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(&normalize_url(url))
    }

    pub fn remove(&mut self, url: &str) -> bool {
        match self.entries.remove(&normalize_url(url)) {
            Some(entry) => {
                self.total_bytes -= entry.size;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.entries.len(),
            total_bytes: self.total_bytes,
            utilization: self.total_bytes as f64 / self.settings.max_bytes as f64,
            average_entry_size: if self.entries.is_empty() {
                0
            } else {
                self.total_bytes / self.entries.len()
            },
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            rejected: self.rejected,
        }
    }

    /// URL-ordered snapshot for state serialization
    pub fn snapshot(&self) -> Vec<SnapshotEntry> {
        let mut entries: Vec<SnapshotEntry> = self
            .entries
            .iter()
            .map(|(url, entry)| SnapshotEntry {
                url: url.clone(),
                size: entry.size,
                compressed: entry.compressed,
                access_count: entry.access_count,
            })
            .collect();
        entries.sort_by(|a, b| a.url.cmp(&b.url));
        entries
    }

    /// Reducer form: apply a batch of url -> content updates in place
    pub fn reduce(&mut self, updates: &[(String, String)]) {
        for (url, content) in updates {
            self.insert(url, content);
        }
    }

    /// Drop the least-recently-used entry; ties go to the lower access count
    fn evict_one(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, e)| (e.last_access, e.access_count))
            .map(|(k, _)| k.clone());
        if let Some(key) = victim {
            if let Some(entry) = self.entries.remove(&key) {
                self.total_bytes -= entry.size;
                self.evictions += 1;
                tracing::debug!(
                    url = %key,
                    size = %format_bytes(entry.size as u64),
                    "evicted document"
                );
            }
        }
    }
}

/// Canonical key form: trimmed, with any trailing slash removed
fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    let stripped = trimmed.strip_suffix('/').filter(|s| !s.is_empty());
    stripped.unwrap_or(trimmed).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_cache(max_bytes: usize, max_entries: usize) -> DocumentCache {
        DocumentCache::new(CacheSettings {
            max_bytes,
            max_entries,
            compress_threshold: usize::MAX,
        })
    }

    #[test]
    fn test_insert_and_get() {
        let mut cache = small_cache(1_000, 10);
        assert!(cache.insert("https://a", "alpha"));
        assert_eq!(cache.get("https://a").as_deref(), Some("alpha"));
        assert_eq!(cache.get("https://missing"), None);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_lru_eviction_order() {
        let mut cache = small_cache(300, 10);
        cache.insert("a", &"x".repeat(100));
        cache.insert("b", &"x".repeat(100));
        cache.insert("c", &"x".repeat(100));
        cache.get("a");
        cache.insert("d", &"x".repeat(100));

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"), "b is least recently used");
        assert!(cache.contains("c"));
        assert!(cache.contains("d"));
    }

    #[test]
    fn test_bounds_hold_after_every_write() {
        let mut cache = small_cache(500, 4);
        for i in 0..50 {
            cache.insert(&format!("url-{i}"), &"y".repeat(120));
            assert!(cache.total_bytes() <= 500);
            assert!(cache.len() <= 4);
        }
    }

    #[test]
    fn test_insert_at_exact_capacity_no_eviction() {
        let mut cache = small_cache(300, 10);
        cache.insert("a", &"x".repeat(100));
        cache.insert("b", &"x".repeat(100));
        cache.insert("c", &"x".repeat(100));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_insert_one_byte_over_evicts_one() {
        let mut cache = small_cache(300, 10);
        cache.insert("a", &"x".repeat(100));
        cache.insert("b", &"x".repeat(100));
        cache.insert("c", &"x".repeat(99));
        cache.insert("d", &"x".repeat(2));
        assert_eq!(cache.stats().evictions, 1);
        assert!(!cache.contains("a"));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_oversized_entry_rejected() {
        let mut cache = small_cache(1_000, 10);
        // 80% of 1000 = 800: an 801-byte document is refused.
        assert!(!cache.insert("big", &"z".repeat(801)));
        assert!(cache.insert("fits", &"z".repeat(800)));
        assert_eq!(cache.stats().rejected, 1);
    }

    #[test]
    fn test_eviction_follows_recency_not_insertion() {
        let mut cache = small_cache(300, 3);
        cache.insert("a", &"x".repeat(100));
        cache.insert("b", &"x".repeat(100));
        cache.get("b");
        cache.get("a");
        cache.get("b");
        cache.insert("c", &"x".repeat(100));
        // a was read less recently than b; the next insert evicts a.
        cache.insert("d", &"x".repeat(100));
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("d"));
    }

    #[test]
    fn test_overwrite_subtracts_old_size() {
        let mut cache = small_cache(1_000, 10);
        cache.insert("a", &"x".repeat(400));
        cache.insert("a", &"x".repeat(100));
        assert_eq!(cache.total_bytes(), 100);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_compression_over_threshold() {
        let mut cache = DocumentCache::new(CacheSettings {
            max_bytes: 100_000,
            max_entries: 10,
            compress_threshold: 500,
        });
        let doc = "compressible line of text\n".repeat(100);
        cache.insert("doc", &doc);
        assert!(
            cache.total_bytes() < doc.len() / 2,
            "stored size should reflect real compression: {}",
            cache.total_bytes()
        );
        assert_eq!(cache.get("doc").as_deref(), Some(doc.as_str()));
    }

    #[test]
    fn test_url_normalization() {
        let mut cache = small_cache(1_000, 10);
        cache.insert("https://site/page/", "body");
        assert!(cache.contains("https://site/page"));
        assert_eq!(cache.get("  https://site/page  ").as_deref(), Some("body"));
    }

    #[test]
    fn test_snapshot_ordered_by_url() {
        let mut cache = small_cache(1_000, 10);
        cache.insert("zebra", "1");
        cache.insert("alpha", "2");
        cache.insert("mango", "3");
        let snapshot = cache.snapshot();
        let urls: Vec<&str> = snapshot.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["alpha", "mango", "zebra"]);
    }

    #[test]
    fn test_reducer_applies_updates_in_place() {
        let mut cache = small_cache(1_000, 10);
        cache.reduce(&[
            ("a".to_string(), "one".to_string()),
            ("b".to_string(), "two".to_string()),
        ]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("b").as_deref(), Some("two"));
    }

    #[test]
    fn test_entry_count_cap() {
        let mut cache = small_cache(100_000, 3);
        for i in 0..5 {
            cache.insert(&format!("u{i}"), "content");
        }
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains("u0"));
        assert!(!cache.contains("u1"));
        assert!(cache.contains("u4"));
    }

    #[test]
    fn test_stats_shapes() {
        let mut cache = small_cache(1_000, 10);
        cache.insert("a", &"x".repeat(100));
        cache.insert("b", &"x".repeat(300));
        let stats = cache.stats();
        assert_eq!(stats.entry_count, 2);
        assert_eq!(stats.total_bytes, 400);
        assert!((stats.utilization - 0.4).abs() < 1e-9);
        assert_eq!(stats.average_entry_size, 200);
    }
}
