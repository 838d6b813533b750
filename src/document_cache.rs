//! Token stream caching with LRU eviction and content-hash invalidation
//!
//! Every definition request may tokenize several files (the originating file,
//! project sources, includes, member modules). Streams are cached so that an
//! unchanged file is tokenized once.
//!
//! # Architecture
//!
//! ```text
//! (path, text)
//!     ↓
//! blake3 hash of text
//!     ↓
//! lookup (normalized path, ContentHash)
//!     ├─ hit  → Arc<TokenStream>
//!     └─ miss → tokenize + enrich → insert (LRU eviction when full)
//! ```
//!
//! - **Key**: `(PathBuf, ContentHash)`. Editing a file changes its hash, so a
//!   stale stream is never returned; it ages out or is dropped by `remove`.
//! - **Thread safety**: `lru::LruCache` and the statistics sit behind
//!   `parking_lot::RwLock`s.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use blake3::Hash as Blake3Hash;
use lru::LruCache;
use parking_lot::RwLock;
use tracing::trace;

use crate::ir::token_stream::TokenStream;
use crate::project::normalize_path;

const DEFAULT_CAPACITY: usize = 64;

/// Content hash for cache invalidation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(Blake3Hash);

impl ContentHash {
    pub fn of(content: &str) -> Self {
        Self(blake3::hash(content.as_bytes()))
    }

    pub fn as_blake3(&self) -> &Blake3Hash {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    content_hash: ContentHash,
}

/// Cache statistics for monitoring and debugging
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total_queries: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub current_size: usize,
    pub max_capacity: usize,
}

impl CacheStats {
    /// Hit rate between 0.0 and 1.0
    pub fn hit_rate(&self) -> f64 {
        if self.total_queries == 0 {
            0.0
        } else {
            self.hits as f64 / self.total_queries as f64
        }
    }
}

/// Thread-safe LRU cache of token streams
#[derive(Debug)]
pub struct TokenCache {
    cache: RwLock<LruCache<CacheKey, Arc<TokenStream>>>,
    stats: RwLock<CacheStats>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RwLock::new(LruCache::new(capacity)),
            stats: RwLock::new(CacheStats {
                max_capacity: capacity.get(),
                ..Default::default()
            }),
        }
    }

    pub fn get(&self, path: &Path, content_hash: &ContentHash) -> Option<Arc<TokenStream>> {
        let key = CacheKey {
            path: normalize_path(path),
            content_hash: *content_hash,
        };
        let found = self.cache.write().get(&key).cloned();

        let mut stats = self.stats.write();
        stats.total_queries += 1;
        if found.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        found
    }

    pub fn insert(&self, path: &Path, content_hash: ContentHash, stream: Arc<TokenStream>) {
        let key = CacheKey {
            path: normalize_path(path),
            content_hash,
        };
        let mut cache = self.cache.write();
        let mut stats = self.stats.write();
        // `push` also hands back the old value when the key was already present
        if let Some((evicted, _)) = cache.push(key.clone(), stream) {
            if evicted != key {
                trace!("Evicted token stream for {:?}", evicted.path);
                stats.evictions += 1;
            }
        }
        stats.current_size = cache.len();
    }

    /// Cached stream for `text`, tokenizing on a miss.
    pub fn get_or_tokenize(&self, path: &Path, text: &str) -> Arc<TokenStream> {
        let hash = ContentHash::of(text);
        if let Some(stream) = self.get(path, &hash) {
            return stream;
        }
        let stream = Arc::new(crate::tokenize(text));
        self.insert(path, hash, stream.clone());
        stream
    }

    /// Drops every version of `path`
    pub fn remove(&self, path: &Path) {
        let path = normalize_path(path);
        let mut cache = self.cache.write();
        let mut stats = self.stats.write();
        let stale: Vec<CacheKey> = cache
            .iter()
            .filter(|(k, _)| k.path == path)
            .map(|(k, _)| k.clone())
            .collect();
        for key in stale {
            cache.pop(&key);
        }
        stats.current_size = cache.len();
    }

    pub fn clear(&self) {
        let mut cache = self.cache.write();
        let mut stats = self.stats.write();
        cache.clear();
        stats.current_size = 0;
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_deterministic() {
        let text = "Main PROCEDURE\n  CODE\n";
        assert_eq!(ContentHash::of(text), ContentHash::of(text));
        assert_ne!(ContentHash::of(text), ContentHash::of("Other PROCEDURE\n"));
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = TokenCache::new();
        let path = Path::new("/app/Main.clw");
        let first = cache.get_or_tokenize(path, "Main PROCEDURE\n");
        let second = cache.get_or_tokenize(path, "Main PROCEDURE\n");
        assert!(Arc::ptr_eq(&first, &second));

        let stats = cache.stats();
        assert_eq!(stats.total_queries, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_edit_invalidates() {
        let cache = TokenCache::new();
        let path = Path::new("/app/Main.clw");
        let before = cache.get_or_tokenize(path, "A LONG\n");
        let after = cache.get_or_tokenize(path, "B LONG\n");
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.tokens()[0].text, "B");
        assert_eq!(cache.len(), 2);

        cache.remove(path);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_eviction_counts() {
        let cache = TokenCache::with_capacity(2);
        cache.get_or_tokenize(Path::new("/a.clw"), "A LONG\n");
        cache.get_or_tokenize(Path::new("/b.clw"), "B LONG\n");
        cache.get_or_tokenize(Path::new("/c.clw"), "C LONG\n");
        let stats = cache.stats();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.current_size, 2);
        assert!(cache.get(Path::new("/a.clw"), &ContentHash::of("A LONG\n")).is_none());
    }

    #[test]
    fn test_reinserting_same_key_is_not_an_eviction() {
        let cache = TokenCache::with_capacity(2);
        let hash = ContentHash::of("A LONG\n");
        let stream = Arc::new(crate::tokenize("A LONG\n"));
        cache.insert(Path::new("/a.clw"), hash, stream.clone());
        cache.insert(Path::new("/a.clw"), hash, stream);
        assert_eq!(cache.stats().evictions, 0);
        cache.clear();
        assert_eq!(cache.stats().current_size, 0);
    }
}
