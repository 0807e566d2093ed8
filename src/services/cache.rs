//! Template cache.
//!
//! Holds raw template sources and compiled templates in LRU caches keyed by
//! template name. Entries carry the modification stamps they were built
//! from and are only served while those stamps still match the store.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use crate::rendering::CompiledTemplate;

/// Default number of templates kept per cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Modification stamp of one template in an inheritance chain.
///
/// `None` records a template that was absent when the entry was built, so
/// creating it later invalidates the entry.
pub type ChainStamp = (String, Option<SystemTime>);

#[derive(Debug, Clone)]
struct CachedSource {
    modified: SystemTime,
    text: Arc<str>,
}

#[derive(Debug, Clone)]
struct CachedCompiled {
    stamps: Vec<ChainStamp>,
    template: Arc<CompiledTemplate>,
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Compiled lookups served from the cache.
    pub hits: u64,
    /// Compiled lookups that had to rebuild.
    pub misses: u64,
    /// Cached raw sources.
    pub sources: usize,
    /// Cached compiled templates.
    pub compiled: usize,
}

/// Mtime-validated template cache.
///
/// # Thread Safety
///
/// Both caches sit behind `RwLock`s. Lookups take the read lock and use
/// `peek`, so concurrent renders do not serialise on the cache.
///
/// # Lock Poisoning
///
/// A poisoned lock is treated as a miss on lookup and skipped on store.
/// Renders then read straight from the template store.
#[derive(Debug)]
pub struct TemplateCache {
    sources: RwLock<LruCache<String, CachedSource>>,
    compiled: RwLock<LruCache<String, CachedCompiled>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl TemplateCache {
    /// Creates a cache holding up to `capacity` templates; zero means one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            sources: RwLock::new(LruCache::new(cap)),
            compiled: RwLock::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached source if it was read at `modified`.
    #[must_use]
    pub fn source(&self, name: &str, modified: SystemTime) -> Option<Arc<str>> {
        let cache = self.sources.read().ok()?;
        cache
            .peek(name)
            .filter(|entry| entry.modified == modified)
            .map(|entry| Arc::clone(&entry.text))
    }

    /// Stores a raw source.
    pub fn store_source(&self, name: &str, modified: SystemTime, text: Arc<str>) {
        if let Ok(mut cache) = self.sources.write() {
            cache.put(name.to_string(), CachedSource { modified, text });
        }
    }

    /// Returns the compiled template if `is_current` accepts its stamps.
    ///
    /// A stale entry is evicted.
    pub fn compiled(
        &self,
        name: &str,
        is_current: impl Fn(&[ChainStamp]) -> bool,
    ) -> Option<Arc<CompiledTemplate>> {
        let entry = {
            let cache = self.compiled.read().ok()?;
            cache.peek(name).cloned()
        };

        match entry {
            Some(entry) if is_current(&entry.stamps) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(template = name, "Compiled template cache hit");
                Some(entry.template)
            },
            Some(_) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(template = name, "Compiled template is stale");
                self.invalidate(name);
                None
            },
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            },
        }
    }

    /// Stores a compiled template with the stamps of its chain.
    pub fn store_compiled(
        &self,
        name: &str,
        stamps: Vec<ChainStamp>,
        template: Arc<CompiledTemplate>,
    ) {
        if let Ok(mut cache) = self.compiled.write() {
            cache.put(name.to_string(), CachedCompiled { stamps, template });
        }
    }

    /// Drops every entry for a template.
    pub fn invalidate(&self, name: &str) {
        if let Ok(mut cache) = self.compiled.write() {
            cache.pop(name);
        }
        if let Ok(mut cache) = self.sources.write() {
            cache.pop(name);
        }
    }

    /// Drops every entry.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.compiled.write() {
            cache.clear();
        }
        if let Ok(mut cache) = self.sources.write() {
            cache.clear();
        }
    }

    /// Returns the current counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sources: self.sources.read().map_or(0, |c| c.len()),
            compiled: self.compiled.read().map_or(0, |c| c.len()),
        }
    }
}
