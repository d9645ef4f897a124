use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::debug;
use lru::LruCache;
use pep_model::{Dataset, DatasetVariant};

use crate::source::{DataSource, LoadError};

/// Identity of a cached dataset: the file/sheet it came from and the schema variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source: DataSource,
    pub variant: DatasetVariant,
}

impl CacheKey {
    pub fn new(source: DataSource, variant: DatasetVariant) -> Self {
        Self { source, variant }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Max number of datasets kept in memory (default: 8). Values below 1 are treated as 1.
    pub max_entries: usize,
    /// How long a loaded dataset stays valid (default: one hour). `None` never expires.
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 8,
            ttl: Some(Duration::from_secs(3600)),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub evicted: u64,
    pub invalidated: u64,
}

#[derive(Debug)]
struct Entry {
    dataset: Arc<Dataset>,
    loaded_at: Instant,
}

#[derive(Debug)]
struct Inner {
    entries: LruCache<CacheKey, Entry>,
    stats: CacheStats,
}

/// Process-wide memo of loaded datasets.
///
/// Datasets are immutable once loaded and handed out as `Arc`s, so any number of renders can
/// read the same dataset concurrently. Failed loads are never cached.
#[derive(Debug)]
pub struct DatasetCache {
    config: CacheConfig,
    inner: Mutex<Inner>,
}

impl DatasetCache {
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Return the cached dataset for `key`, calling `load` on a miss or after expiry.
    ///
    /// The lock is not held while `load` runs. Two callers racing on the same cold key may
    /// both load; the later insert wins and both results are equivalent.
    pub fn get_or_load<F>(&self, key: &CacheKey, load: F) -> Result<Arc<Dataset>, LoadError>
    where
        F: FnOnce() -> Result<Dataset, LoadError>,
    {
        {
            let mut inner = self.inner.lock().expect("dataset cache mutex poisoned");
            let ttl = self.config.ttl;
            let lookup = inner
                .entries
                .get(key)
                .map(|entry| (Arc::clone(&entry.dataset), is_expired(entry, ttl)));
            match lookup {
                Some((dataset, false)) => {
                    inner.stats.hits += 1;
                    return Ok(dataset);
                }
                Some((_, true)) => {
                    inner.entries.pop(key);
                    inner.stats.expired += 1;
                    inner.stats.misses += 1;
                    debug!("cached {} dataset expired", key.variant);
                }
                None => inner.stats.misses += 1,
            }
        }

        let dataset = Arc::new(load()?);

        let mut inner = self.inner.lock().expect("dataset cache mutex poisoned");
        let entry = Entry {
            dataset: Arc::clone(&dataset),
            loaded_at: Instant::now(),
        };
        if let Some((evicted, _)) = inner.entries.push(key.clone(), entry) {
            if &evicted != key {
                inner.stats.evicted += 1;
                debug!(
                    "evicted cached {} dataset from `{}`",
                    evicted.variant,
                    evicted.source.path.display()
                );
            }
        }
        Ok(dataset)
    }

    /// Drop the cached dataset for `key`. Returns whether an entry was present.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let mut inner = self.inner.lock().expect("dataset cache mutex poisoned");
        let removed = inner.entries.pop(key).is_some();
        if removed {
            inner.stats.invalidated += 1;
        }
        removed
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("dataset cache mutex poisoned");
        let count = inner.entries.len() as u64;
        inner.entries.clear();
        inner.stats.invalidated += count;
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().expect("dataset cache mutex poisoned").stats
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("dataset cache mutex poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

fn is_expired(entry: &Entry, ttl: Option<Duration>) -> bool {
    ttl.is_some_and(|ttl| entry.loaded_at.elapsed() >= ttl)
}
