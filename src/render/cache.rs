use std::collections::HashMap;
use std::sync::Arc;

use crate::raster::buffer::ImageBuffer;

/// Size bound applied to each image cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheBudget {
    /// Maximum retained entries. `0` disables caching.
    pub max_entries: usize,
    /// Maximum retained pixel bytes across all entries. `0` disables caching.
    pub max_bytes: usize,
}

impl Default for CacheBudget {
    fn default() -> Self {
        Self {
            max_entries: 256,
            max_bytes: 256 * 1024 * 1024,
        }
    }
}

impl CacheBudget {
    /// Budget that keeps nothing.
    pub const DISABLED: Self = Self {
        max_entries: 0,
        max_bytes: 0,
    };

    fn is_disabled(self) -> bool {
        self.max_entries == 0 || self.max_bytes == 0
    }
}

/// Counters describing cache behaviour since creation (or the last `clear`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Live entries.
    pub entries: usize,
    /// Pixel bytes held by live entries.
    pub retained_bytes: usize,
    /// Successful lookups.
    pub hits: u64,
    /// Failed lookups.
    pub misses: u64,
    /// Entries dropped to honour the budget.
    pub evictions: u64,
    /// Inserts refused because the value alone exceeds the budget.
    pub rejected: u64,
}

struct Entry {
    image: Arc<ImageBuffer>,
    bytes: usize,
    last_used: u64,
}

/// Keyed image cache with least-recently-used eviction under a [`CacheBudget`].
///
/// At most one live entry exists per key; inserting an existing key releases the old buffer.
pub struct ImageCache {
    name: &'static str,
    budget: CacheBudget,
    entries: HashMap<String, Entry>,
    tick: u64,
    stats: CacheStats,
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("name", &self.name)
            .field("budget", &self.budget)
            .field("stats", &self.stats)
            .finish()
    }
}

impl ImageCache {
    /// Create an empty cache; `name` tags log events.
    pub fn new(name: &'static str, budget: CacheBudget) -> Self {
        Self {
            name,
            budget,
            entries: HashMap::new(),
            tick: 0,
            stats: CacheStats::default(),
        }
    }

    /// Current budget.
    pub fn budget(&self) -> CacheBudget {
        self.budget
    }

    /// Replace the budget, evicting immediately if the cache is now over it.
    pub fn set_budget(&mut self, budget: CacheBudget) {
        self.budget = budget;
        if budget.is_disabled() {
            let n = self.entries.len() as u64;
            self.drop_all();
            self.stats.evictions = self.stats.evictions.saturating_add(n);
            return;
        }
        self.evict_to_fit(0);
    }

    /// Look up `key`, refreshing its recency.
    pub fn get(&mut self, key: &str) -> Option<Arc<ImageBuffer>> {
        self.tick = self.tick.wrapping_add(1);
        match self.entries.get_mut(key) {
            Some(e) => {
                e.last_used = self.tick;
                self.stats.hits = self.stats.hits.saturating_add(1);
                tracing::trace!(cache = self.name, key, "cache hit");
                Some(e.image.clone())
            }
            None => {
                self.stats.misses = self.stats.misses.saturating_add(1);
                tracing::trace!(cache = self.name, key, "cache miss");
                None
            }
        }
    }

    /// Whether `key` is cached, without touching recency or counters.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Store a complete image under `key`.
    pub fn insert(&mut self, key: impl Into<String>, image: Arc<ImageBuffer>) {
        let key = key.into();
        let bytes = image.byte_len();
        self.remove(&key);

        if self.budget.is_disabled() || bytes > self.budget.max_bytes {
            self.stats.rejected = self.stats.rejected.saturating_add(1);
            return;
        }

        self.evict_to_fit(bytes);
        self.tick = self.tick.wrapping_add(1);
        self.entries.insert(
            key,
            Entry {
                image,
                bytes,
                last_used: self.tick,
            },
        );
        self.stats.entries = self.entries.len();
        self.stats.retained_bytes = self.stats.retained_bytes.saturating_add(bytes);
    }

    /// Remove one entry.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(e) => {
                self.stats.entries = self.entries.len();
                self.stats.retained_bytes = self.stats.retained_bytes.saturating_sub(e.bytes);
                true
            }
            None => false,
        }
    }

    /// Remove every entry whose key starts with `prefix`; returns how many were removed.
    pub fn remove_prefix(&mut self, prefix: &str) -> usize {
        let keys: Vec<String> = self
            .entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        for k in &keys {
            self.remove(k);
        }
        keys.len()
    }

    /// Drop every entry and reset counters.
    pub fn clear(&mut self) {
        self.drop_all();
        self.stats = CacheStats::default();
    }

    /// Live entry count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Retained pixel memory in MiB.
    pub fn memory_mb(&self) -> f64 {
        self.stats.retained_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Snapshot of counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    fn drop_all(&mut self) {
        self.entries.clear();
        self.stats.entries = 0;
        self.stats.retained_bytes = 0;
    }

    fn evict_to_fit(&mut self, incoming: usize) {
        while !self.entries.is_empty()
            && (self.entries.len() + usize::from(incoming > 0) > self.budget.max_entries
                || self.stats.retained_bytes.saturating_add(incoming) > self.budget.max_bytes)
        {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            self.remove(&oldest);
            self.stats.evictions = self.stats.evictions.saturating_add(1);
            tracing::debug!(cache = self.name, key = %oldest, "evicted");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cache.rs"]
mod tests;
