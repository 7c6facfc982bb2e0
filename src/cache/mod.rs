//! Compiled CSS cache.
//!
//! Every successful full compile is stored under a key made of the sorted
//! class list and the theme hash. On a cold start the entry whose classes
//! overlap most with the current page (weighted with recency) is applied
//! before the real compile finishes.
//!
//! Persisted as a single JSON object under [`STORAGE_KEY`]:
//!
//! ```json
//! { "bg-primary,p-4-3f2a...": { "css": "...", "timestamp": 1700000000000, "themeHash": "3f2a..." } }
//! ```

mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, SystemTime};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::theme::ThemeHash;

/// Cache directory name (inside project root).
pub const CACHE_DIR: &str = ".manifest/cache";

/// Key of the persisted entry map.
pub const STORAGE_KEY: &str = "tailwind-cache";

const DAY_MS: f64 = 86_400_000.0;

/// Default bound on stored entries. Each entry holds a full stylesheet.
pub const DEFAULT_MAX_ENTRIES: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub css: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub theme_hash: ThemeHash,
}

impl CacheEntry {
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }
}

/// Relative weight of class overlap vs. recency in [`CacheStore::load_best`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub matched: f64,
    pub recency: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            matched: 0.7,
            recency: 0.3,
        }
    }
}

/// `"a,b,c-<themeHash>"` with classes sorted and deduplicated.
pub fn entry_key(classes: &[String], theme_hash: &ThemeHash) -> String {
    let mut sorted: Vec<&str> = classes.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();
    format!("{}-{}", sorted.join(","), theme_hash)
}

/// Class list encoded in an entry key.
fn key_classes(key: &str) -> FxHashSet<&str> {
    let classes = key.rsplit_once('-').map_or("", |(classes, _)| classes);
    classes.split(',').filter(|c| !c.is_empty()).collect()
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// In-memory entry map mirrored to a [`KeyValueStore`].
///
/// Storage failures never propagate: they are logged and behave as a miss.
pub struct CacheStore {
    store: Box<dyn KeyValueStore>,
    entries: BTreeMap<String, CacheEntry>,
    weights: ScoreWeights,
    max_entries: usize,
}

impl CacheStore {
    pub fn new(store: impl KeyValueStore + 'static, weights: ScoreWeights) -> Self {
        let entries = match load_entries(&store) {
            Ok(entries) => entries,
            Err(e) => {
                crate::log!("cache"; "ignoring unreadable cache: {}", e);
                BTreeMap::new()
            }
        };
        crate::debug!("cache"; "loaded {} entries", entries.len());
        Self {
            store: Box::new(store),
            entries,
            weights,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    /// Keep at most `max` entries (at least one), dropping the oldest first.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max.max(1);
        self
    }

    /// File-backed cache under `<root>/.manifest/cache` (or `dir` if absolute).
    pub fn open(dir: &Path, weights: ScoreWeights) -> Self {
        Self::new(FileStore::new(dir), weights)
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), ScoreWeights::default())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &CacheEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Record the CSS compiled for `classes` under `theme_hash`.
    pub fn save(&mut self, classes: &[String], theme_hash: &ThemeHash, css: &str) {
        self.save_at(classes, theme_hash, css, now_ms());
    }

    pub fn save_at(&mut self, classes: &[String], theme_hash: &ThemeHash, css: &str, now_ms: u64) {
        let key = entry_key(classes, theme_hash);
        let entry = CacheEntry {
            css: css.to_string(),
            timestamp: now_ms,
            theme_hash: theme_hash.clone(),
        };
        let previous = self.entries.insert(key.clone(), entry);
        let evicted = self.drop_oldest(Some(key.as_str()));

        if let Err(e) = self.persist() {
            crate::log!("cache"; "failed to save entry: {}", e);
            // Not persisted: drop it rather than diverge from storage
            match previous {
                Some(prev) => self.entries.insert(key, prev),
                None => self.entries.remove(&key),
            };
            self.entries.extend(evicted);
            return;
        }
        if !evicted.is_empty() {
            crate::debug!("cache"; "evicted {} old entries over the limit of {}", evicted.len(), self.max_entries);
        }
    }

    /// Remove the oldest entries beyond `max_entries`, never touching `keep`.
    fn drop_oldest(&mut self, keep: Option<&str>) -> Vec<(String, CacheEntry)> {
        let excess = self.entries.len().saturating_sub(self.max_entries);
        if excess == 0 {
            return Vec::new();
        }
        let mut by_age: Vec<(u64, String)> = self
            .entries
            .iter()
            .filter(|(k, _)| Some(k.as_str()) != keep)
            .map(|(k, e)| (e.timestamp, k.clone()))
            .collect();
        by_age.sort_unstable();

        by_age
            .into_iter()
            .take(excess)
            .filter_map(|(_, k)| self.entries.remove_entry(&k))
            .collect()
    }

    /// Best entry for `current` classes under `theme_hash`.
    pub fn load_best(&self, current: &[String], theme_hash: &ThemeHash) -> Option<&CacheEntry> {
        self.load_best_at(current, theme_hash, now_ms())
    }

    pub fn load_best_at(
        &self,
        current: &[String],
        theme_hash: &ThemeHash,
        now_ms: u64,
    ) -> Option<&CacheEntry> {
        let candidates = self
            .entries
            .iter()
            .filter(|(_, entry)| &entry.theme_hash == theme_hash);

        if current.is_empty() {
            return candidates.map(|(_, e)| e).max_by_key(|e| e.timestamp);
        }

        let current: FxHashSet<&str> = current.iter().map(String::as_str).collect();
        candidates
            .map(|(key, entry)| (self.score(&current, key, entry, now_ms), entry))
            .max_by(|(sa, a), (sb, b)| {
                sa.total_cmp(sb).then_with(|| a.timestamp.cmp(&b.timestamp))
            })
            .map(|(_, entry)| entry)
    }

    fn score(&self, current: &FxHashSet<&str>, key: &str, entry: &CacheEntry, now_ms: u64) -> f64 {
        let cached = key_classes(key);
        let overlap = current.iter().filter(|c| cached.contains(*c)).count();
        let matched = overlap as f64 / current.len() as f64;
        let age_days = entry.age_ms(now_ms) as f64 / DAY_MS;
        self.weights.matched * matched + self.weights.recency * (1.0 - age_days.min(1.0))
    }

    /// Drop entries older than `max_age`, then the oldest ones over the
    /// entry limit. Returns the number removed.
    pub fn evict_expired(&mut self, max_age: Duration) -> usize {
        self.evict_expired_at(max_age, now_ms())
    }

    pub fn evict_expired_at(&mut self, max_age: Duration, now_ms: u64) -> usize {
        let max_age = max_age.as_millis() as u64;
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.age_ms(now_ms) <= max_age);
        self.drop_oldest(None);

        let removed = before - self.entries.len();
        if removed > 0 {
            if let Err(e) = self.persist() {
                crate::log!("cache"; "failed to persist pruned cache: {}", e);
            }
            crate::debug!("cache"; "evicted {} expired entries", removed);
        }
        removed
    }

    /// Remove every entry, in memory and in storage.
    pub fn clear(&mut self) {
        self.entries.clear();
        if let Err(e) = self.store.remove(STORAGE_KEY) {
            crate::log!("cache"; "failed to clear cache: {}", e);
        }
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.entries)?;
        self.store.set(STORAGE_KEY, &json)
    }
}

fn load_entries(store: &impl KeyValueStore) -> Result<BTreeMap<String, CacheEntry>, StoreError> {
    match store.get(STORAGE_KEY)? {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(BTreeMap::new()),
    }
}
