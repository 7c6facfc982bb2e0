//! `[cache]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [cache]
//! enable = true
//! dir = ".manifest/cache"
//! max_age_hours = 24
//! max_entries = 16        # Oldest entries beyond this are dropped on save
//! match_weight = 0.7      # Weight of class overlap when picking a cold-start entry
//! recency_weight = 0.3    # Weight of entry age (normalized to one day)
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::{CACHE_DIR, CacheStore, DEFAULT_MAX_ENTRIES, ScoreWeights};
use crate::config::{ConfigDiagnostics, FieldPath};

const MAX_AGE_HOURS_LIMIT: u64 = 24 * 366;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enable: bool,
    pub dir: PathBuf,
    pub max_age_hours: u64,
    pub max_entries: usize,
    pub match_weight: f64,
    pub recency_weight: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let weights = ScoreWeights::default();
        Self {
            enable: true,
            dir: CACHE_DIR.into(),
            max_age_hours: 24,
            max_entries: DEFAULT_MAX_ENTRIES,
            match_weight: weights.matched,
            recency_weight: weights.recency,
        }
    }
}

impl CacheConfig {
    pub const MAX_AGE_HOURS: FieldPath = FieldPath::new("cache.max_age_hours");
    pub const MAX_ENTRIES: FieldPath = FieldPath::new("cache.max_entries");
    pub const MATCH_WEIGHT: FieldPath = FieldPath::new("cache.match_weight");
    pub const RECENCY_WEIGHT: FieldPath = FieldPath::new("cache.recency_weight");

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_hours.saturating_mul(3600))
    }

    /// Open the configured cache directory with these settings.
    pub fn open_store(&self) -> CacheStore {
        CacheStore::open(&self.dir, self.weights()).with_max_entries(self.max_entries)
    }

    pub fn weights(&self) -> ScoreWeights {
        ScoreWeights {
            matched: self.match_weight,
            recency: self.recency_weight,
        }
    }

    pub fn normalize(&mut self, root: &Path) {
        self.dir = crate::utils::path::normalize_path(&root.join(&self.dir));
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.max_age_hours == 0 {
            diag.error(Self::MAX_AGE_HOURS, "must be at least 1 hour");
        } else if self.max_age_hours > MAX_AGE_HOURS_LIMIT {
            diag.error_with_hint(
                Self::MAX_AGE_HOURS,
                format!("{} hours is out of range", self.max_age_hours),
                format!("use at most {MAX_AGE_HOURS_LIMIT} (about a year)"),
            );
        }
        if self.max_entries == 0 {
            diag.error(Self::MAX_ENTRIES, "must keep at least 1 entry");
        }
        for (field, weight) in [
            (Self::MATCH_WEIGHT, self.match_weight),
            (Self::RECENCY_WEIGHT, self.recency_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                diag.error(field, format!("weight must be a non-negative number, got {weight}"));
            }
        }
        if self.match_weight + self.recency_weight <= 0.0 {
            diag.error_with_hint(
                Self::MATCH_WEIGHT,
                "match and recency weights are both zero",
                "the defaults are 0.7 and 0.3",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};
    use std::time::Duration;

    #[test]
    fn test_cache_defaults() {
        let config = test_parse_config("");
        assert!(config.cache.enable);
        assert_eq!(config.cache.max_age(), Duration::from_secs(24 * 3600));
        assert_eq!(config.cache.weights().matched, 0.7);
        assert_eq!(config.cache.weights().recency, 0.3);
        assert_eq!(config.cache.max_entries, 16);
    }

    #[test]
    fn test_cache_huge_max_age() {
        let config = test_parse_config(&format!("[cache]\nmax_age_hours = {}", i64::MAX));
        assert_eq!(config.cache.max_age(), Duration::from_secs(u64::MAX));

        let mut diag = ConfigDiagnostics::new();
        config.cache.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }

    #[test]
    fn test_cache_zero_entries_rejected() {
        let config = test_parse_config("[cache]\nmax_entries = 0");
        let mut diag = ConfigDiagnostics::new();
        config.cache.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }

    #[test]
    fn test_cache_weight_validation() {
        let config = test_parse_config("[cache]\nmatch_weight = -1.0\nrecency_weight = 0.0");
        let mut diag = ConfigDiagnostics::new();
        config.cache.validate(&mut diag);
        assert_eq!(diag.len(), 2);
    }
}
