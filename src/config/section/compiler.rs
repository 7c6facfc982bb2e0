//! `[compiler]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [compiler]
//! root_selector = ":root"     # Block holding theme variables
//! theme_selector = "@theme"   # Second block holding theme variables
//! debounce_ms = 50            # Quiet period before a recompile fires
//! min_interval_ms = 100       # Minimum time between two compiles
//! debug = false               # Verbose logging
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Theme parsing and recompile scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerSectionConfig {
    pub root_selector: String,
    pub theme_selector: String,
    pub debounce_ms: u64,
    pub min_interval_ms: u64,
    pub debug: bool,
}

impl Default for CompilerSectionConfig {
    fn default() -> Self {
        Self {
            root_selector: ":root".into(),
            theme_selector: "@theme".into(),
            debounce_ms: 50,
            min_interval_ms: 100,
            debug: false,
        }
    }
}

impl CompilerSectionConfig {
    pub const ROOT_SELECTOR: FieldPath = FieldPath::new("compiler.root_selector");
    pub const THEME_SELECTOR: FieldPath = FieldPath::new("compiler.theme_selector");
    pub const DEBOUNCE_MS: FieldPath = FieldPath::new("compiler.debounce_ms");

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.root_selector.trim().is_empty() {
            diag.error(Self::ROOT_SELECTOR, "must not be empty");
        }
        if self.theme_selector.trim().is_empty() {
            diag.error(Self::THEME_SELECTOR, "must not be empty");
        }
        if self.debounce_ms > 10_000 {
            diag.error_with_hint(
                Self::DEBOUNCE_MS,
                format!("{}ms is too long for a debounce window", self.debounce_ms),
                "values between 20 and 300 keep recompiles responsive",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_compiler_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.compiler.root_selector, ":root");
        assert_eq!(config.compiler.theme_selector, "@theme");
        assert_eq!(config.compiler.debounce_ms, 50);
        assert_eq!(config.compiler.min_interval_ms, 100);
        assert!(!config.compiler.debug);
    }

    #[test]
    fn test_compiler_validation() {
        let mut config = test_parse_config("[compiler]\ntheme_selector = \"\"\ndebounce_ms = 60000");
        let mut diag = crate::config::ConfigDiagnostics::new();
        config.compiler.validate(&mut diag);
        assert_eq!(diag.len(), 2);

        config.compiler.theme_selector = "@theme".into();
        config.compiler.debounce_ms = 30;
        let mut diag = crate::config::ConfigDiagnostics::new();
        config.compiler.validate(&mut diag);
        assert!(diag.is_empty());
    }
}
