//! `[scan]` section configuration.
//!
//! Where classes come from and which of them (and which DOM changes) are
//! ignored.
//!
//! # Example
//!
//! ```toml
//! [scan]
//! entry = "index.html"
//! components = ["components"]
//! theme = ["styles/theme.css"]
//! ignored_class_patterns = ["^hljs", "^language-", "^token$", "^copy-"]
//! placeholder_prefixes = ["$", "{{", "${", "@", ":"]
//! ignored_element_selectors = ["pre", "code", ".hljs", "[data-no-utilities]"]
//! significant_selectors = ["[x-data]", "[data-component]", "[x-component]"]
//! ignored_attributes = ["id", "aria-*", "data-order", "style"]
//! host_markers = ["alpine"]
//! host_wait_ms = 5000
//! host_poll_ms = 100
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::scan::{AttributeFilter, ClassFilter, MutationRules, Selector};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Entry page, relative to the project root.
    pub entry: PathBuf,
    /// Directories searched (recursively) for component `.html` files.
    pub components: Vec<PathBuf>,
    /// Stylesheets holding theme variables, besides inline `<style>` blocks.
    pub theme: Vec<PathBuf>,
    pub ignored_class_patterns: Vec<String>,
    pub placeholder_prefixes: Vec<String>,
    pub ignored_element_selectors: Vec<String>,
    pub significant_selectors: Vec<String>,
    /// Attribute names whose mutations are dropped (`*` suffix = prefix match).
    pub ignored_attributes: Vec<String>,
    /// Substrings of the entry page that reveal the host reactivity library.
    pub host_markers: Vec<String>,
    pub host_wait_ms: u64,
    pub host_poll_ms: u64,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            entry: "index.html".into(),
            components: vec!["components".into()],
            theme: Vec::new(),
            ignored_class_patterns: strings(&["^hljs", "^language-", "^token$", "^copy-"]),
            placeholder_prefixes: strings(&["$", "{{", "${", "@", ":"]),
            ignored_element_selectors: strings(&["pre", "code", ".hljs", "[data-no-utilities]"]),
            significant_selectors: strings(&["[x-data]", "[data-component]", "[x-component]"]),
            ignored_attributes: strings(&["id", "aria-*", "data-order", "style"]),
            host_markers: strings(&["alpine"]),
            host_wait_ms: 5000,
            host_poll_ms: 100,
        }
    }
}

impl ScanConfig {
    pub const ENTRY: FieldPath = FieldPath::new("scan.entry");
    pub const IGNORED_CLASS_PATTERNS: FieldPath = FieldPath::new("scan.ignored_class_patterns");
    pub const IGNORED_ELEMENT_SELECTORS: FieldPath =
        FieldPath::new("scan.ignored_element_selectors");
    pub const SIGNIFICANT_SELECTORS: FieldPath = FieldPath::new("scan.significant_selectors");
    pub const HOST_POLL_MS: FieldPath = FieldPath::new("scan.host_poll_ms");

    pub fn host_wait(&self) -> Duration {
        Duration::from_millis(self.host_wait_ms)
    }

    pub fn host_poll(&self) -> Duration {
        Duration::from_millis(self.host_poll_ms)
    }

    pub fn class_filter(&self) -> ClassFilter {
        ClassFilter::new(&self.ignored_class_patterns, &self.placeholder_prefixes)
    }

    /// Mutation rules; selectors that fail to parse are skipped (validation
    /// reports them).
    pub fn mutation_rules(&self) -> MutationRules {
        MutationRules {
            ignored_attributes: AttributeFilter::new(self.ignored_attributes.iter().cloned()),
            ignored_elements: parse_selectors(&self.ignored_element_selectors),
            significant: parse_selectors(&self.significant_selectors),
        }
    }

    pub fn normalize(&mut self, root: &Path) {
        use crate::utils::path::normalize_path;
        self.entry = normalize_path(&root.join(&self.entry));
        for dir in &mut self.components {
            *dir = normalize_path(&root.join(&*dir));
        }
        for file in &mut self.theme {
            *file = normalize_path(&root.join(&*file));
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.entry.is_file() {
            diag.error_with_hint(
                Self::ENTRY,
                format!("entry page `{}` not found", self.entry.display()),
                "run `manifest-css init` or point `scan.entry` at your index.html",
            );
        }
        for pattern in &self.ignored_class_patterns {
            if regex::Regex::new(pattern).is_err() {
                diag.warn(
                    Self::IGNORED_CLASS_PATTERNS,
                    format!("`{pattern}` is not a valid regex, matched literally as a prefix"),
                );
            }
        }
        for (field, list) in [
            (Self::IGNORED_ELEMENT_SELECTORS, &self.ignored_element_selectors),
            (Self::SIGNIFICANT_SELECTORS, &self.significant_selectors),
        ] {
            for source in list {
                if let Err(e) = Selector::parse(source) {
                    diag.error(field, e.to_string());
                }
            }
        }
        if self.host_poll_ms == 0 {
            diag.error(Self::HOST_POLL_MS, "must be greater than 0");
        }
    }
}

fn parse_selectors(sources: &[String]) -> Vec<Selector> {
    sources
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
}
