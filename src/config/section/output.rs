//! `[output]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [output]
//! css = "utilities.css"   # Generated stylesheet
//! minify = false          # Minify with lightningcss
//! inject = false          # Also write <style> elements into the entry page
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub css: PathBuf,
    pub minify: bool,
    pub inject: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            css: "utilities.css".into(),
            minify: false,
            inject: false,
        }
    }
}

impl OutputConfig {
    pub const CSS: FieldPath = FieldPath::new("output.css");

    pub fn normalize(&mut self, root: &Path) {
        self.css = crate::utils::path::normalize_path(&root.join(&self.css));
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.css.extension().and_then(|e| e.to_str()) != Some("css") {
            diag.error_with_hint(
                Self::CSS,
                format!("`{}` is not a .css file", self.css.display()),
                "use a path like `utilities.css`",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_output_config() {
        let config = test_parse_config("[output]\ncss = \"dist/app.css\"\nminify = true");
        assert!(config.output.minify);
        assert!(!config.output.inject);

        let mut diag = ConfigDiagnostics::new();
        config.output.validate(&mut diag);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_output_requires_css_extension() {
        let config = test_parse_config("[output]\ncss = \"dist/app.txt\"");
        let mut diag = ConfigDiagnostics::new();
        config.output.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }
}
