//! Configuration file generation.
//!
//! Creates manifest.toml and ignore files for new projects.

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::cache::CACHE_DIR;
use crate::config::{CONFIG_FILE, ProjectConfig};

/// Files to write ignore patterns to
const IGNORE_FILES: &[&str] = &[".gitignore", ".ignore"];

/// Generate manifest.toml content: header plus every section at its defaults.
pub fn generate_config_template() -> Result<String> {
    let mut config = ProjectConfig::default();
    config.scan.theme = vec!["styles/theme.css".into()];

    let body = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    let mut out = format!(
        "# manifest-css configuration file (v{})\n\n",
        env!("CARGO_PKG_VERSION")
    );
    out.push_str(&body);
    Ok(out)
}

/// Write default manifest.toml configuration
pub fn write_config(root: &Path) -> Result<()> {
    let content = generate_config_template()?;

    let path = root.join(CONFIG_FILE);
    fs::write(&path, content)
        .with_context(|| format!("Failed to write config file '{}'", path.display()))?;

    Ok(())
}

/// Add the cache directory to ignore files, keeping existing entries
pub fn write_ignore_files(root: &Path) -> Result<()> {
    let cache_root = CACHE_DIR.split('/').next().unwrap_or(CACHE_DIR);
    let line = format!("/{cache_root}");

    for file in IGNORE_FILES {
        let path = root.join(file);
        let mut content = fs::read_to_string(&path).unwrap_or_default();
        if content.lines().any(|l| l.trim() == line) {
            continue;
        }
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(&line);
        content.push('\n');
        fs::write(&path, content)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_template_round_trips_through_parser() {
        let template = generate_config_template().unwrap();
        assert!(template.contains("[compiler]"));
        assert!(template.contains("[output]"));

        let config = ProjectConfig::from_str(&template).unwrap();
        assert_eq!(config.scan.theme.len(), 1);
        assert_eq!(config.compiler.debounce_ms, 50);
    }

    #[test]
    fn test_write_ignore_files() {
        let temp = TempDir::new().unwrap();
        write_ignore_files(temp.path()).unwrap();
        let content = fs::read_to_string(temp.path().join(".gitignore")).unwrap();
        assert_eq!(content, "/.manifest\n");

        fs::write(temp.path().join(".ignore"), "target").unwrap();
        write_ignore_files(temp.path()).unwrap();
        write_ignore_files(temp.path()).unwrap();
        let content = fs::read_to_string(temp.path().join(".ignore")).unwrap();
        assert_eq!(content, "target\n/.manifest\n");
    }
}
