//! Pre-initialization checks.

use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

/// Initialization mode determines validation rules.
#[derive(Debug, Clone, Copy)]
pub enum InitMode {
    /// `manifest-css init` - add to the current directory, never overwriting
    CurrentDir,
    /// `manifest-css init <name>` - create a new subdirectory (must not exist)
    NewDir,
}

/// Validate that `files` (relative to `root`) can be written.
///
/// `CurrentDir` accepts an existing project (a `.git`, unrelated pages) as
/// long as none of the files would be overwritten.
pub fn validate_target(root: &Path, files: &[&str], mode: InitMode) -> Result<()> {
    match mode {
        InitMode::NewDir if root.exists() => bail!(
            "Directory '{}' already exists.\n\
             Choose a different name or run `manifest-css init` inside it.",
            root.display()
        ),
        InitMode::NewDir => Ok(()),
        InitMode::CurrentDir => {
            let existing: Vec<PathBuf> = files
                .iter()
                .map(|f| root.join(f))
                .filter(|p| p.exists())
                .collect();
            if existing.is_empty() {
                return Ok(());
            }
            let list: Vec<String> = existing.iter().map(|p| format!("  {}", p.display())).collect();
            bail!(
                "Refusing to overwrite existing files:\n{}\n\
                 Use `manifest-css init <name>` to create a new project directory.",
                list.join("\n")
            )
        }
    }
}
