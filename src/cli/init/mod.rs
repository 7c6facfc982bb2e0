//! Project initialization module.
//!
//! Creates a new project with default configuration.
//!
//! # Module Structure
//!
//! - [`validate`]: Pre-initialization validation
//! - [`structure`]: Entry page, component and theme files
//! - [`config`]: Configuration file generation

mod config;
mod structure;
mod validate;

use crate::config::{CONFIG_FILE, ProjectConfig};
use crate::log;
use anyhow::Result;

pub use validate::InitMode;

/// Create a new project with default structure
///
/// # Steps
/// 1. Validate target directory (nothing gets overwritten)
/// 2. Create entry page, component and theme
/// 3. Write configuration and ignore files
///
/// If `dry_run` is true, only prints the config template to stdout
pub fn new_project(project: &ProjectConfig, has_name: bool, dry_run: bool) -> Result<()> {
    if dry_run {
        print!("{}", config::generate_config_template()?);
        return Ok(());
    }

    let root = project.get_root();
    let mode = if has_name {
        InitMode::NewDir
    } else {
        InitMode::CurrentDir
    };

    let mut files: Vec<&str> = structure::PROJECT_FILES.iter().map(|(f, _)| *f).collect();
    files.push(CONFIG_FILE);
    validate::validate_target(root, &files, mode)?;

    structure::create_structure(root)?;
    config::write_config(root)?;
    config::write_ignore_files(root)?;

    log!("init"; "project initialized in {}", root.display());
    Ok(())
}
