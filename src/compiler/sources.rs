//! Compiler inputs: entry page, component fragments, theme stylesheets.
//!
//! Read failures never abort a compile; they are logged and the compile
//! proceeds with whatever could be read.

use std::fs;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use crate::config::ScanConfig;

/// A loaded component fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub html: String,
}

impl Component {
    pub fn new(name: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            html: html.into(),
        }
    }
}

/// Where the compiler reads its input from.
pub trait SourceProvider {
    /// Entry page HTML, `None` if unavailable.
    fn page_html(&self) -> Option<String>;
    fn components(&self) -> Vec<Component>;
    /// Theme stylesheet texts (inline `<style>` blocks are taken from the HTML).
    fn theme_css(&self) -> Vec<String>;
}

/// Project files on disk.
#[derive(Debug, Clone)]
pub struct FsSources {
    entry: PathBuf,
    component_dirs: Vec<PathBuf>,
    theme_files: Vec<PathBuf>,
}

impl FsSources {
    pub fn new(entry: PathBuf, component_dirs: Vec<PathBuf>, theme_files: Vec<PathBuf>) -> Self {
        Self {
            entry,
            component_dirs,
            theme_files,
        }
    }

    pub fn from_config(scan: &ScanConfig) -> Self {
        Self::new(
            scan.entry.clone(),
            scan.components.clone(),
            scan.theme.clone(),
        )
    }

    pub fn entry(&self) -> &Path {
        &self.entry
    }

    /// Component `.html` files, sorted for determinism.
    pub fn component_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self
            .component_dirs
            .iter()
            .filter(|dir| dir.is_dir())
            .flat_map(|dir| {
                WalkDir::new(dir)
                    .into_iter()
                    .filter_map(Result::ok)
                    .filter(|e| e.file_type().is_file())
                    .map(|e| e.path())
                    .filter(|p| is_html(p))
            })
            .filter(|p| *p != self.entry)
            .collect();
        files.sort();
        files
    }

    /// Whether `path` is one of the theme stylesheets.
    pub fn is_theme_file(&self, path: &Path) -> bool {
        self.theme_files.iter().any(|t| t == path)
    }

    /// Whether `path` lies inside a component directory.
    pub fn is_component_file(&self, path: &Path) -> bool {
        is_html(path) && self.component_dirs.iter().any(|d| path.starts_with(d))
    }

    /// Paths a watcher should observe.
    pub fn watch_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.entry.clone()];
        paths.extend(self.component_dirs.iter().cloned());
        paths.extend(self.theme_files.iter().cloned());
        paths
    }

    fn component_name(&self, path: &Path) -> String {
        let relative = self
            .component_dirs
            .iter()
            .find_map(|d| path.strip_prefix(d).ok())
            .unwrap_or(path);
        relative
            .with_extension("")
            .to_string_lossy()
            .replace('\\', "/")
    }
}

fn is_html(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("html")
}

fn read_logged(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            crate::log!("compile"; "failed to read {}: {}", path.display(), e);
            None
        }
    }
}

impl SourceProvider for FsSources {
    fn page_html(&self) -> Option<String> {
        read_logged(&self.entry)
    }

    fn components(&self) -> Vec<Component> {
        self.component_files()
            .into_iter()
            .filter_map(|path| {
                let html = read_logged(&path)?;
                Some(Component::new(self.component_name(&path), html))
            })
            .collect()
    }

    fn theme_css(&self) -> Vec<String> {
        self.theme_files.iter().filter_map(|p| read_logged(p)).collect()
    }
}

/// Fixed in-memory input, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySources {
    pub page: Option<String>,
    pub components: Vec<Component>,
    pub theme: Vec<String>,
}

impl MemorySources {
    pub fn new(page: impl Into<String>) -> Self {
        Self {
            page: Some(page.into()),
            ..Self::default()
        }
    }

    pub fn with_component(mut self, name: &str, html: &str) -> Self {
        self.components.push(Component::new(name, html));
        self
    }

    pub fn with_theme(mut self, css: &str) -> Self {
        self.theme.push(css.to_string());
        self
    }
}

impl SourceProvider for MemorySources {
    fn page_html(&self) -> Option<String> {
        self.page.clone()
    }

    fn components(&self) -> Vec<Component> {
        self.components.clone()
    }

    fn theme_css(&self) -> Vec<String> {
        self.theme.clone()
    }
}
