//! Map file-system changes to compiler events.

use std::path::Path;

use notify::EventKind;
use notify::event::ModifyKind;

use crate::compiler::{CompilerEvent, FsSources};
use crate::utils::path::normalize_path;

/// Which project input a changed path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Page,
    Component,
    Theme,
}

impl SourceKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Component => "component",
            Self::Theme => "theme",
        }
    }
}

/// Check if path is a temp/backup file (editor artifacts)
pub fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Classify an already normalized path.
pub fn classify_path(path: &Path, sources: &FsSources) -> Option<SourceKind> {
    if is_temp_file(path) {
        return None;
    }
    if path == sources.entry() {
        Some(SourceKind::Page)
    } else if sources.is_theme_file(path) {
        Some(SourceKind::Theme)
    } else if sources.is_component_file(path) {
        Some(SourceKind::Component)
    } else {
        None
    }
}

/// Compiler events for one notify event, deduplicated.
///
/// Page and component edits invalidate the static scan and may carry inline
/// theme blocks; theme files only affect the theme.
pub fn events_for(event: &notify::Event, sources: &FsSources) -> Vec<CompilerEvent> {
    match event.kind {
        EventKind::Create(_) | EventKind::Remove(_) => {}
        // Metadata-only changes (mtime/atime/chmod) would loop forever
        EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(_) => {}
        _ => return Vec::new(),
    }

    let mut rescan = false;
    let mut theme = false;
    for path in &event.paths {
        let path = normalize_path(path);
        let Some(kind) = classify_path(&path, sources) else {
            continue;
        };
        crate::debug!("watch"; "{} changed: {}", kind.label(), path.display());
        match kind {
            SourceKind::Page | SourceKind::Component => {
                rescan = true;
                theme = true;
            }
            SourceKind::Theme => theme = true,
        }
    }

    let mut events = Vec::new();
    if rescan {
        events.push(CompilerEvent::ComponentsProcessed);
    }
    if theme {
        events.push(CompilerEvent::ThemeChanged);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind};
    use std::fs;
    use tempfile::TempDir;

    fn project() -> (TempDir, FsSources) {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        fs::write(root.join("index.html"), "<div></div>").unwrap();
        fs::create_dir_all(root.join("components")).unwrap();
        fs::write(root.join("components/nav.html"), "<nav></nav>").unwrap();
        fs::write(root.join("theme.css"), ":root {}").unwrap();
        let sources = FsSources::new(
            root.join("index.html"),
            vec![root.join("components")],
            vec![root.join("theme.css")],
        );
        (dir, sources)
    }

    fn modify(path: &Path) -> notify::Event {
        notify::Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(path.to_path_buf())
    }

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("index.html~")));
        assert!(is_temp_file(Path::new(".index.html.swp")));
        assert!(is_temp_file(Path::new("theme.css.bak")));
        assert!(!is_temp_file(Path::new("index.html")));
    }

    #[test]
    fn test_classify_path() {
        let (_dir, sources) = project();
        let entry = sources.entry().to_path_buf();
        let root = entry.parent().unwrap();
        assert_eq!(classify_path(&entry, &sources), Some(SourceKind::Page));
        assert_eq!(classify_path(&root.join("theme.css"), &sources), Some(SourceKind::Theme));
        assert_eq!(
            classify_path(&root.join("components/nav.html"), &sources),
            Some(SourceKind::Component)
        );
        assert_eq!(classify_path(&root.join("README.md"), &sources), None);
    }

    #[test]
    fn test_events_for_changes() {
        let (_dir, sources) = project();
        let root = sources.entry().parent().unwrap().to_path_buf();

        let events = events_for(&modify(&root.join("theme.css")), &sources);
        assert_eq!(events, vec![CompilerEvent::ThemeChanged]);

        let created = notify::Event::new(EventKind::Create(CreateKind::File))
            .add_path(root.join("components/nav.html"))
            .add_path(root.join("index.html"));
        let events = events_for(&created, &sources);
        assert_eq!(events, vec![CompilerEvent::ComponentsProcessed, CompilerEvent::ThemeChanged]);
    }

    #[test]
    fn test_events_for_ignores_noise() {
        let (_dir, sources) = project();
        let root = sources.entry().parent().unwrap().to_path_buf();

        let metadata = notify::Event::new(EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)))
            .add_path(root.join("index.html"));
        assert!(events_for(&metadata, &sources).is_empty());
        assert!(events_for(&modify(&root.join("notes.txt")), &sources).is_empty());
        assert!(events_for(&modify(&root.join("index.html~")), &sources).is_empty());
    }
}
