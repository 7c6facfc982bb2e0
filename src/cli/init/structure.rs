//! Project skeleton: entry page, a component and a theme stylesheet.

use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Directories created for a new project.
const PROJECT_DIRS: &[&str] = &["components", "styles"];

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>manifest</title>
  <link rel="stylesheet" href="styles/theme.css">
  <link rel="stylesheet" href="utilities.css">
  <script defer src="https://cdn.jsdelivr.net/npm/alpinejs@3/dist/cdn.min.js"></script>
</head>
<body class="p-8 font-sans">
  <main x-data="{ open: false }" class="flex flex-col gap-4">
    <h1 class="text-3xl font-bold color-primary">Hello</h1>
    <button class="px-4 py-2 rounded-lg color-primary-bg" @click="open = !open">Toggle</button>
    <p :class="{ 'hidden': !open }">Utilities are generated as you use them.</p>
  </main>
</body>
</html>
"#;

const CARD_HTML: &str = r#"<article class="p-4 rounded-lg shadow-md hover:shadow-lg">
  <slot></slot>
</article>
"#;

const THEME_CSS: &str = r#":root {
  --color-primary: #2563eb;
  --color-surface: #ffffff;
}

@theme {
  --spacing: 0.25rem;
  --breakpoint-md: 48rem;
}
"#;

/// Files written for a new project (relative path, content).
pub const PROJECT_FILES: &[(&str, &str)] = &[
    ("index.html", INDEX_HTML),
    ("components/card.html", CARD_HTML),
    ("styles/theme.css", THEME_CSS),
];

/// Create the project layout at `root`. The root is created if missing.
pub fn create_structure(root: &Path) -> Result<()> {
    if !root.exists() {
        fs::create_dir_all(root)
            .with_context(|| format!("Failed to create root directory '{}'", root.display()))?;
    }

    for dir in PROJECT_DIRS {
        let path = root.join(dir);
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create directory '{}'", path.display()))?;
    }

    for (file, content) in PROJECT_FILES {
        let path = root.join(file);
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
    fn test_create_structure() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("my_project");

        create_structure(&root).unwrap();

        assert!(root.join("index.html").is_file());
        assert!(root.join("components/card.html").is_file());
        assert!(root.join("styles/theme.css").is_file());
    }

    #[test]
    fn test_theme_template_parses() {
        let theme = crate::theme::Theme::parse(&[THEME_CSS], ":root", "@theme");
        assert_eq!(theme.get("color-primary"), Some("#2563eb"));
        assert_eq!(theme.get("breakpoint-md"), Some("48rem"));
    }
}
