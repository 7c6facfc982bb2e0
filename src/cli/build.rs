//! One-shot compile.

use anyhow::{Result, bail};

use crate::compiler::{CompileOutcome, Compiler, CompilerOptions, FsSources, OutputTarget};
use crate::config::ProjectConfig;
use crate::log;

/// Compiler wired to the project files and configured outputs.
pub fn project_compiler(config: &ProjectConfig) -> Compiler {
    let output = OutputTarget {
        css: config.output.css.clone(),
        minify: config.output.minify,
        inject: config.output.inject.then(|| config.scan.entry.clone()),
    };
    let options = CompilerOptions::from_config(config).with_output(output);
    let cache = config
        .cache
        .enable
        .then(|| config.cache.open_store());

    Compiler::new(FsSources::from_config(&config.scan), options, cache)
}

/// Compile once and write the stylesheet.
pub fn build_project(config: &ProjectConfig) -> Result<()> {
    let mut compiler = project_compiler(config);
    let outcome = compiler.init();
    compiler.teardown();

    let CompileOutcome::Compiled {
        classes,
        rules,
        changed,
        ..
    } = outcome
    else {
        bail!("compile did not run");
    };

    let css_path = config.root_relative(&config.output.css);
    if changed {
        log!("compile"; "{} rules from {} classes -> {}", rules, classes, css_path.display());
    } else {
        log!("compile"; "{} rules from {} classes, {} unchanged", rules, classes, css_path.display());
    }
    if config.output.inject {
        log!("compile"; "injected into {}", config.root_relative(&config.scan.entry).display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project(dir: &TempDir, inject: bool) -> ProjectConfig {
        let root = dir.path();
        fs::write(
            root.join("index.html"),
            "<html><head><style>:root { --color-primary: #ff0000; }</style></head>\
             <body class=\"color-primary-bg p-4\"></body></html>",
        )
        .unwrap();
        let mut config = ProjectConfig::default();
        config.output.inject = inject;
        config.set_root(root);
        config.normalize_paths();
        config
    }

    #[test]
    fn test_build_writes_stylesheet() {
        let dir = TempDir::new().unwrap();
        let config = project(&dir, false);
        build_project(&config).unwrap();

        let css = fs::read_to_string(&config.output.css).unwrap();
        assert!(css.contains(".color-primary-bg { background-color: #ff0000; }"));
        assert!(css.contains(".p-4 { padding: calc(0.25rem * 4); }"));
        assert!(config.cache.dir.join("tailwind-cache.json").is_file());
    }

    #[test]
    fn test_build_injects_into_entry() {
        let dir = TempDir::new().unwrap();
        let mut config = project(&dir, true);
        config.cache.enable = false;
        build_project(&config).unwrap();

        let html = fs::read_to_string(&config.scan.entry).unwrap();
        assert!(crate::compiler::is_utility_sheet_last(&html));
        assert!(!config.cache.dir.exists());
    }
}
