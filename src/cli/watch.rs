//! Watch mode entry point.

use anyhow::{Context, Result};

use super::build::project_compiler;
use crate::compiler::FsSources;
use crate::config::ProjectConfig;
use crate::log;
use crate::watch::{HostStatus, Watcher, page_loads_host, report, report_error, wait_for_host};

pub fn watch_project(config: &ProjectConfig, events: bool) -> Result<()> {
    // Watcher first, so edits made during the initial compile are buffered
    let watcher = Watcher::new(FsSources::from_config(&config.scan), events)
        .context("failed to start file watcher")?;
    crate::core::set_watching();

    let mut compiler = project_compiler(config);

    let scan = &config.scan;
    let status = wait_for_host(
        || page_loads_host(&scan.entry, &scan.host_markers),
        scan.host_poll(),
        scan.host_wait(),
    );
    if status == HostStatus::Degraded {
        log!("watch"; "host library not detected, bound classes will not be scanned");
        compiler.set_host_detection(false);
    }

    let outcome = compiler.init();
    report(&outcome, &compiler);

    for path in watcher.watched_paths() {
        log!("watch"; "watching {}", config.root_relative(&path).display());
    }
    if events {
        log!("watch"; "reading events from stdin");
    }

    watcher.run(&mut compiler).inspect_err(|e| report_error("watch stopped", e))
}
