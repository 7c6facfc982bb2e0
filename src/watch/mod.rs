//! Watch mode.
//!
//! ```text
//! notify thread ──► fs events ──┐
//! stdin thread  ──► json lines ─┼─► select! ─► Compiler::handle_event
//! debouncer sleep ──────────────┘              └─► Compiler::poll
//! ```
//!
//! The watcher starts before the initial compile so changes made during it
//! are buffered, not lost. Everything runs on one current-thread runtime;
//! the compiler is never touched from two places at once.

mod classify;
mod host;

pub use classify::{SourceKind, classify_path, events_for, is_temp_file};
pub use host::{HostStatus, page_loads_host, wait_for_host};

use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};
use tokio::sync::mpsc;

use crate::compiler::{CompileOutcome, Compiler, CompilerEvent, FsSources};
use crate::core::is_shutdown;
use crate::logger::{status_error, status_success, status_unchanged};
use crate::{debug, log};

/// Upper bound on a single sleep so Ctrl+C is noticed promptly.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

pub struct Watcher {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    sources: FsSources,
    /// Read the JSON-lines event feed from stdin.
    events: bool,
}

impl Watcher {
    /// Start watching the entry page, component directories and theme files.
    pub fn new(sources: FsSources, events: bool) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        // Skip non-existent paths (theme file not created yet, etc.)
        for path in sources.watch_paths() {
            if path.exists() {
                watcher.watch(&path, RecursiveMode::Recursive)?;
                debug!("watch"; "watching {}", path.display());
            }
        }

        Ok(Self {
            notify_rx,
            _watcher: watcher,
            sources,
            events,
        })
    }

    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.sources.watch_paths()
    }

    /// Drive `compiler` until Ctrl+C. Tears the compiler down on exit.
    pub fn run(self, compiler: &mut Compiler) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .context("failed to start watch runtime")?;
        runtime.block_on(self.run_loop(compiler));
        compiler.teardown();
        log!("watch"; "stopped");
        Ok(())
    }

    async fn run_loop(self, compiler: &mut Compiler) {
        let Self {
            notify_rx,
            _watcher,
            sources,
            events,
        } = self;

        let (fs_tx, mut fs_rx) = mpsc::channel::<notify::Event>(64);
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if fs_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => log!("watch"; "notify error: {}", e),
                }
            }
        });

        let (line_tx, mut line_rx) = mpsc::channel::<String>(256);
        if events {
            std::thread::spawn(move || {
                for line in std::io::stdin().lock().lines() {
                    let Ok(line) = line else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    if line_tx.blocking_send(line).is_err() {
                        break;
                    }
                }
            });
        } else {
            drop(line_tx);
        }

        while !is_shutdown() {
            tokio::select! {
                biased;
                Some(event) = fs_rx.recv() => {
                    for event in events_for(&event, &sources) {
                        compiler.handle_event(event);
                    }
                }
                Some(line) = line_rx.recv() => match CompilerEvent::from_line(&line) {
                    Ok(event) => {
                        debug!("watch"; "event: {}", event.label());
                        compiler.handle_event(event);
                    }
                    Err(e) => log!("watch"; "ignoring malformed event: {}", e),
                },
                _ = tokio::time::sleep(compiler.sleep_duration().min(SHUTDOWN_POLL)) => {
                    if let Some(outcome) = compiler.poll() {
                        report(&outcome, compiler);
                    }
                }
            }
        }
    }
}

/// One status line per compile.
pub fn report(outcome: &CompileOutcome, compiler: &Compiler) {
    match outcome {
        CompileOutcome::Compiled {
            classes,
            rules,
            generated,
            changed: true,
        } => status_success(&format!(
            "{rules} rules from {classes} classes ({generated} new)"
        )),
        CompileOutcome::Compiled { changed: false, .. } => status_unchanged("no css changes"),
        CompileOutcome::Skipped | CompileOutcome::Deferred => {
            debug!("compile"; "recompile scheduled ({:?})", compiler.state());
        }
    }
}

/// Report a failure that stops watch mode from starting.
pub fn report_error(summary: &str, error: &anyhow::Error) {
    status_error(summary, &format!("{error:#}"));
}
