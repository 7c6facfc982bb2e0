//! Waiting for the host reactivity library.
//!
//! Bound-class detection (`:class="..."`) only makes sense when the page
//! actually loads the host library. The wait is bounded; on timeout the
//! compiler continues in degraded mode without that detection.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use crate::core::is_shutdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStatus {
    Ready,
    /// Timed out; host-specific detection is disabled.
    Degraded,
}

/// Poll `detect` every `poll` until it succeeds or `timeout` passes.
pub fn wait_for_host(mut detect: impl FnMut() -> bool, poll: Duration, timeout: Duration) -> HostStatus {
    let started = Instant::now();
    loop {
        if detect() {
            return HostStatus::Ready;
        }
        let elapsed = started.elapsed();
        if elapsed >= timeout || is_shutdown() {
            return HostStatus::Degraded;
        }
        thread::sleep(poll.min(timeout - elapsed));
    }
}

/// Whether the page at `entry` exists and mentions one of `markers`
/// (case-insensitive), e.g. an `alpine` script tag.
pub fn page_loads_host(entry: &Path, markers: &[String]) -> bool {
    let Ok(html) = fs::read_to_string(entry) else {
        return false;
    };
    let html = html.to_ascii_lowercase();
    markers
        .iter()
        .any(|m| !m.is_empty() && html.contains(&m.to_ascii_lowercase()))
}
