//! Process state flags.
//!
//! Two orthogonal states:
//! - `WATCHING`: Is a watch loop running? (decides how Ctrl+C is handled)
//! - `SHUTDOWN`: Has shutdown been requested? (Ctrl+C received)

use std::sync::atomic::{AtomicBool, Ordering};

/// A watch loop is running and polls `SHUTDOWN`
static WATCHING: AtomicBool = AtomicBool::new(false);

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

// =============================================================================
// WATCHING state
// =============================================================================

/// Check if a watch loop is running
fn is_watching() -> bool {
    WATCHING.load(Ordering::SeqCst)
}

/// Mark the watch loop as running (call once the watcher is set up)
pub fn set_watching() {
    WATCHING.store(true, Ordering::SeqCst);
}

// =============================================================================
// SHUTDOWN state
// =============================================================================

/// Setup the global Ctrl+C handler. Call once at program start
///
/// The handler behavior depends on whether watch mode is running:
/// - Before `set_watching()`: Sets SHUTDOWN flag, exits immediately
/// - After `set_watching()`: Graceful shutdown (loop tears the compiler down)
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if is_watching() {
            crate::log!("watch"; "shutting down...");
        } else {
            // Nothing to tear down (one-shot build, host wait)
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Check if shutdown has been requested
///
/// Uses Relaxed ordering for performance - worst case is one more loop
/// iteration before stopping
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watching() {
        set_watching();
        assert!(is_watching());
    }

    #[test]
    fn test_shutdown_default() {
        assert!(!is_shutdown());
    }
}
