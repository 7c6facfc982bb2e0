//! Recompile timing.
//!
//! Pure timing and reason deduplication, no compiler access. A compile is
//! due once the quiet period after the last qualifying event has passed and
//! the minimum interval since the previous compile has elapsed.

use std::time::{Duration, Instant};

/// Sleep used when nothing is pending.
const IDLE_SLEEP: Duration = Duration::from_secs(86400);

#[derive(Debug)]
pub struct Debouncer {
    /// Reasons recorded since the last compile, first occurrence order.
    pub(super) reasons: Vec<String>,
    pub(super) last_event: Option<Instant>,
    pub(super) last_compile: Option<Instant>,
    debounce: Duration,
    min_interval: Duration,
}

impl Debouncer {
    pub fn new(debounce: Duration, min_interval: Duration) -> Self {
        Self {
            reasons: Vec::new(),
            last_event: None,
            last_compile: None,
            debounce,
            min_interval,
        }
    }

    /// Record a qualifying event. Restarts the quiet period.
    pub fn record(&mut self, reason: &str) {
        if !self.reasons.iter().any(|r| r == reason) {
            self.reasons.push(reason.to_string());
        }
        self.last_event = Some(Instant::now());
    }

    pub fn is_pending(&self) -> bool {
        !self.reasons.is_empty()
    }

    pub fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };
        if last_event.elapsed() < self.debounce {
            return false;
        }
        if !self.interval_elapsed() {
            return false;
        }
        self.is_pending()
    }

    /// Whether the minimum interval since the last compile has passed.
    pub fn interval_elapsed(&self) -> bool {
        self.interval_remaining().is_zero()
    }

    pub fn interval_remaining(&self) -> Duration {
        self.last_compile
            .map(|t| self.min_interval.saturating_sub(t.elapsed()))
            .unwrap_or(Duration::ZERO)
    }

    /// Take pending reasons if debounce and interval elapsed.
    pub fn take_if_ready(&mut self) -> Option<Vec<String>> {
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;
        Some(std::mem::take(&mut self.reasons))
    }

    /// Mark a compile as started now. Clears pending reasons.
    pub fn mark_compiled(&mut self) {
        self.reasons.clear();
        self.last_event = None;
        self.last_compile = Some(Instant::now());
    }

    /// Drop pending work, keep the compile history.
    pub fn clear(&mut self) {
        self.reasons.clear();
        self.last_event = None;
    }

    /// Precise sleep duration until the next possible ready time.
    pub fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return IDLE_SLEEP;
        };

        let debounce_remaining = self.debounce.saturating_sub(last_event.elapsed());

        debounce_remaining
            .max(self.interval_remaining())
            .max(Duration::from_millis(1))
    }
}
