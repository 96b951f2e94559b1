//! Failure accounting for the event loop. Protocol errors are logged and
//! counted per category instead of unwinding out of `run`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    X11,
    Window,
    Launcher,
}

impl ErrorCategory {
    const ALL: [ErrorCategory; 3] = [ErrorCategory::X11, ErrorCategory::Window, ErrorCategory::Launcher];

    fn index(self) -> usize {
        self as usize
    }

    fn label(self) -> &'static str {
        match self {
            ErrorCategory::X11 => "x11",
            ErrorCategory::Window => "window",
            ErrorCategory::Launcher => "launcher",
        }
    }

    /// Failures tolerated before health counts as degraded.
    fn threshold(self) -> u64 {
        match self {
            ErrorCategory::X11 | ErrorCategory::Window => 10,
            ErrorCategory::Launcher => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthStatus {
    pub x11_errors: u64,
    pub window_errors: u64,
    pub launcher_errors: u64,
    pub is_healthy: bool,
}

#[derive(Debug, Default)]
pub struct ErrorTracker {
    counts: [AtomicU64; 3],
    reported: AtomicBool,
}

impl ErrorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, category: ErrorCategory, operation: &str, error: impl std::fmt::Display) {
        self.counts[category.index()].fetch_add(1, Ordering::Relaxed);
        error!(category = category.label(), "{} failed: {}", operation, error);
    }

    /// Passes `Ok` values through; errors are recorded under `category`.
    pub fn warn_if_failed<T, E: std::fmt::Display>(
        &self,
        result: Result<T, E>,
        operation: &str,
        category: ErrorCategory,
    ) -> Option<T> {
        result.map_err(|e| self.record(category, operation, e)).ok()
    }

    fn count(&self, category: ErrorCategory) -> u64 {
        self.counts[category.index()].load(Ordering::Relaxed)
    }

    pub fn health_check(&self) -> HealthStatus {
        HealthStatus {
            x11_errors: self.count(ErrorCategory::X11),
            window_errors: self.count(ErrorCategory::Window),
            launcher_errors: self.count(ErrorCategory::Launcher),
            is_healthy: ErrorCategory::ALL.iter().all(|c| self.count(*c) < c.threshold()),
        }
    }

    /// The health status the first time it turns degraded, then `None`.
    pub fn newly_degraded(&self) -> Option<HealthStatus> {
        let health = self.health_check();
        if health.is_healthy || self.reported.swap(true, Ordering::Relaxed) {
            return None;
        }
        Some(health)
    }
}

/// For cleanup paths where the target may already be gone.
pub fn log_and_ignore<T, E: std::fmt::Display>(result: Result<T, E>, operation: &str) {
    if let Err(e) = result {
        debug!("{} failed (ignored): {}", operation, e);
    }
}

pub fn log_warn<T, E: std::fmt::Display>(result: Result<T, E>, operation: &str) -> Option<T> {
    result.map_err(|e| warn!("{} failed: {}", operation, e)).ok()
}
