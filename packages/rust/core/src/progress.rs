//! Progress reporting for long-running generation.

use std::sync::Mutex;

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called with the overall completion percentage (0.0..=100.0).
    fn progress(&self, percent: f64, detail: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn progress(&self, _percent: f64, _detail: &str) {}
}

/// Wraps a reporter so percentages never go backwards or past 100.
pub(crate) struct MonotonicProgress<'a> {
    inner: &'a dyn ProgressReporter,
    last: Mutex<f64>,
}

impl<'a> MonotonicProgress<'a> {
    pub(crate) fn new(inner: &'a dyn ProgressReporter) -> Self {
        Self {
            inner,
            last: Mutex::new(0.0),
        }
    }
}

impl ProgressReporter for MonotonicProgress<'_> {
    fn phase(&self, name: &str) {
        self.inner.phase(name);
    }

    fn progress(&self, percent: f64, detail: &str) {
        let value = {
            let mut last = self.last.lock().unwrap_or_else(|p| p.into_inner());
            let clamped = if percent.is_nan() { *last } else { percent.clamp(*last, 100.0) };
            *last = clamped;
            clamped
        };
        self.inner.progress(value, detail);
    }
}

/// Percentage reached after finishing step `index` (0-based) of `total`,
/// spread linearly from `start` to 100.
pub(crate) fn step_percent(start: f64, index: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let fraction = (index + 1) as f64 / total as f64;
    (start + (100.0 - start) * fraction).min(100.0)
}
