//! Progress reporting hooks for long-running workflows.

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called for each item (file or title) processed within a phase.
    fn item(&self, name: &str, current: usize, total: usize);
    /// Called when the workflow completes.
    fn done(&self);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self) {}
}
