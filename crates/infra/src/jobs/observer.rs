use std::sync::Mutex;

use super::summary::RunSummary;

/// Receives run progress and the final summary.
///
/// Progress is a percentage in `0..=100`.
pub trait SweepObserver: Send + Sync {
    fn progress(&self, percent: f64);

    fn completed(&self, summary: &RunSummary);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SweepObserver for NoopObserver {
    fn progress(&self, _percent: f64) {}

    fn completed(&self, _summary: &RunSummary) {}
}

/// In-memory observer for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryObserver {
    progress: Mutex<Vec<f64>>,
    summaries: Mutex<Vec<RunSummary>>,
}

impl InMemoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress_reports(&self) -> Vec<f64> {
        self.progress.lock().unwrap().clone()
    }

    pub fn last_progress(&self) -> Option<f64> {
        self.progress.lock().unwrap().last().copied()
    }

    pub fn summaries(&self) -> Vec<RunSummary> {
        self.summaries.lock().unwrap().clone()
    }
}

impl SweepObserver for InMemoryObserver {
    fn progress(&self, percent: f64) {
        self.progress.lock().unwrap().push(percent);
    }

    fn completed(&self, summary: &RunSummary) {
        self.summaries.lock().unwrap().push(summary.clone());
    }
}

impl<O: SweepObserver + ?Sized> SweepObserver for std::sync::Arc<O> {
    fn progress(&self, percent: f64) {
        (**self).progress(percent)
    }

    fn completed(&self, summary: &RunSummary) {
        (**self).completed(summary)
    }
}
