//! Progress reporting over a search space of unknown size.
//!
//! The engine cannot know how many objects are reachable, so it reports the
//! visited count alongside the current frontier size and an estimate that
//! never decreases during a scan.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::result::ScanStats;

/// One progress observation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    /// Objects visited so far (roots included).
    pub visited: usize,
    /// Objects discovered but not yet expanded.
    pub frontier: usize,
    /// Approximate completion in `0.0..=1.0`, monotonically increasing.
    pub estimate: f64,
}

impl Progress {
    /// `visited / (visited + frontier)`, or 1.0 when both are zero.
    pub fn ratio(visited: usize, frontier: usize) -> f64 {
        let total = visited + frontier;
        if total == 0 {
            1.0
        } else {
            visited as f64 / total as f64
        }
    }
}

/// Observer of scan progress.
///
/// Called on the scanning thread. Implementations that update UI state must
/// marshal the update themselves.
pub trait ProgressSink: Send + Sync {
    /// A new observation.
    fn update(&self, progress: Progress);

    /// The scan ended.
    fn finished(&self, _stats: &ScanStats) {}
}

/// A sink backed by a closure. See [`from_fn`].
pub struct FnProgress<F>(F);

/// Wrap a closure as a [`ProgressSink`].
pub fn from_fn<F>(f: F) -> FnProgress<F>
where
    F: Fn(Progress) + Send + Sync,
{
    FnProgress(f)
}

impl<F> ProgressSink for FnProgress<F>
where
    F: Fn(Progress) + Send + Sync,
{
    fn update(&self, progress: Progress) {
        (self.0)(progress)
    }
}

/// Lock-free sink that records the latest observation. Another thread may
/// poll it while the scan runs.
#[derive(Debug, Default)]
pub struct ProgressCounter {
    visited: AtomicUsize,
    frontier: AtomicUsize,
    estimate_bits: AtomicU64,
    updates: AtomicUsize,
    finished: AtomicUsize,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest observation.
    pub fn snapshot(&self) -> Progress {
        Progress {
            visited: self.visited.load(Ordering::Acquire),
            frontier: self.frontier.load(Ordering::Acquire),
            estimate: f64::from_bits(self.estimate_bits.load(Ordering::Acquire)),
        }
    }

    /// Number of updates received.
    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::Acquire)
    }

    /// Returns `true` once a scan reported completion.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire) > 0
    }
}

impl ProgressSink for ProgressCounter {
    fn update(&self, progress: Progress) {
        self.visited.store(progress.visited, Ordering::Release);
        self.frontier.store(progress.frontier, Ordering::Release);
        self.estimate_bits
            .store(progress.estimate.to_bits(), Ordering::Release);
        self.updates.fetch_add(1, Ordering::AcqRel);
    }

    fn finished(&self, stats: &ScanStats) {
        self.visited.store(stats.visited, Ordering::Release);
        self.frontier.store(0, Ordering::Release);
        self.estimate_bits.store(1.0f64.to_bits(), Ordering::Release);
        self.finished.fetch_add(1, Ordering::AcqRel);
    }
}
