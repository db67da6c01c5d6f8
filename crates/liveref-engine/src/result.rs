use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use liveref_types::{LiveObject, ObjectKey};

use crate::path::Path;

/// Why a scan stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Every requested target was found.
    AllFound,
    /// The reachable graph ran out; unfound targets are unreachable.
    Exhausted,
    /// The cancellation token fired. Results are partial.
    Cancelled,
    /// The visit limit was hit. Results are partial.
    Truncated,
}

impl ScanOutcome {
    /// Whether an absent target is known to be unreachable.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::AllFound | Self::Exhausted)
    }
}

/// Counters collected during a scan.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub roots: usize,
    pub visited: usize,
    pub edges_examined: usize,
    pub unresolvable_edges: usize,
    pub elapsed: Duration,
}

/// Target to path mapping produced by one scan. Never updated afterwards.
#[derive(Clone, Debug)]
pub struct ScanResult {
    paths: HashMap<ObjectKey, (LiveObject, Arc<Path>)>,
    outcome: ScanOutcome,
    stats: ScanStats,
}

impl ScanResult {
    pub(crate) fn new(
        paths: HashMap<ObjectKey, (LiveObject, Arc<Path>)>,
        outcome: ScanOutcome,
        stats: ScanStats,
    ) -> Self {
        Self {
            paths,
            outcome,
            stats,
        }
    }

    /// Result of a scan with no targets.
    pub fn empty() -> Self {
        Self::new(HashMap::new(), ScanOutcome::AllFound, ScanStats::default())
    }

    /// Path to `target`, `None` if it was not found.
    pub fn get(&self, target: &LiveObject) -> Option<&Path> {
        self.paths.get(&target.key()).map(|(_, path)| path.as_ref())
    }

    /// Shared handle to the path for `target`.
    pub fn get_arc(&self, target: &LiveObject) -> Option<Arc<Path>> {
        self.paths.get(&target.key()).map(|(_, path)| Arc::clone(path))
    }

    pub fn contains(&self, target: &LiveObject) -> bool {
        self.paths.contains_key(&target.key())
    }

    /// Number of targets found.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Found targets with their paths, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&LiveObject, &Path)> {
        self.paths.values().map(|(obj, path)| (obj, path.as_ref()))
    }

    pub fn outcome(&self) -> ScanOutcome {
        self.outcome
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }
}
