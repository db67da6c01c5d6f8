//! Multi-source breadth-first search from the GC roots.
//!
//! Every root is enqueued at distance zero. Objects are dequeued in FIFO
//! order, so the first time an object is discovered is along a shortest
//! chain. Each visited object remembers how it was reached; a path is
//! rebuilt from those records only when a target is hit.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use liveref_types::{Edge, GraphIntrospector, LiveObject, ObjectKey, Root, RootEnumerator};

use crate::config::ScanConfig;
use crate::filter::{Filter, Referrer};
use crate::introspect::guarded;
use crate::path::{Path, PathFactory};
use crate::progress::{Progress, ProgressSink};
use crate::result::{ScanOutcome, ScanResult, ScanStats};

// ---------------------------------------------------------------------------
// Scan state
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
enum Phase {
    EnumeratingRoots,
    Traversing,
    Done,
}

/// How a visited object was first reached.
enum Via {
    Root(usize),
    Edge { from: ObjectKey, edge: Edge },
}

struct Visit {
    object: LiveObject,
    via: Via,
}

/// Everything one scan needs. Borrowed for the duration of the call.
pub(crate) struct TraversalEngine<'a> {
    pub roots: &'a dyn RootEnumerator,
    pub introspector: &'a dyn GraphIntrospector,
    pub factory: &'a dyn PathFactory,
    pub filter: &'a dyn Filter,
    pub progress: Option<&'a dyn ProgressSink>,
    pub config: &'a ScanConfig,
    pub cancel: Option<&'a CancellationToken>,
}

struct State {
    roots: Vec<Root>,
    visited: HashMap<ObjectKey, Visit>,
    queue: VecDeque<LiveObject>,
    pending: HashMap<ObjectKey, LiveObject>,
    found: HashMap<ObjectKey, (LiveObject, Arc<Path>)>,
    stats: ScanStats,
    estimate: f64,
}

impl<'a> TraversalEngine<'a> {
    /// Find a shortest path to each of `targets`.
    pub fn run(&self, targets: &[LiveObject], hints: &[LiveObject]) -> ScanResult {
        let started = Instant::now();
        let mut state = State {
            roots: Vec::new(),
            visited: HashMap::new(),
            queue: VecDeque::new(),
            pending: targets
                .iter()
                .filter(|t| !t.is_null())
                .map(|t| (t.key(), t.clone()))
                .collect(),
            found: HashMap::new(),
            stats: ScanStats::default(),
            estimate: 0.0,
        };

        debug!(phase = ?Phase::EnumeratingRoots, targets = state.pending.len(), hints = hints.len(), "scan phase");
        state.roots = self.enumerate_roots(hints);
        state.stats.roots = state.roots.len();

        let outcome = match self.seed(&mut state) {
            Some(outcome) => outcome,
            None => {
                debug!(phase = ?Phase::Traversing, roots = state.roots.len(), visited = state.stats.visited, "scan phase");
                self.traverse(&mut state)
            }
        };

        state.stats.elapsed = started.elapsed();
        debug!(
            phase = ?Phase::Done,
            outcome = ?outcome,
            found = state.found.len(),
            visited = state.stats.visited,
            edges = state.stats.edges_examined,
            unresolvable = state.stats.unresolvable_edges,
            "scan phase"
        );
        if let Some(sink) = self.progress {
            sink.finished(&state.stats);
        }
        ScanResult::new(state.found, outcome, state.stats)
    }

    fn enumerate_roots(&self, hints: &[LiveObject]) -> Vec<Root> {
        if self.config.static_roots && self.config.thread_roots {
            return self.roots.enumerate(hints);
        }
        let runtime = self
            .roots
            .runtime_roots()
            .into_iter()
            .filter(|root| self.config.includes(root.kind()))
            .collect();
        Root::coalesce(runtime, hints)
    }

    /// Mark every accepted root visited. Returns an outcome if the scan is
    /// already over.
    fn seed(&self, state: &mut State) -> Option<ScanOutcome> {
        for index in 0..state.roots.len() {
            if state.pending.is_empty() {
                return Some(ScanOutcome::AllFound);
            }
            let object = state.roots[index].object().clone();
            if object.is_null() || state.visited.contains_key(&object.key()) {
                continue;
            }
            if !self.filter.accept(&object, Referrer::Root(&state.roots[index])) {
                trace!(root = %state.roots[index], "root rejected by filter");
                continue;
            }
            if self.is_full(state) {
                return Some(ScanOutcome::Truncated);
            }
            self.visit(state, object, Via::Root(index));
        }
        state.pending.is_empty().then_some(ScanOutcome::AllFound)
    }

    fn traverse(&self, state: &mut State) -> ScanOutcome {
        let mut dequeued = 0usize;
        loop {
            if state.pending.is_empty() {
                return ScanOutcome::AllFound;
            }
            if self.cancel.is_some_and(CancellationToken::is_cancelled) {
                return ScanOutcome::Cancelled;
            }
            let Some(current) = state.queue.pop_front() else {
                return ScanOutcome::Exhausted;
            };

            for (edge, child) in guarded(self.introspector, &current) {
                state.stats.edges_examined += 1;
                if edge.is_unresolvable() {
                    state.stats.unresolvable_edges += 1;
                }
                if child.is_null() || state.visited.contains_key(&child.key()) {
                    continue;
                }
                let referrer = Referrer::Object {
                    from: &current,
                    edge: &edge,
                };
                if !self.filter.accept(&child, referrer) {
                    continue;
                }
                if self.is_full(state) {
                    return ScanOutcome::Truncated;
                }
                self.visit(
                    state,
                    child,
                    Via::Edge {
                        from: current.key(),
                        edge,
                    },
                );
                if state.pending.is_empty() {
                    return ScanOutcome::AllFound;
                }
            }

            dequeued += 1;
            if dequeued % self.config.progress_interval == 0 {
                self.report(state);
            }
        }
    }

    fn is_full(&self, state: &State) -> bool {
        self.config
            .max_visited
            .is_some_and(|max| state.stats.visited >= max)
    }

    fn visit(&self, state: &mut State, object: LiveObject, via: Via) {
        let key = object.key();
        state.visited.insert(
            key,
            Visit {
                object: object.clone(),
                via,
            },
        );
        state.stats.visited += 1;
        if let Some(target) = state.pending.remove(&key) {
            let path = self.reconstruct_path(state, key);
            trace!(target = %target, distance = path.distance(), "target reached");
            state.found.insert(key, (target, path));
        }
        state.queue.push_back(object);
    }

    fn report(&self, state: &mut State) {
        let Some(sink) = self.progress else {
            return;
        };
        let ratio = Progress::ratio(state.stats.visited, state.queue.len());
        state.estimate = state.estimate.max(ratio);
        sink.update(Progress {
            visited: state.stats.visited,
            frontier: state.queue.len(),
            estimate: state.estimate,
        });
    }

    // -----------------------------------------------------------------------
    // Path reconstruction
    // -----------------------------------------------------------------------

    /// Walk predecessor records from `target` back to its root, building the
    /// chain back to front.
    fn reconstruct_path(&self, state: &State, target: ObjectKey) -> Arc<Path> {
        let mut key = target;
        let mut path = match state.visited.get(&key) {
            Some(visit) => self.factory.target(&visit.object),
            None => self.factory.target(&LiveObject::null()),
        };
        while let Some(visit) = state.visited.get(&key) {
            match &visit.via {
                Via::Root(index) => {
                    if let Some(root) = state.roots.get(*index) {
                        path = self.factory.root(root, path);
                    }
                    break;
                }
                Via::Edge { from, edge } => {
                    let Some(parent) = state.visited.get(from) else {
                        break;
                    };
                    path = self.factory.link(&parent.object, edge, path);
                    key = *from;
                }
            }
        }
        path
    }
}
