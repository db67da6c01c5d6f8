//! The public entry point.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use liveref_types::{GraphIntrospector, LiveObject, RootEnumerator};

use crate::census::{take_census, Census};
use crate::config::ScanConfig;
use crate::error::Result;
use crate::filter::{AcceptAll, Filter};
use crate::introspect::TracedIntrospector;
use crate::path::{ChainFactory, PathFactory};
use crate::progress::ProgressSink;
use crate::result::ScanResult;
use crate::traversal::TraversalEngine;

/// Finds reference paths from GC roots to live objects.
///
/// ```ignore
/// let heap = Heap::new();
/// heap.set_static("Cache", "INSTANCE", cache.clone());
///
/// let result = LiveReferences::new(&heap).from_roots(&[leaked.clone()])?;
/// if let Some(path) = result.get(&leaked) {
///     println!("{path}");
/// }
/// ```
#[derive(Clone)]
pub struct LiveReferences<'r> {
    roots: &'r dyn RootEnumerator,
    introspector: Arc<dyn GraphIntrospector>,
    factory: Arc<dyn PathFactory>,
    config: ScanConfig,
    cancel: Option<CancellationToken>,
}

impl<'r> LiveReferences<'r> {
    /// Scan from the roots of `roots` with the default introspector and
    /// path factory.
    pub fn new(roots: &'r dyn RootEnumerator) -> Self {
        Self {
            roots,
            introspector: Arc::new(TracedIntrospector),
            factory: Arc::new(ChainFactory),
            config: ScanConfig::default(),
            cancel: None,
        }
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_introspector(mut self, introspector: impl GraphIntrospector + 'static) -> Self {
        self.introspector = Arc::new(introspector);
        self
    }

    pub fn with_path_factory(mut self, factory: impl PathFactory + 'static) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    /// Stop scans once `token` is cancelled. Checked once per dequeued object.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Paths to `targets` from the runtime roots, unfiltered.
    pub fn from_roots(&self, targets: &[LiveObject]) -> Result<ScanResult> {
        self.from_roots_filtered(targets, &[], None, None)
    }

    /// Paths to `targets`, with `hints` added as roots and optional progress.
    pub fn from_roots_with(
        &self,
        targets: &[LiveObject],
        hints: &[LiveObject],
        progress: Option<&dyn ProgressSink>,
    ) -> Result<ScanResult> {
        self.from_roots_filtered(targets, hints, progress, None)
    }

    /// Paths to `targets` that only pass through objects `filter` accepts.
    pub fn from_roots_filtered(
        &self,
        targets: &[LiveObject],
        hints: &[LiveObject],
        progress: Option<&dyn ProgressSink>,
        filter: Option<&dyn Filter>,
    ) -> Result<ScanResult> {
        self.config.validate()?;
        if targets.is_empty() {
            debug!("no targets, skipping scan");
            return Ok(ScanResult::empty());
        }
        let engine = TraversalEngine {
            roots: self.roots,
            introspector: self.introspector.as_ref(),
            factory: self.factory.as_ref(),
            filter: filter.unwrap_or(&AcceptAll),
            progress,
            config: &self.config,
            cancel: self.cancel.as_ref(),
        };
        Ok(engine.run(targets, hints))
    }

    /// Count objects and shallow bytes reachable from `start`.
    pub fn census(&self, start: &[LiveObject], filter: Option<&dyn Filter>) -> Result<Census> {
        self.config.validate()?;
        Ok(take_census(
            self.introspector.as_ref(),
            start,
            filter.unwrap_or(&AcceptAll),
            self.config.max_visited,
            self.cancel.as_ref(),
        ))
    }
}

impl std::fmt::Debug for LiveReferences<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveReferences")
            .field("config", &self.config)
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}
