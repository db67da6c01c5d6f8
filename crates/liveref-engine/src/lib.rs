//! Live reference engine.
//!
//! Given a set of target objects, finds for each one a shortest chain of
//! references from a GC root, while the program that owns the graph keeps
//! running. The answer is the kind a leak investigation needs: which static
//! field, thread local or caller hint keeps this object alive, and through
//! which fields and array slots.
//!
//! # Architecture
//!
//! - **Roots** come from a [`RootEnumerator`](liveref_types::RootEnumerator)
//!   plus caller hints, in a fixed order with duplicates coalesced.
//! - **Traversal** is a multi-source breadth-first search keyed by object
//!   identity. It stops as soon as every target is found.
//! - **Introspection** goes through a
//!   [`GraphIntrospector`](liveref_types::GraphIntrospector); the default
//!   [`TracedIntrospector`] drives the [`Traced`](liveref_types::Traced)
//!   trait. Unreadable slots and panics become unresolvable edges.
//! - **Paths** are built only for found targets, through an injected
//!   [`PathFactory`].
//!
//! # Modules
//!
//! - [`live`] -- [`LiveReferences`], the entry point
//! - [`path`] -- [`Path`], [`PathFactory`], [`ChainFactory`]
//! - [`filter`] -- [`Filter`], [`SkipObjects`], combinators
//! - [`progress`] -- [`ProgressSink`], [`ProgressCounter`]
//! - [`result`] -- [`ScanResult`], [`ScanOutcome`], [`ScanStats`]
//! - [`census`] -- [`Census`] of a reachable set
//! - [`config`] -- [`ScanConfig`]
//! - [`introspect`] -- [`TracedIntrospector`]
//! - [`error`] -- [`ScanError`]

pub mod census;
pub mod config;
pub mod error;
pub mod filter;
pub mod introspect;
pub mod live;
pub mod path;
pub mod progress;
pub mod result;
mod traversal;

pub use census::{Census, TypeStats};
pub use config::ScanConfig;
pub use error::{Result, ScanError};
pub use filter::{AcceptAll, Filter, FilterExt, Referrer, SkipObjects};
pub use introspect::TracedIntrospector;
pub use live::LiveReferences;
pub use path::{ChainFactory, Path, PathFactory, PathNode, PathStep};
pub use progress::{Progress, ProgressCounter, ProgressSink};
pub use result::{ScanOutcome, ScanResult, ScanStats};

pub use liveref_types::{describe_object, Edge, LiveObject, Root, WeakObject};
pub use tokio_util::sync::CancellationToken;
