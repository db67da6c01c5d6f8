//! Foundation types for scanning a live object graph.
//!
//! Everything the traversal engine needs to talk about a heap without knowing
//! how the heap is implemented lives here:
//!
//! - [`LiveObject`] is an identity-compared handle to any traced object.
//!   Two structurally equal objects are still distinct handles.
//! - [`Edge`] labels a single outgoing reference (field name, array slot, or
//!   the [`Edge::Unresolvable`] sentinel used when a concurrent mutation made
//!   the slot unreadable).
//! - [`Root`] is the closed set of GC root kinds a scan starts from.
//! - [`Traced`] is implemented by heap objects; [`GraphIntrospector`] and
//!   [`RootEnumerator`] are the capabilities the engine consumes.
//!
//! # Modules
//!
//! - [`error`] -- [`TraceError`], raised by individual slot reads
//! - [`object`] -- [`LiveObject`], [`WeakObject`], [`ObjectKey`], [`Traced`]
//! - [`edge`] -- [`Edge`]
//! - [`root`] -- [`Root`], [`RootKind`]
//! - [`traits`] -- [`GraphIntrospector`], [`RootEnumerator`]

pub mod edge;
pub mod error;
pub mod object;
pub mod root;
pub mod traits;

pub use edge::Edge;
pub use error::{TraceError, TraceResult};
pub use object::{describe_object, LiveObject, ObjectKey, Traced, WeakObject};
pub use root::{Root, RootKind};
pub use traits::{Children, FixedRoots, GraphIntrospector, RootEnumerator};
