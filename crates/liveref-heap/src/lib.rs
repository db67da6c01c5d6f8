//! A reflective, thread-safe object model to scan.
//!
//! This crate is the runtime side of a live reference scan: it owns the
//! object graph and knows which references are GC roots.
//!
//! # Architecture
//!
//! - **Classes** ([`Class`]) declare named fields, each either a reference
//!   or a primitive, and may extend a superclass. An instance's layout is the
//!   full hierarchy, inherited fields first.
//! - **Objects** are [`Instance`]s, [`ArrayObject`]s and immutable
//!   [`BoxedValue`]s. Every reference slot sits behind its own lock, so other
//!   threads can mutate the graph while a scan walks it. A slot that is
//!   write-locked or has vanished when the scanner reaches it is reported as
//!   a trace error rather than blocking.
//! - **[`Heap`]** is the root registry: static fields and attached thread
//!   stacks. It implements [`RootEnumerator`](liveref_types::RootEnumerator).
//! - **Snapshots** ([`HeapSnapshot`]) describe a whole heap in JSON and
//!   materialize it, for fixtures and the command-line tool.
//!
//! # Modules
//!
//! - [`error`] -- [`HeapError`] and the [`Result`] alias
//! - [`class`] -- [`Class`], [`ClassBuilder`], [`FieldDef`], [`FieldKind`]
//! - [`instance`] -- [`Instance`], [`FieldGuard`]
//! - [`array`] -- [`ArrayObject`]
//! - [`boxed`] -- [`BoxedValue`]
//! - [`heap`] -- [`Heap`], [`ThreadStack`], [`ThreadGuard`]
//! - [`snapshot`] -- [`HeapSnapshot`], [`LoadedHeap`]

pub mod array;
pub mod boxed;
pub mod class;
pub mod error;
pub mod heap;
pub mod instance;
pub mod snapshot;

pub use array::ArrayObject;
pub use boxed::BoxedValue;
pub use class::{Class, ClassBuilder, FieldDef, FieldKind};
pub use error::{HeapError, Result};
pub use heap::{Heap, ThreadGuard, ThreadStack};
pub use instance::{FieldGuard, Instance};
pub use snapshot::{HeapSnapshot, LoadedHeap};
