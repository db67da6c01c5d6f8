//! Capabilities the traversal engine consumes.
//!
//! A heap implementation provides a [`RootEnumerator`]; object graphs are
//! walked through a [`GraphIntrospector`]. Both are object-safe and
//! `Send + Sync` so a scan can run on a worker thread.

use crate::edge::Edge;
use crate::object::LiveObject;
use crate::root::Root;

/// Lazy sequence of outgoing references from one object.
pub type Children<'a> = Box<dyn Iterator<Item = (Edge, LiveObject)> + 'a>;

/// Enumerates an object's outgoing references.
///
/// Each call returns a fresh sequence; the object is live and may have
/// changed since a previous call. A slot that cannot be read must be
/// reported as `(Edge::Unresolvable, LiveObject::null())` instead of
/// failing the whole sequence.
pub trait GraphIntrospector: Send + Sync {
    /// Outgoing references of `obj`. The null handle has none.
    fn children<'a>(&'a self, obj: &LiveObject) -> Children<'a>;
}

/// Source of the runtime's GC roots.
pub trait RootEnumerator: Send + Sync {
    /// Roots known to the runtime (static state, thread stacks) in a fixed
    /// order. May contain duplicates and null values.
    fn runtime_roots(&self) -> Vec<Root>;

    /// Runtime roots followed by `hints`, duplicates and nulls removed.
    fn enumerate(&self, hints: &[LiveObject]) -> Vec<Root> {
        Root::coalesce(self.runtime_roots(), hints)
    }
}

/// A fixed root list, for hint-only scans and fixtures.
#[derive(Clone, Debug, Default)]
pub struct FixedRoots(pub Vec<Root>);

impl FixedRoots {
    /// No runtime roots at all; only hints take part in a scan.
    pub fn none() -> Self {
        Self(Vec::new())
    }
}

impl RootEnumerator for FixedRoots {
    fn runtime_roots(&self) -> Vec<Root> {
        self.0.clone()
    }
}
