//! Default graph introspection through the [`Traced`] trait, and the
//! panic guard the engine wraps around every introspector.

use std::panic::{catch_unwind, AssertUnwindSafe};

use liveref_types::{Children, Edge, GraphIntrospector, LiveObject, Traced};
use tracing::{trace, warn};

/// Walks objects through [`Traced::edge_count`] and [`Traced::edge`].
///
/// The slot count is read once per call to [`children`]; every slot that
/// fails to resolve afterwards is yielded as `(Edge::Unresolvable, null)`.
///
/// [`children`]: GraphIntrospector::children
#[derive(Clone, Copy, Debug, Default)]
pub struct TracedIntrospector;

impl GraphIntrospector for TracedIntrospector {
    fn children<'a>(&'a self, obj: &LiveObject) -> Children<'a> {
        let Some(traced) = obj.traced_arc() else {
            return Box::new(std::iter::empty());
        };
        let count = traced.edge_count();
        Box::new((0..count).map(move |index| read_edge(traced.as_ref(), index)))
    }
}

fn read_edge(traced: &dyn Traced, index: usize) -> (Edge, LiveObject) {
    match traced.edge(index) {
        Ok(pair) => pair,
        Err(err) => {
            trace!(index, error = %err, "unresolvable edge");
            (Edge::Unresolvable, LiveObject::null())
        }
    }
}

/// Children of `obj` with panics turned into unresolvable edges.
///
/// A panic while starting the sequence yields a single sentinel edge; a
/// panic while advancing it yields one sentinel edge and ends the sequence.
pub(crate) fn guarded<'a>(introspector: &'a dyn GraphIntrospector, obj: &LiveObject) -> Guarded<'a> {
    match catch_unwind(AssertUnwindSafe(|| introspector.children(obj))) {
        Ok(inner) => Guarded {
            inner: Some(inner),
            failed: false,
        },
        Err(_) => {
            warn!(object = obj.key().as_usize(), "introspection panicked");
            Guarded {
                inner: None,
                failed: true,
            }
        }
    }
}

pub(crate) struct Guarded<'a> {
    inner: Option<Children<'a>>,
    failed: bool,
}

impl Iterator for Guarded<'_> {
    type Item = (Edge, LiveObject);

    fn next(&mut self) -> Option<(Edge, LiveObject)> {
        if self.failed {
            self.failed = false;
            return Some((Edge::Unresolvable, LiveObject::null()));
        }
        let inner = self.inner.as_mut()?;
        match catch_unwind(AssertUnwindSafe(|| inner.next())) {
            Ok(item) => item,
            Err(_) => {
                warn!("edge iteration panicked");
                self.inner = None;
                Some((Edge::Unresolvable, LiveObject::null()))
            }
        }
    }
}
