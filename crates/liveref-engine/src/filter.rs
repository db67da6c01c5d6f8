//! Traversal pruning.
//!
//! A [`Filter`] is consulted for every candidate object, roots included,
//! together with how the scan reached it ([`Referrer`]). Rejecting an object
//! keeps the scan from visiting it through that reference; it can still be
//! reached through another one. Filters must be pure: the engine may call
//! them in any order and does not remember their answers.

use std::collections::HashMap;

use liveref_types::{Edge, LiveObject, ObjectKey, Root};

/// How the scan reached a candidate object.
#[derive(Clone, Copy, Debug)]
pub enum Referrer<'a> {
    /// The object is held by a root.
    Root(&'a Root),
    /// The object is referenced by `from` through `edge`.
    Object {
        from: &'a LiveObject,
        edge: &'a Edge,
    },
}

impl<'a> Referrer<'a> {
    /// The referring object, `None` for roots.
    pub fn from(&self) -> Option<&'a LiveObject> {
        match self {
            Self::Root(_) => None,
            Self::Object { from, .. } => Some(from),
        }
    }

    /// The edge label, `None` for roots.
    pub fn edge(&self) -> Option<&'a Edge> {
        match self {
            Self::Root(_) => None,
            Self::Object { edge, .. } => Some(edge),
        }
    }
}

/// Decides whether the scan may visit `object` through `referrer`.
pub trait Filter: Send + Sync {
    fn accept(&self, object: &LiveObject, referrer: Referrer<'_>) -> bool;
}

/// Accepts everything. The default when no filter is given.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl Filter for AcceptAll {
    fn accept(&self, _object: &LiveObject, _referrer: Referrer<'_>) -> bool {
        true
    }
}

/// A filter backed by a closure. See [`from_fn`].
#[derive(Clone, Copy, Debug)]
pub struct FnFilter<F>(F);

/// Wrap a closure as a [`Filter`].
pub fn from_fn<F>(f: F) -> FnFilter<F>
where
    F: Fn(&LiveObject, Referrer<'_>) -> bool + Send + Sync,
{
    FnFilter(f)
}

impl<F> Filter for FnFilter<F>
where
    F: Fn(&LiveObject, Referrer<'_>) -> bool + Send + Sync,
{
    fn accept(&self, object: &LiveObject, referrer: Referrer<'_>) -> bool {
        (self.0)(object, referrer)
    }
}

/// Accepts what both filters accept.
#[derive(Clone, Copy, Debug)]
pub struct And<A, B>(A, B);

impl<A: Filter, B: Filter> Filter for And<A, B> {
    fn accept(&self, object: &LiveObject, referrer: Referrer<'_>) -> bool {
        self.0.accept(object, referrer) && self.1.accept(object, referrer)
    }
}

/// Accepts what either filter accepts.
#[derive(Clone, Copy, Debug)]
pub struct Or<A, B>(A, B);

impl<A: Filter, B: Filter> Filter for Or<A, B> {
    fn accept(&self, object: &LiveObject, referrer: Referrer<'_>) -> bool {
        self.0.accept(object, referrer) || self.1.accept(object, referrer)
    }
}

/// Inverts a filter.
#[derive(Clone, Copy, Debug)]
pub struct Not<A>(A);

impl<A: Filter> Filter for Not<A> {
    fn accept(&self, object: &LiveObject, referrer: Referrer<'_>) -> bool {
        !self.0.accept(object, referrer)
    }
}

/// Combinators available on every sized filter.
pub trait FilterExt: Filter + Sized {
    fn and<B: Filter>(self, other: B) -> And<Self, B> {
        And(self, other)
    }

    fn or<B: Filter>(self, other: B) -> Or<Self, B> {
        Or(self, other)
    }

    fn not(self) -> Not<Self> {
        Not(self)
    }
}

impl<T: Filter> FilterExt for T {}

/// Excludes a fixed set of objects, compared by identity.
///
/// In the default mode the objects themselves are never visited. In
/// [`boundary`](SkipObjects::boundary) mode they are visited but nothing is
/// reached through them.
#[derive(Clone, Debug, Default)]
pub struct SkipObjects {
    objects: HashMap<ObjectKey, LiveObject>,
    boundary: bool,
}

impl SkipObjects {
    /// An empty skip set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip every object in `objects`.
    pub fn from_objects<'a>(objects: impl IntoIterator<Item = &'a LiveObject>) -> Self {
        let mut skip = Self::new();
        for obj in objects {
            skip.insert(obj.clone());
        }
        skip
    }

    /// Switch to boundary mode.
    pub fn boundary(mut self) -> Self {
        self.boundary = true;
        self
    }

    /// Add an object. Null is ignored. Returns `true` if newly added.
    pub fn insert(&mut self, obj: LiveObject) -> bool {
        if obj.is_null() {
            return false;
        }
        self.objects.insert(obj.key(), obj).is_none()
    }

    /// Whether `obj` is in the set.
    pub fn contains(&self, obj: &LiveObject) -> bool {
        self.objects.contains_key(&obj.key())
    }

    /// Number of skipped objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if nothing is skipped.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Filter for SkipObjects {
    fn accept(&self, object: &LiveObject, referrer: Referrer<'_>) -> bool {
        if self.boundary {
            referrer.from().map_or(true, |from| !self.contains(from))
        } else {
            !self.contains(object)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liveref_heap::BoxedValue;

    fn via(from: &LiveObject, edge: &Edge, f: &dyn Filter, obj: &LiveObject) -> bool {
        f.accept(obj, Referrer::Object { from, edge })
    }

    #[test]
    fn accept_all_accepts() {
        let a = BoxedValue::alloc_int(1);
        let root = Root::static_field("App", "a", a.clone());
        assert!(AcceptAll.accept(&a, Referrer::Root(&root)));
    }

    #[test]
    fn skip_objects_by_identity() {
        let a = BoxedValue::alloc_int(1);
        let twin = BoxedValue::alloc_int(1);
        let skip = SkipObjects::from_objects([&a]);
        let edge = Edge::field("x");
        assert!(!via(&twin, &edge, &skip, &a));
        assert!(via(&a, &edge, &skip, &twin));
        assert_eq!(skip.len(), 1);
    }

    #[test]
    fn boundary_mode_blocks_outgoing_only() {
        let a = BoxedValue::alloc_int(1);
        let b = BoxedValue::alloc_int(2);
        let skip = SkipObjects::from_objects([&a]).boundary();
        let edge = Edge::field("x");
        let root = Root::static_field("App", "a", a.clone());
        assert!(skip.accept(&a, Referrer::Root(&root)));
        assert!(!via(&a, &edge, &skip, &b));
        assert!(via(&b, &edge, &skip, &a));
    }

    #[test]
    fn null_is_never_inserted() {
        let mut skip = SkipObjects::new();
        assert!(!skip.insert(LiveObject::null()));
        assert!(skip.is_empty());
    }

    #[test]
    fn combinators() {
        let a = BoxedValue::alloc_int(1);
        let b = BoxedValue::alloc_int(2);
        let edge = Edge::field("next");
        let not_a = SkipObjects::from_objects([&a]);
        let only_next = from_fn(|_, r| r.edge().and_then(Edge::field_name) == Some("next"));

        let both = not_a.clone().and(only_next);
        assert!(via(&a, &edge, &both, &b));
        assert!(!via(&b, &edge, &both, &a));

        let either = SkipObjects::from_objects([&a]).or(AcceptAll);
        assert!(via(&b, &edge, &either, &a));

        let inverted = not_a.not();
        assert!(via(&b, &edge, &inverted, &a));
        assert!(!via(&a, &edge, &inverted, &b));
    }
}
