//! Reachable-set census: how many objects, and how many bytes, hang off a
//! set of starting objects.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use liveref_types::{GraphIntrospector, LiveObject, ObjectKey, Root};

use crate::filter::{Filter, Referrer};
use crate::introspect::guarded;

/// Per-type totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeStats {
    pub count: usize,
    pub size: usize,
}

/// Objects reachable from a starting set, grouped by type name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Census {
    pub total_objects: usize,
    pub total_size: usize,
    pub by_type: BTreeMap<String, TypeStats>,
    pub unresolvable_edges: usize,
    /// The walk stopped early (cancellation or visit limit).
    pub partial: bool,
}

impl Census {
    /// Types ordered by total size, largest first; ties by name.
    pub fn largest_types(&self) -> Vec<(&str, TypeStats)> {
        let mut types: Vec<(&str, TypeStats)> = self
            .by_type
            .iter()
            .map(|(name, stats)| (name.as_str(), *stats))
            .collect();
        types.sort_by(|a, b| b.1.size.cmp(&a.1.size).then_with(|| a.0.cmp(b.0)));
        types
    }

    fn record(&mut self, obj: &LiveObject) {
        let (type_name, size) = catch_unwind(AssertUnwindSafe(|| {
            let size = obj.traced().map_or(0, |t| t.shallow_size());
            (obj.type_name().into_owned(), size)
        }))
        .unwrap_or_else(|_| ("<unknown>".to_string(), 0));
        self.total_objects += 1;
        self.total_size += size;
        let entry = self.by_type.entry(type_name).or_default();
        entry.count += 1;
        entry.size += size;
    }
}

/// Walk everything reachable from `start` that `filter` accepts.
///
/// Starting objects are offered to the filter as hint roots.
pub(crate) fn take_census(
    introspector: &dyn GraphIntrospector,
    start: &[LiveObject],
    filter: &dyn Filter,
    max_visited: Option<usize>,
    cancel: Option<&CancellationToken>,
) -> Census {
    let mut census = Census::default();
    // Holding each counted object keeps its address from being reused mid-walk.
    let mut seen: HashMap<ObjectKey, LiveObject> = HashMap::new();
    let mut queue: VecDeque<LiveObject> = VecDeque::new();
    let full = |census: &Census| max_visited.is_some_and(|max| census.total_objects >= max);

    for root in Root::coalesce(Vec::new(), start) {
        if !filter.accept(root.object(), Referrer::Root(&root)) {
            continue;
        }
        if full(&census) {
            census.partial = true;
            break;
        }
        seen.insert(root.object().key(), root.object().clone());
        census.record(root.object());
        queue.push_back(root.object().clone());
    }

    while !census.partial {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            census.partial = true;
            break;
        }
        let Some(current) = queue.pop_front() else {
            break;
        };
        for (edge, child) in guarded(introspector, &current) {
            if edge.is_unresolvable() {
                census.unresolvable_edges += 1;
            }
            if child.is_null() || seen.contains_key(&child.key()) {
                continue;
            }
            if !filter.accept(&child, Referrer::Object { from: &current, edge: &edge }) {
                continue;
            }
            if full(&census) {
                census.partial = true;
                break;
            }
            seen.insert(child.key(), child.clone());
            census.record(&child);
            queue.push_back(child);
        }
    }

    debug!(
        objects = census.total_objects,
        bytes = census.total_size,
        types = census.by_type.len(),
        partial = census.partial,
        "census complete"
    );
    census
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{AcceptAll, SkipObjects};
    use crate::introspect::TracedIntrospector;
    use liveref_heap::{ArrayObject, BoxedValue, Class, Instance};
    use liveref_types::{Children, Edge};

    /// Hands out a freshly allocated successor for every integer below the bound.
    struct Successors(i64);

    impl GraphIntrospector for Successors {
        fn children<'a>(&'a self, obj: &LiveObject) -> Children<'a> {
            match obj.downcast_ref::<BoxedValue>() {
                Some(BoxedValue::Int(v)) if *v < self.0 => {
                    Box::new(std::iter::once((Edge::field("succ"), BoxedValue::alloc_int(v + 1))))
                }
                _ => Box::new(std::iter::empty()),
            }
        }
    }

    fn fixture() -> (LiveObject, LiveObject, LiveObject) {
        let class = Class::builder("Holder").reference("items").primitive("id").build().unwrap();
        let holder = Instance::alloc(&class);
        let s = BoxedValue::alloc_str("abcd");
        let arr = ArrayObject::alloc("String", vec![s.clone(), s.clone(), LiveObject::null()]);
        holder.downcast_ref::<Instance>().unwrap().set("items", arr.clone()).unwrap();
        (holder, arr, s)
    }

    #[test]
    fn counts_each_object_once() {
        let (holder, arr, s) = fixture();
        let census = take_census(&TracedIntrospector, &[holder.clone()], &AcceptAll, None, None);
        assert_eq!(census.total_objects, 3);
        let expected = [&holder, &arr, &s]
            .iter()
            .map(|o| o.traced().unwrap().shallow_size())
            .sum::<usize>();
        assert_eq!(census.total_size, expected);
        assert_eq!(census.by_type["String"].count, 1);
        assert_eq!(census.by_type["String[]"].count, 1);
        assert!(!census.partial);
    }

    #[test]
    fn filter_prunes_subgraph() {
        let (holder, arr, _) = fixture();
        let skip = SkipObjects::from_objects([&arr]);
        let census = take_census(&TracedIntrospector, &[holder], &skip, None, None);
        assert_eq!(census.total_objects, 1);
        assert_eq!(census.by_type.len(), 1);
    }

    #[test]
    fn largest_types_first() {
        let (holder, _, _) = fixture();
        let census = take_census(&TracedIntrospector, &[holder], &AcceptAll, None, None);
        let order = census.largest_types();
        assert_eq!(order.len(), 3);
        assert!(order.windows(2).all(|w| w[0].1.size >= w[1].1.size));
    }

    #[test]
    fn limit_marks_partial() {
        let (holder, _, _) = fixture();
        let census = take_census(&TracedIntrospector, &[holder], &AcceptAll, Some(2), None);
        assert_eq!(census.total_objects, 2);
        assert!(census.partial);
    }

    #[test]
    fn transient_objects_are_each_counted() {
        let start = BoxedValue::alloc_int(0);
        let census = take_census(&Successors(1_000), &[start], &AcceptAll, None, None);
        assert_eq!(census.total_objects, 1_001);
        assert_eq!(census.by_type["Integer"].count, 1_001);
    }

    #[test]
    fn cancelled_before_start() {
        let (holder, _, _) = fixture();
        let token = CancellationToken::new();
        token.cancel();
        let census = take_census(&TracedIntrospector, &[holder], &AcceptAll, None, Some(&token));
        assert_eq!(census.total_objects, 1);
        assert!(census.partial);
    }
}
