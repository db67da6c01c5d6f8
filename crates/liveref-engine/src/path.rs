//! Reference paths from a root to a target.
//!
//! A [`Path`] is an immutable singly-linked chain. The head usually stands
//! for a [`Root`] and carries no object; each following link holds an object
//! and the reference it uses to reach the next node; the terminal node holds
//! the target. Nodes are shared through `Arc`, so a factory may reuse tails.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use liveref_types::{describe_object, Edge, LiveObject, Root};

/// One node of a [`Path`].
#[derive(Clone, Debug)]
pub enum PathNode {
    /// The root that holds the next node's object.
    Root(Root),
    /// `item` references the next node's object through `edge`.
    Link { item: LiveObject, edge: Edge },
    /// The object the scan was asked for.
    Target(LiveObject),
}

/// Immutable chain of references ending at a target object.
#[derive(Clone)]
pub struct Path {
    node: PathNode,
    next: Option<Arc<Path>>,
}

impl Path {
    /// Head node standing for `root`.
    pub fn with_root(root: Root, next: Arc<Path>) -> Self {
        Self {
            node: PathNode::Root(root),
            next: Some(next),
        }
    }

    /// Intermediate node: `item` reaches `next` through `edge`.
    pub fn with_link(item: LiveObject, edge: Edge, next: Arc<Path>) -> Self {
        Self {
            node: PathNode::Link { item, edge },
            next: Some(next),
        }
    }

    /// Terminal node.
    pub fn terminal(target: LiveObject) -> Self {
        Self {
            node: PathNode::Target(target),
            next: None,
        }
    }

    /// This node.
    pub fn node(&self) -> &PathNode {
        &self.node
    }

    /// The object at this node, `None` for a root node.
    pub fn object(&self) -> Option<&LiveObject> {
        match &self.node {
            PathNode::Root(_) => None,
            PathNode::Link { item, .. } => Some(item),
            PathNode::Target(target) => Some(target),
        }
    }

    /// The following node, `None` at the terminal.
    pub fn next_node(&self) -> Option<&Path> {
        self.next.as_deref()
    }

    /// Label of the reference leaving this node: the root descriptor, a
    /// field name or `[index]`. Empty at the terminal.
    pub fn describe_reference(&self) -> String {
        match &self.node {
            PathNode::Root(root) => root.describe(),
            PathNode::Link { edge, .. } => edge.to_string(),
            PathNode::Target(_) => String::new(),
        }
    }

    /// The root this chain starts from, if its head is a root node.
    pub fn root(&self) -> Option<&Root> {
        match &self.node {
            PathNode::Root(root) => Some(root),
            _ => None,
        }
    }

    /// The terminal object.
    pub fn target(&self) -> &LiveObject {
        let mut node = self;
        loop {
            match (&node.node, node.next.as_deref()) {
                (_, Some(next)) => node = next,
                (PathNode::Target(target), None) => return target,
                (PathNode::Link { item, .. }, None) => return item,
                (PathNode::Root(root), None) => return root.object(),
            }
        }
    }

    /// Nodes from this one to the terminal.
    pub fn iter(&self) -> Iter<'_> {
        Iter { node: Some(self) }
    }

    /// Number of references from the first object to the target.
    pub fn distance(&self) -> usize {
        self.iter()
            .filter(|n| matches!(n.node, PathNode::Link { .. }))
            .count()
    }

    /// Whether `obj` appears anywhere on the chain.
    pub fn contains(&self, obj: &LiveObject) -> bool {
        self.iter().any(|n| n.object() == Some(obj))
    }

    /// Whether `obj` appears strictly between the root and the target.
    pub fn passes_through(&self, obj: &LiveObject) -> bool {
        self.iter()
            .any(|n| matches!(&n.node, PathNode::Link { item, .. } if item == obj))
    }

    /// Flattened form for structured output.
    pub fn steps(&self) -> Vec<PathStep> {
        self.iter()
            .map(|n| PathStep {
                object: n.object().map(describe_object),
                reference: match n.node {
                    PathNode::Target(_) => None,
                    _ => Some(n.describe_reference()),
                },
            })
            .collect()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match &node.node {
                PathNode::Root(root) => write!(f, "{}->", root.describe())?,
                PathNode::Link { item, edge } => write!(f, "{}-{}->", describe_object(item), edge)?,
                PathNode::Target(target) => f.write_str(&describe_object(target))?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|n| &n.node)).finish()
    }
}

impl Drop for Path {
    // Unlink iteratively; chains can be as long as the heap is deep.
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(node) = next {
            match Arc::try_unwrap(node) {
                Ok(mut owned) => next = owned.next.take(),
                Err(_) => break,
            }
        }
    }
}

/// Iterator over the nodes of a [`Path`].
pub struct Iter<'a> {
    node: Option<&'a Path>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Path;

    fn next(&mut self) -> Option<&'a Path> {
        let node = self.node?;
        self.node = node.next_node();
        Some(node)
    }
}

/// One rendered node, for JSON output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PathStep {
    /// `Type@hash`, absent for the root node.
    pub object: Option<String>,
    /// Outgoing reference label, absent at the terminal.
    pub reference: Option<String>,
}

/// Builds path nodes for the traversal engine.
///
/// Paths are assembled back to front: the terminal first, then one link per
/// predecessor, then the root.
pub trait PathFactory: Send + Sync {
    fn root(&self, root: &Root, next: Arc<Path>) -> Arc<Path>;

    fn link(&self, item: &LiveObject, edge: &Edge, next: Arc<Path>) -> Arc<Path>;

    fn target(&self, target: &LiveObject) -> Arc<Path>;
}

/// Default factory: plain [`Path`] nodes.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChainFactory;

impl PathFactory for ChainFactory {
    fn root(&self, root: &Root, next: Arc<Path>) -> Arc<Path> {
        Arc::new(Path::with_root(root.clone(), next))
    }

    fn link(&self, item: &LiveObject, edge: &Edge, next: Arc<Path>) -> Arc<Path> {
        Arc::new(Path::with_link(item.clone(), edge.clone(), next))
    }

    fn target(&self, target: &LiveObject) -> Arc<Path> {
        Arc::new(Path::terminal(target.clone()))
    }
}
