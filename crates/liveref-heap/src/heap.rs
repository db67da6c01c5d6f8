//! The root registry: static fields and attached thread stacks.
//!
//! [`Heap`] is a cheap, cloneable handle. It does not own ordinary objects
//! (those live as long as something references them); it only records the
//! references the runtime treats as GC roots.

use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use liveref_types::{LiveObject, Root, RootEnumerator};

use crate::error::{HeapError, Result};

#[derive(Default)]
struct Registry {
    statics: RwLock<BTreeMap<(String, String), LiveObject>>,
    threads: RwLock<Vec<Arc<ThreadStack>>>,
    next_thread_id: AtomicU64,
}

/// Registry of static fields and thread stacks.
#[derive(Clone, Default)]
pub struct Heap {
    registry: Arc<Registry>,
}

impl Heap {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` in the static field `owner.field`, returning the previous value.
    pub fn set_static(&self, owner: &str, field: &str, value: LiveObject) -> Option<LiveObject> {
        debug!(owner, field, value = %value, "set static");
        self.registry
            .statics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((owner.to_string(), field.to_string()), value)
    }

    /// Current value of `owner.field`.
    pub fn get_static(&self, owner: &str, field: &str) -> Option<LiveObject> {
        self.registry
            .statics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(owner.to_string(), field.to_string()))
            .cloned()
    }

    /// Remove `owner.field` entirely.
    pub fn clear_static(&self, owner: &str, field: &str) -> Option<LiveObject> {
        debug!(owner, field, "clear static");
        self.registry
            .statics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(owner.to_string(), field.to_string()))
    }

    /// Number of static fields.
    pub fn static_count(&self) -> usize {
        self.registry
            .statics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Register a thread stack. It is detached when the guard drops.
    pub fn attach_thread(&self, name: &str) -> ThreadGuard {
        let id = self.registry.next_thread_id.fetch_add(1, Ordering::Relaxed);
        let stack = Arc::new(ThreadStack {
            id,
            name: name.to_string(),
            frames: RwLock::new(Vec::new()),
        });
        self.registry
            .threads
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&stack));
        debug!(thread = name, id, "attached thread");
        ThreadGuard {
            registry: Arc::clone(&self.registry),
            stack,
        }
    }

    /// Names of attached threads, in attach order.
    pub fn thread_names(&self) -> Vec<String> {
        self.registry
            .threads
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|t| t.name.clone())
            .collect()
    }
}

impl RootEnumerator for Heap {
    /// Static fields sorted by owner then field, then every thread's locals,
    /// threads in attach order and frames bottom to top.
    fn runtime_roots(&self) -> Vec<Root> {
        let mut roots: Vec<Root> = self
            .registry
            .statics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|((owner, field), value)| Root::static_field(owner.as_str(), field.as_str(), value.clone()))
            .collect();

        let threads: Vec<Arc<ThreadStack>> = self
            .registry
            .threads
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for thread in &threads {
            thread.collect_roots(&mut roots);
        }

        debug!(roots = roots.len(), threads = threads.len(), "enumerated runtime roots");
        roots
    }
}

impl std::fmt::Debug for Heap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heap")
            .field("statics", &self.static_count())
            .field("threads", &self.thread_names())
            .finish()
    }
}

#[derive(Debug)]
struct Frame {
    method: String,
    locals: Vec<(String, LiveObject)>,
}

/// One thread's execution stack.
#[derive(Debug)]
pub struct ThreadStack {
    id: u64,
    name: String,
    frames: RwLock<Vec<Frame>>,
}

impl ThreadStack {
    /// Thread name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of frames on the stack.
    pub fn depth(&self) -> usize {
        self.frames.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Push a frame for `method`. Returns the new frame's index.
    pub fn push_frame(&self, method: &str) -> usize {
        let mut frames = self.frames.write().unwrap_or_else(PoisonError::into_inner);
        frames.push(Frame {
            method: method.to_string(),
            locals: Vec::new(),
        });
        frames.len() - 1
    }

    /// Pop the top frame, dropping its locals. Returns `false` if empty.
    pub fn pop_frame(&self) -> bool {
        self.frames
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .is_some()
    }

    /// Set a local in the top frame, replacing any previous value.
    pub fn set_local(&self, slot: &str, value: LiveObject) -> Result<()> {
        let mut frames = self.frames.write().unwrap_or_else(PoisonError::into_inner);
        let frame = frames.last_mut().ok_or_else(|| HeapError::NoActiveFrame {
            thread: self.name.clone(),
        })?;
        match frame.locals.iter_mut().find(|(name, _)| name == slot) {
            Some((_, existing)) => *existing = value,
            None => frame.locals.push((slot.to_string(), value)),
        }
        Ok(())
    }

    /// Remove a local from the top frame. Returns the removed value.
    pub fn clear_local(&self, slot: &str) -> Option<LiveObject> {
        let mut frames = self.frames.write().unwrap_or_else(PoisonError::into_inner);
        let frame = frames.last_mut()?;
        let pos = frame.locals.iter().position(|(name, _)| name == slot)?;
        Some(frame.locals.remove(pos).1)
    }

    fn collect_roots(&self, roots: &mut Vec<Root>) {
        let frames = self.frames.read().unwrap_or_else(PoisonError::into_inner);
        for (index, frame) in frames.iter().enumerate() {
            for (slot, value) in &frame.locals {
                roots.push(Root::ThreadFrame {
                    thread: self.name.clone(),
                    frame: index,
                    method: frame.method.clone(),
                    slot: slot.clone(),
                    value: value.clone(),
                });
            }
        }
    }
}

/// Keeps a thread stack attached to its heap.
pub struct ThreadGuard {
    registry: Arc<Registry>,
    stack: Arc<ThreadStack>,
}

impl Deref for ThreadGuard {
    type Target = ThreadStack;

    fn deref(&self) -> &ThreadStack {
        &self.stack
    }
}

impl Drop for ThreadGuard {
    fn drop(&mut self) {
        let id = self.stack.id;
        self.registry
            .threads
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|t| t.id != id);
        debug!(thread = %self.stack.name, id, "detached thread");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxed::BoxedValue;
    use liveref_types::RootKind;

    #[test]
    fn statics_are_sorted_roots() {
        let heap = Heap::new();
        let a = BoxedValue::alloc_int(1);
        let b = BoxedValue::alloc_int(2);
        heap.set_static("Zeta", "x", a.clone());
        heap.set_static("Alpha", "y", b.clone());

        let roots = heap.runtime_roots();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].describe(), "static Alpha.y");
        assert_eq!(roots[0].object(), &b);
        assert_eq!(roots[1].object(), &a);
    }

    #[test]
    fn set_and_clear_static() {
        let heap = Heap::new();
        let a = BoxedValue::alloc_int(1);
        assert!(heap.set_static("App", "x", a.clone()).is_none());
        assert_eq!(heap.get_static("App", "x"), Some(a.clone()));
        assert_eq!(heap.clear_static("App", "x"), Some(a));
        assert_eq!(heap.static_count(), 0);
    }

    #[test]
    fn thread_locals_become_roots_until_detached() {
        let heap = Heap::new();
        let obj = BoxedValue::alloc_str("local");
        {
            let thread = heap.attach_thread("worker");
            assert!(matches!(
                thread.set_local("x", obj.clone()),
                Err(HeapError::NoActiveFrame { .. })
            ));
            thread.push_frame("run");
            thread.push_frame("step");
            thread.set_local("x", obj.clone()).unwrap();

            let roots = heap.runtime_roots();
            assert_eq!(roots.len(), 1);
            assert_eq!(roots[0].kind(), RootKind::ThreadFrame);
            assert_eq!(roots[0].describe(), "thread worker frame #1 (step) local x");
            assert_eq!(heap.thread_names(), vec!["worker".to_string()]);

            assert_eq!(thread.clear_local("x"), Some(obj.clone()));
            assert!(heap.runtime_roots().is_empty());
            thread.set_local("x", obj.clone()).unwrap();
            assert!(thread.pop_frame());
            assert!(heap.runtime_roots().is_empty());
            assert_eq!(thread.depth(), 1);
        }
        assert!(heap.thread_names().is_empty());
    }

    #[test]
    fn enumerate_appends_hints_and_coalesces() {
        let heap = Heap::new();
        let a = BoxedValue::alloc_int(1);
        let hint = BoxedValue::alloc_int(2);
        heap.set_static("App", "a", a.clone());
        let thread = heap.attach_thread("main");
        thread.push_frame("main");
        thread.set_local("same", a.clone()).unwrap();

        let roots = heap.enumerate(&[hint.clone(), a]);
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].kind(), RootKind::StaticField);
        assert_eq!(roots[1].kind(), RootKind::ExplicitHint);
        assert_eq!(roots[1].object(), &hint);
    }
}
