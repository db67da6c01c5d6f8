//! Reference arrays.
//!
//! The element vector sits behind one lock; its length is mirrored in an
//! atomic updated under that lock. Scanners read the atomic to decide how
//! many slots to visit and then `try_read` each slot, so an array that
//! shrinks mid-scan reports the missing tail as vanished slots.

use std::any::Any;
use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

use liveref_types::{Edge, LiveObject, TraceError, TraceResult, Traced};

use crate::error::{HeapError, Result};

const HEADER_SIZE: usize = 16;
const SLOT_SIZE: usize = 8;

/// A growable array of references with a declared element type.
pub struct ArrayObject {
    type_name: String,
    items: RwLock<Vec<LiveObject>>,
    len: AtomicUsize,
}

impl ArrayObject {
    /// Create an empty array of `element_type`.
    pub fn new(element_type: &str) -> Self {
        Self::with_items(element_type, Vec::new())
    }

    /// Create an array holding `items`.
    pub fn with_items(element_type: &str, items: Vec<LiveObject>) -> Self {
        let len = items.len();
        Self {
            type_name: format!("{element_type}[]"),
            items: RwLock::new(items),
            len: AtomicUsize::new(len),
        }
    }

    /// Allocate an array and return its handle.
    pub fn alloc(element_type: &str, items: Vec<LiveObject>) -> LiveObject {
        LiveObject::new(Self::with_items(element_type, items))
    }

    /// Current length.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Returns `true` if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the element at `index`.
    pub fn get(&self, index: usize) -> Result<LiveObject> {
        let items = self.read()?;
        items.get(index).cloned().ok_or(HeapError::IndexOutOfBounds {
            index,
            len: items.len(),
        })
    }

    /// Replace the element at `index`, returning the previous one.
    pub fn set(&self, index: usize, value: LiveObject) -> Result<LiveObject> {
        let mut items = self.write()?;
        let len = items.len();
        let slot = items
            .get_mut(index)
            .ok_or(HeapError::IndexOutOfBounds { index, len })?;
        Ok(std::mem::replace(slot, value))
    }

    /// Append an element.
    pub fn push(&self, value: LiveObject) -> Result<()> {
        let mut items = self.write()?;
        items.push(value);
        self.len.store(items.len(), Ordering::Release);
        Ok(())
    }

    /// Shorten the array to `len` elements.
    pub fn truncate(&self, len: usize) -> Result<()> {
        let mut items = self.write()?;
        items.truncate(len);
        self.len.store(items.len(), Ordering::Release);
        Ok(())
    }

    /// Remove every element.
    pub fn clear(&self) -> Result<()> {
        self.truncate(0)
    }

    /// Copy of the current elements.
    pub fn to_vec(&self) -> Result<Vec<LiveObject>> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<LiveObject>>> {
        self.items
            .read()
            .map_err(|e| HeapError::LockPoisoned(format!("{}: {e}", self.type_name)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<LiveObject>>> {
        self.items
            .write()
            .map_err(|e| HeapError::LockPoisoned(format!("{}: {e}", self.type_name)))
    }
}

impl Traced for ArrayObject {
    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.type_name)
    }

    fn edge_count(&self) -> usize {
        self.len()
    }

    fn edge(&self, index: usize) -> TraceResult<(Edge, LiveObject)> {
        match self.items.try_read() {
            Ok(items) => match items.get(index) {
                Some(obj) => Ok((Edge::Index(index), obj.clone())),
                None => Err(TraceError::SlotVanished {
                    type_name: self.type_name.clone(),
                    index,
                    len: items.len(),
                }),
            },
            Err(TryLockError::WouldBlock) => Err(TraceError::SlotLocked {
                type_name: self.type_name.clone(),
                slot: format!("[{index}]"),
            }),
            Err(TryLockError::Poisoned(_)) => Err(TraceError::SlotPoisoned {
                type_name: self.type_name.clone(),
                slot: format!("[{index}]"),
            }),
        }
    }

    fn shallow_size(&self) -> usize {
        HEADER_SIZE + SLOT_SIZE * self.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
