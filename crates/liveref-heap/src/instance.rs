//! Composite objects: an instance of a [`Class`].
//!
//! Each slot has its own `RwLock`. Mutators take the write lock briefly;
//! the scanner only ever uses `try_read`, so a held [`FieldGuard`] shows up
//! as a locked slot instead of stalling the scan.

use std::any::Any;
use std::borrow::Cow;
use std::sync::{Arc, RwLock, RwLockWriteGuard, TryLockError};

use liveref_types::{Edge, LiveObject, TraceError, TraceResult, Traced};

use crate::class::{Class, FieldKind};
use crate::error::{HeapError, Result};

const HEADER_SIZE: usize = 16;
const SLOT_SIZE: usize = 8;

#[derive(Clone, Debug)]
enum Slot {
    Reference(LiveObject),
    Primitive(i64),
}

/// An object whose layout is given by its [`Class`].
pub struct Instance {
    class: Arc<Class>,
    slots: Vec<RwLock<Slot>>,
}

impl Instance {
    /// Create an instance with null references and zeroed primitives.
    pub fn new(class: &Arc<Class>) -> Self {
        let slots = class
            .fields()
            .iter()
            .map(|f| {
                RwLock::new(match f.kind {
                    FieldKind::Reference => Slot::Reference(LiveObject::null()),
                    FieldKind::Primitive => Slot::Primitive(0),
                })
            })
            .collect();
        Self {
            class: Arc::clone(class),
            slots,
        }
    }

    /// Allocate a new instance and return its handle.
    pub fn alloc(class: &Arc<Class>) -> LiveObject {
        LiveObject::new(Self::new(class))
    }

    /// The instance's class.
    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }

    /// Read a reference field.
    pub fn get(&self, field: &str) -> Result<LiveObject> {
        let slot = self.slot_index(field, FieldKind::Reference)?;
        let guard = self.slots[slot]
            .read()
            .map_err(|e| HeapError::LockPoisoned(format!("{}.{field}: {e}", self.class.name())))?;
        match &*guard {
            Slot::Reference(obj) => Ok(obj.clone()),
            Slot::Primitive(_) => Err(self.kind_mismatch(field, FieldKind::Reference)),
        }
    }

    /// Store a reference, returning the previous value.
    pub fn set(&self, field: &str, value: LiveObject) -> Result<LiveObject> {
        let slot = self.slot_index(field, FieldKind::Reference)?;
        let mut guard = self.slots[slot]
            .write()
            .map_err(|e| HeapError::LockPoisoned(format!("{}.{field}: {e}", self.class.name())))?;
        match std::mem::replace(&mut *guard, Slot::Reference(value)) {
            Slot::Reference(previous) => Ok(previous),
            Slot::Primitive(_) => Ok(LiveObject::null()),
        }
    }

    /// Read a primitive field.
    pub fn get_primitive(&self, field: &str) -> Result<i64> {
        let slot = self.slot_index(field, FieldKind::Primitive)?;
        let guard = self.slots[slot]
            .read()
            .map_err(|e| HeapError::LockPoisoned(format!("{}.{field}: {e}", self.class.name())))?;
        match &*guard {
            Slot::Primitive(v) => Ok(*v),
            Slot::Reference(_) => Err(self.kind_mismatch(field, FieldKind::Primitive)),
        }
    }

    /// Store a primitive value.
    pub fn set_primitive(&self, field: &str, value: i64) -> Result<()> {
        let slot = self.slot_index(field, FieldKind::Primitive)?;
        let mut guard = self.slots[slot]
            .write()
            .map_err(|e| HeapError::LockPoisoned(format!("{}.{field}: {e}", self.class.name())))?;
        *guard = Slot::Primitive(value);
        Ok(())
    }

    /// Hold a reference field's write lock, as a synchronized writer would.
    ///
    /// While the guard lives, scanners see this field as unresolvable.
    pub fn lock_field(&self, field: &str) -> Result<FieldGuard<'_>> {
        let slot = self.slot_index(field, FieldKind::Reference)?;
        let guard = self.slots[slot]
            .write()
            .map_err(|e| HeapError::LockPoisoned(format!("{}.{field}: {e}", self.class.name())))?;
        Ok(FieldGuard { guard })
    }

    fn slot_index(&self, field: &str, expected: FieldKind) -> Result<usize> {
        let slot = self.class.slot_of(field).ok_or_else(|| HeapError::UnknownField {
            class: self.class.name().to_string(),
            field: field.to_string(),
        })?;
        if self.class.fields()[slot].kind != expected {
            return Err(self.kind_mismatch(field, expected));
        }
        Ok(slot)
    }

    fn kind_mismatch(&self, field: &str, expected: FieldKind) -> HeapError {
        HeapError::FieldKindMismatch {
            class: self.class.name().to_string(),
            field: field.to_string(),
            expected,
        }
    }
}

impl Traced for Instance {
    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.class.name())
    }

    fn edge_count(&self) -> usize {
        self.class.reference_slots().len()
    }

    fn edge(&self, index: usize) -> TraceResult<(Edge, LiveObject)> {
        let Some(&slot) = self.class.reference_slots().get(index) else {
            return Err(TraceError::NoSuchEdge {
                type_name: self.class.name().to_string(),
                index,
            });
        };
        let field = &self.class.fields()[slot];
        match self.slots[slot].try_read() {
            Ok(guard) => match &*guard {
                Slot::Reference(obj) => Ok((Edge::Field(Arc::clone(&field.name)), obj.clone())),
                Slot::Primitive(_) => Err(TraceError::Unreadable(format!(
                    "{}.{} holds a primitive",
                    self.class.name(),
                    field.name
                ))),
            },
            Err(TryLockError::WouldBlock) => Err(TraceError::SlotLocked {
                type_name: self.class.name().to_string(),
                slot: field.name.to_string(),
            }),
            Err(TryLockError::Poisoned(_)) => Err(TraceError::SlotPoisoned {
                type_name: self.class.name().to_string(),
                slot: field.name.to_string(),
            }),
        }
    }

    fn shallow_size(&self) -> usize {
        HEADER_SIZE + SLOT_SIZE * self.slots.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Exclusive access to one reference field. See [`Instance::lock_field`].
pub struct FieldGuard<'a> {
    guard: RwLockWriteGuard<'a, Slot>,
}

impl FieldGuard<'_> {
    /// Current value of the locked field.
    pub fn get(&self) -> LiveObject {
        match &*self.guard {
            Slot::Reference(obj) => obj.clone(),
            Slot::Primitive(_) => LiveObject::null(),
        }
    }

    /// Replace the locked field's value.
    pub fn set(&mut self, value: LiveObject) {
        *self.guard = Slot::Reference(value);
    }
}
