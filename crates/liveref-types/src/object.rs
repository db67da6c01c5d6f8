//! Identity-compared handles to live objects.
//!
//! A [`LiveObject`] wraps an `Arc<dyn Traced>`. Equality and hashing use the
//! allocation address ([`ObjectKey`]), never the object's contents. The null
//! handle is a distinct, valid value with key zero.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use crate::edge::Edge;
use crate::error::{TraceError, TraceResult};

/// An object that can take part in a live reference graph.
///
/// Outgoing references are exposed by index so that callers can iterate
/// lazily: [`edge_count`](Traced::edge_count) is read once when iteration
/// starts and [`edge`](Traced::edge) is asked for each index in turn. An
/// object mutated between the two calls reports the discrepancy as a
/// [`TraceError`] rather than panicking.
pub trait Traced: Any + Send + Sync {
    /// Runtime type name used when rendering paths.
    fn type_name(&self) -> Cow<'_, str>;

    /// Number of reference slots at this moment.
    fn edge_count(&self) -> usize {
        0
    }

    /// Read the reference slot at `index`.
    fn edge(&self, index: usize) -> TraceResult<(Edge, LiveObject)> {
        Err(TraceError::NoSuchEdge {
            type_name: self.type_name().into_owned(),
            index,
        })
    }

    /// Approximate shallow size in bytes, used by reachable-set census.
    fn shallow_size(&self) -> usize {
        std::mem::size_of_val(self)
    }

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;
}

/// Identity of a live object: its allocation address, or zero for null.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(usize);

impl ObjectKey {
    /// The key of the null handle.
    pub const NULL: Self = Self(0);

    /// Returns `true` for the null key.
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Raw address value.
    pub fn as_usize(&self) -> usize {
        self.0
    }

    /// 32-bit identity hash used in rendered descriptions.
    pub fn identity_hash(&self) -> u32 {
        let addr = self.0 as u64;
        ((addr >> 3) ^ (addr >> 35)) as u32
    }
}

/// Handle to an object in the live graph, compared by identity.
#[derive(Clone, Default)]
pub struct LiveObject(Option<Arc<dyn Traced>>);

impl LiveObject {
    /// Allocate `value` and return a handle to it.
    pub fn new<T: Traced>(value: T) -> Self {
        let arc: Arc<dyn Traced> = Arc::new(value);
        Self(Some(arc))
    }

    /// Wrap an existing shared allocation.
    pub fn from_arc(arc: Arc<dyn Traced>) -> Self {
        Self(Some(arc))
    }

    /// The null handle.
    pub const fn null() -> Self {
        Self(None)
    }

    /// Returns `true` if this is the null handle.
    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    /// Identity key of this handle.
    pub fn key(&self) -> ObjectKey {
        match &self.0 {
            Some(arc) => ObjectKey(Arc::as_ptr(arc) as *const () as usize),
            None => ObjectKey::NULL,
        }
    }

    /// Identity comparison, the same as `==`.
    pub fn ptr_eq(&self, other: &LiveObject) -> bool {
        self.key() == other.key()
    }

    /// Borrow the traced object, `None` for null.
    pub fn traced(&self) -> Option<&dyn Traced> {
        self.0.as_deref()
    }

    /// Clone the shared allocation, `None` for null.
    pub fn traced_arc(&self) -> Option<Arc<dyn Traced>> {
        self.0.clone()
    }

    /// Runtime type name, `"null"` for the null handle.
    pub fn type_name(&self) -> Cow<'_, str> {
        match &self.0 {
            Some(obj) => obj.type_name(),
            None => Cow::Borrowed("null"),
        }
    }

    /// Downcast to a concrete object type.
    pub fn downcast_ref<T: Traced>(&self) -> Option<&T> {
        self.0.as_deref()?.as_any().downcast_ref::<T>()
    }

    /// Create a weak handle that does not keep the object alive.
    pub fn downgrade(&self) -> WeakObject {
        WeakObject(self.0.as_ref().map(Arc::downgrade))
    }

    /// Number of strong handles currently alive (zero for null).
    pub fn strong_count(&self) -> usize {
        self.0.as_ref().map_or(0, Arc::strong_count)
    }
}

impl PartialEq for LiveObject {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for LiveObject {}

impl Hash for LiveObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for LiveObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LiveObject({})", describe_object(self))
    }
}

impl fmt::Display for LiveObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&describe_object(self))
    }
}

impl From<Arc<dyn Traced>> for LiveObject {
    fn from(arc: Arc<dyn Traced>) -> Self {
        Self::from_arc(arc)
    }
}

/// Render a single object as `<TypeName>@<hex identity hash>`, or `"null"`.
pub fn describe_object(obj: &LiveObject) -> String {
    if obj.is_null() {
        return "null".to_string();
    }
    format!("{}@{:x}", obj.type_name(), obj.key().identity_hash())
}

/// A handle that observes an object without keeping it alive.
#[derive(Clone, Default)]
pub struct WeakObject(Option<Weak<dyn Traced>>);

impl WeakObject {
    /// Recover a strong handle if the object is still alive.
    pub fn upgrade(&self) -> Option<LiveObject> {
        self.0.as_ref()?.upgrade().map(LiveObject::from_arc)
    }

    /// Returns `true` once no strong handle remains (always for null).
    pub fn is_released(&self) -> bool {
        self.0.as_ref().map_or(true, |weak| weak.strong_count() == 0)
    }
}

impl fmt::Debug for WeakObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(obj) => write!(f, "WeakObject({})", describe_object(&obj)),
            None => write!(f, "WeakObject(<released>)"),
        }
    }
}
