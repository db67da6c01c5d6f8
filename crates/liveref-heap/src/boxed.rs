//! Immutable boxed values. They hold no references and are leaves of the
//! graph.

use std::any::Any;
use std::borrow::Cow;

use liveref_types::{LiveObject, Traced};

/// A boxed string, integer or boolean.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoxedValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl BoxedValue {
    /// Allocate a boxed string.
    pub fn alloc_str(value: impl Into<String>) -> LiveObject {
        LiveObject::new(Self::Str(value.into()))
    }

    /// Allocate a boxed integer.
    pub fn alloc_int(value: i64) -> LiveObject {
        LiveObject::new(Self::Int(value))
    }

    /// Allocate a boxed boolean.
    pub fn alloc_bool(value: bool) -> LiveObject {
        LiveObject::new(Self::Bool(value))
    }
}

impl Traced for BoxedValue {
    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(match self {
            Self::Str(_) => "String",
            Self::Int(_) => "Integer",
            Self::Bool(_) => "Boolean",
        })
    }

    fn shallow_size(&self) -> usize {
        match self {
            Self::Str(s) => 24 + s.len(),
            Self::Int(_) => 16,
            Self::Bool(_) => 16,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
