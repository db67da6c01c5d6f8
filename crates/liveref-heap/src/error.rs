//! Error types for heap mutation and snapshot loading.

use thiserror::Error;

use crate::class::FieldKind;

/// Errors that can occur while building or mutating the object model.
#[derive(Debug, Error)]
pub enum HeapError {
    /// The class (or its hierarchy) has no field with this name.
    #[error("{class} has no field {field}")]
    UnknownField { class: String, field: String },

    /// The field exists but holds the other kind of value.
    #[error("field {class}.{field} is not a {expected} field")]
    FieldKindMismatch {
        class: String,
        field: String,
        expected: FieldKind,
    },

    /// A class declares the same field twice.
    #[error("field {field} declared twice in {class}")]
    DuplicateField { class: String, field: String },

    /// Array index beyond the current length.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A writer panicked while holding a slot lock.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// A local was set on a thread with no frames.
    #[error("thread {thread} has no active frame")]
    NoActiveFrame { thread: String },

    /// A snapshot referenced a class that was not declared before use.
    #[error("unknown class: {0}")]
    UnknownClass(String),

    /// A snapshot declared the same class twice.
    #[error("duplicate class: {0}")]
    DuplicateClass(String),

    /// A snapshot referenced an object id that does not exist.
    #[error("unknown object: {0}")]
    UnknownObject(String),

    /// A snapshot declared the same object id twice.
    #[error("duplicate object: {0}")]
    DuplicateObject(String),

    /// Snapshot JSON could not be parsed.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// I/O error while reading a snapshot file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for heap operations.
pub type Result<T> = std::result::Result<T, HeapError>;
