//! Errors raised while reading a single outgoing reference.
//!
//! These never escape a scan: the engine turns each of them into an
//! [`Edge::Unresolvable`](crate::Edge::Unresolvable) edge and keeps going.

use thiserror::Error;

/// Why a traced slot could not be read.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TraceError {
    /// A writer currently holds the slot.
    #[error("slot {slot} of {type_name} is locked by a concurrent writer")]
    SlotLocked { type_name: String, slot: String },

    /// A writer panicked while holding the slot.
    #[error("slot {slot} of {type_name} is poisoned")]
    SlotPoisoned { type_name: String, slot: String },

    /// The slot existed when iteration started but is gone now.
    #[error("slot {index} of {type_name} vanished (length is now {len})")]
    SlotVanished {
        type_name: String,
        index: usize,
        len: usize,
    },

    /// The index is beyond the object's edge count.
    #[error("edge {index} out of range for {type_name}")]
    NoSuchEdge { type_name: String, index: usize },

    /// Any other read failure reported by a custom [`Traced`](crate::Traced) impl.
    #[error("unreadable reference: {0}")]
    Unreadable(String),
}

/// Convenience alias for slot reads.
pub type TraceResult<T> = Result<T, TraceError>;
