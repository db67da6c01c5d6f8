//! Footprint assertions over a reachable set.

use std::fmt::Write as _;

use liveref_engine::{Census, Filter, LiveReferences};
use liveref_types::{FixedRoots, LiveObject};

use crate::error::{AssertError, Result};

/// Check that everything reachable from `roots` (and accepted by `filter`)
/// fits in `limit` bytes of shallow size. Returns the measured total.
pub fn check_size(message: &str, roots: &[LiveObject], limit: usize, filter: Option<&dyn Filter>) -> Result<usize> {
    let none = FixedRoots::none();
    let census = LiveReferences::new(&none).census(roots, filter)?;
    if census.total_size <= limit {
        return Ok(census.total_size);
    }
    Err(AssertError::SizeExceeded {
        message: message.to_string(),
        total: census.total_size,
        limit,
        excess: census.total_size - limit,
        breakdown: breakdown(&census),
    })
}

/// Panic unless the reachable set fits in `limit` bytes. See [`check_size`].
#[track_caller]
pub fn assert_size(message: &str, roots: &[LiveObject], limit: usize, filter: Option<&dyn Filter>) -> usize {
    match check_size(message, roots, limit, filter) {
        Ok(total) => total,
        Err(err) => panic!("{err}"),
    }
}

/// One line per type, largest total first.
fn breakdown(census: &Census) -> String {
    let mut out = String::new();
    for (name, stats) in census.largest_types() {
        if stats.count == 0 {
            continue;
        }
        let _ = write!(out, "\n  {name}: {}, {}B", stats.count, stats.size);
    }
    out
}
