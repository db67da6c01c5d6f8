//! Assertions that an object has been released.

use tracing::debug;

use liveref_engine::LiveReferences;
use liveref_types::{LiveObject, RootEnumerator, WeakObject};

use crate::error::{AssertError, Result};
use crate::paths::{find_refs_from_root, path_count};

/// Check that the object behind `weak` is gone.
///
/// If it is still alive, the error carries the reference paths from `roots`
/// (plus `hints`) that keep it alive, as many as [`path_count`] asks for.
pub fn check_released(
    message: &str,
    weak: &WeakObject,
    roots: &dyn RootEnumerator,
    hints: &[LiveObject],
) -> Result<()> {
    let Some(target) = weak.upgrade() else {
        return Ok(());
    };
    debug!(target = %target, "object still alive, looking for paths");
    let scanner = LiveReferences::new(roots);
    let paths = find_refs_from_root(&scanner, &target, hints, path_count())?;
    Err(AssertError::NotReleased {
        message: message.to_string(),
        paths,
    })
}

/// Panic unless the object behind `weak` is gone. See [`check_released`].
#[track_caller]
pub fn assert_released(message: &str, weak: &WeakObject, roots: &dyn RootEnumerator, hints: &[LiveObject]) {
    if let Err(err) = check_released(message, weak, roots, hints) {
        panic!("{err}");
    }
}
