//! Rendering of the reference paths that keep an object alive.

use std::env;
use std::slice;

use tracing::{debug, warn};

use liveref_engine::{LiveReferences, SkipObjects};
use liveref_types::LiveObject;

use crate::error::Result;

/// Environment variable holding how many distinct paths a failed release
/// assertion reports.
pub const PATHS_ENV: &str = "LIVEREF_ASSERT_PATHS";

/// Rendered when no path reaches the target.
pub const NOT_FOUND: &str = "Not found!!!";

/// Number of paths to report, from [`PATHS_ENV`], defaulting to 1.
pub fn path_count() -> usize {
    parse_path_count(env::var(PATHS_ENV).ok().as_deref())
}

fn parse_path_count(value: Option<&str>) -> usize {
    match value.map(str::trim) {
        None | Some("") => 1,
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) => n,
            Err(e) => {
                warn!(value = raw, error = %e, "ignoring invalid {PATHS_ENV}");
                1
            }
        },
    }
}

/// Find up to `count` paths from the roots to `target`, each avoiding every
/// intermediate object of the paths before it.
///
/// Paths are rendered one node per line and separated by a blank line.
/// Returns [`NOT_FOUND`] when the target is unreachable.
pub fn find_refs_from_root(
    scanner: &LiveReferences<'_>,
    target: &LiveObject,
    hints: &[LiveObject],
    count: usize,
) -> Result<String> {
    let mut skip = SkipObjects::new();
    let mut rendered: Vec<String> = Vec::new();

    while rendered.len() < count {
        let result = scanner.from_roots_filtered(slice::from_ref(target), hints, None, Some(&skip))?;
        let Some(path) = result.get(target) else {
            break;
        };
        rendered.push(path.to_string());

        let mut blocked = 0usize;
        for obj in path.iter().filter_map(|node| node.object()) {
            if obj != target && skip.insert(obj.clone()) {
                blocked += 1;
            }
        }
        if blocked == 0 {
            // Target is held directly by a root.
            break;
        }
    }

    debug!(target = %target, found = rendered.len(), requested = count, "collected reference paths");
    if rendered.is_empty() {
        Ok(NOT_FOUND.to_string())
    } else {
        Ok(rendered.join("\n\n"))
    }
}
