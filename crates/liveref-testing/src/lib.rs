//! Leak and footprint assertions for tests.
//!
//! - [`assert_released`] fails with the reference paths that still keep an
//!   object alive. Set `LIVEREF_ASSERT_PATHS` to report more than one path.
//! - [`assert_size`] fails when the objects reachable from a set of roots
//!   take more shallow bytes than allowed, listing the heaviest types.
//!
//! Both have `check_*` forms that return an [`AssertError`] instead of
//! panicking.

pub mod error;
pub mod paths;
pub mod released;
pub mod size;

pub use error::{AssertError, Result};
pub use paths::{find_refs_from_root, path_count, NOT_FOUND, PATHS_ENV};
pub use released::{assert_released, check_released};
pub use size::{assert_size, check_size};
