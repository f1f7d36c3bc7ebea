// src/depend/mod.rs

//! Dependency string parsing and comparison
//!
//! Used by the binary package selector to decide whether a binary package
//! was built against the same runtime dependencies its ebuild declares now.

mod atom;
mod eapi;
mod reduce;

pub use atom::{Atom, Blocker, Operator, SlotDep, SlotOperator};
pub use eapi::Eapi;
pub use reduce::{strip_slots, use_reduce, DepNode};

use crate::error::Result;
use std::collections::HashSet;

/// Compare two dependency strings given a set of enabled USE flags
///
/// Byte-identical strings are equal without parsing. Otherwise both are
/// USE-reduced under their own EAPI, stripped of slot operators and compared
/// as trees. A malformed string is an error, not an inequality.
pub fn deps_equal(
    deps_a: &str,
    eapi_a: &str,
    deps_b: &str,
    eapi_b: &str,
    use_flags: &HashSet<String>,
) -> Result<bool> {
    if deps_a == deps_b {
        return Ok(true);
    }

    let mut tree_a = use_reduce(deps_a, Eapi::parse(eapi_a)?, use_flags)?;
    let mut tree_b = use_reduce(deps_b, Eapi::parse(eapi_b)?, use_flags)?;
    strip_slots(&mut tree_a);
    strip_slots(&mut tree_b);

    Ok(tree_a == tree_b)
}
