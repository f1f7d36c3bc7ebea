// src/catalog/mod.rs

//! Read-only package stores
//!
//! The selectors never own package metadata; they query it through two
//! traits:
//! - `PackageStore`: repository (buildable) and installed packages
//! - `BinaryStore`: the binary package cache
//!
//! Implementations:
//! - `MemoryStore` / `MemoryBinaryStore`: in-memory, for tests and embedders
//! - `Md5CacheRepo`: a repository's `metadata/md5-cache`
//! - `VdbStore`: the installed package database (`/var/db/pkg`)
//! - `PackagesIndex`: the `Packages` index of a binary package directory

mod md5cache;
mod memory;
mod packages_index;
mod vdb;

pub use md5cache::Md5CacheRepo;
pub use memory::{MemoryBinaryStore, MemoryStore};
pub use packages_index::PackagesIndex;
pub use vdb::{VdbStore, DEFAULT_VDB_PATH};

use crate::cpv::Cpv;
use crate::error::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use strum_macros::{AsRefStr, Display, EnumString};
use tracing::debug;

/// Metadata keys the selectors query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, AsRefStr, Display, EnumString)]
pub enum AuxKey {
    #[strum(serialize = "SRC_URI")]
    SrcUri,
    #[strum(serialize = "RESTRICT")]
    Restrict,
    #[strum(serialize = "USE")]
    Use,
    #[strum(serialize = "EAPI")]
    Eapi,
    #[strum(serialize = "BUILD_TIME")]
    BuildTime,
    /// Modification time of the package entry, in seconds
    #[strum(serialize = "_mtime_")]
    Mtime,
    #[strum(serialize = "RDEPEND")]
    Rdepend,
    #[strum(serialize = "PDEPEND")]
    Pdepend,
}

/// A store of package metadata keyed by CPV
pub trait PackageStore {
    /// Fetch attribute values in the order of `keys`
    ///
    /// Returns `Error::NotFound` when the store has no such package. An
    /// attribute the package does not define is an empty string.
    fn attributes(&self, cpv: &Cpv, keys: &[AuxKey]) -> Result<Vec<String>>;

    /// Every package identifier in the store
    fn all_identifiers(&self) -> Result<BTreeSet<Cpv>>;

    /// Whether this exact identifier is in the store
    fn cpv_exists(&self, cpv: &Cpv) -> bool;

    /// Fetch a single attribute
    fn attribute(&self, cpv: &Cpv, key: AuxKey) -> Result<String> {
        Ok(self.attributes(cpv, &[key])?.pop().unwrap_or_default())
    }

    /// Every versionless `category/name` key in the store
    fn cp_all(&self) -> Result<BTreeSet<String>> {
        Ok(self.all_identifiers()?.iter().map(Cpv::cp).collect())
    }

    /// Every version of the package `cp`
    fn cp_list(&self, cp: &str) -> Result<Vec<Cpv>> {
        Ok(self
            .all_identifiers()?
            .into_iter()
            .filter(|cpv| cpv.cp() == cp)
            .collect())
    }
}

/// One binary package file in the binary package cache
///
/// Several files can share a CPV when multi-instance binary packages are
/// enabled; `build_id` tells them apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BinaryPackage {
    pub cpv: Cpv,
    pub build_id: Option<u64>,
    pub path: PathBuf,
}

/// A store of binary packages
pub trait BinaryStore {
    /// Every binary package record
    fn packages(&self) -> Result<Vec<BinaryPackage>>;

    /// Fetch attribute values of one record in the order of `keys`
    fn attributes(&self, package: &BinaryPackage, keys: &[AuxKey]) -> Result<Vec<String>>;
}

/// Whether a whitespace-separated token list (e.g. RESTRICT) holds `token`
pub(crate) fn has_token(list: &str, token: &str) -> bool {
    list.split_whitespace().any(|t| t == token)
}

/// Collect `<root>/<category>/<pf>` entries as identifiers
///
/// `dirs` selects directory entries (installed database) instead of files
/// (metadata cache). Hidden entries and names that are not valid
/// identifiers (e.g. `-MERGING-foo-1.0`) are skipped.
pub(crate) fn scan_category_tree(root: &Path, dirs: bool) -> BTreeSet<Cpv> {
    let mut found = BTreeSet::new();

    for entry in walkdir::WalkDir::new(root)
        .min_depth(2)
        .max_depth(2)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_dir() != dirs {
            continue;
        }

        let pf = entry.file_name().to_string_lossy();
        let Some(category) = entry.path().parent().and_then(Path::file_name) else {
            continue;
        };
        let category = category.to_string_lossy();
        if pf.starts_with('.') || pf.starts_with('-') || category.starts_with('.') {
            continue;
        }

        match Cpv::parse(&format!("{}/{}", category, pf)) {
            Ok(cpv) => {
                found.insert(cpv);
            }
            Err(e) => debug!("Skipping {}: {}", entry.path().display(), e),
        }
    }

    found
}
