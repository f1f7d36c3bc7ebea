// src/catalog/vdb.rs

//! Installed package store backed by the package database directory
//!
//! Layout: `<root>/<cat>/<pf>/<KEY>`, one file per metadata key. A package
//! directory that lacks a key file simply does not define that key.

use super::{scan_category_tree, AuxKey, PackageStore};
use crate::cpv::Cpv;
use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Default location of the installed package database
pub const DEFAULT_VDB_PATH: &str = "/var/db/pkg";

/// Installed package store
#[derive(Debug, Clone)]
pub struct VdbStore {
    root: PathBuf,
}

impl VdbStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn package_dir(&self, cpv: &Cpv) -> PathBuf {
        self.root.join(cpv.category()).join(cpv.pf())
    }

    fn read_key(dir: &Path, key: AuxKey) -> Result<String> {
        if key == AuxKey::Mtime {
            let modified = fs::metadata(dir)?.modified()?;
            let secs = modified
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            return Ok(secs.to_string());
        }

        match fs::read_to_string(dir.join(key.as_ref())) {
            Ok(value) => Ok(value.trim_end().to_string()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for VdbStore {
    fn default() -> Self {
        Self::new(DEFAULT_VDB_PATH)
    }
}

impl PackageStore for VdbStore {
    fn attributes(&self, cpv: &Cpv, keys: &[AuxKey]) -> Result<Vec<String>> {
        let dir = self.package_dir(cpv);
        if !dir.is_dir() {
            return Err(Error::NotFound(cpv.to_string()));
        }
        keys.iter().map(|key| Self::read_key(&dir, *key)).collect()
    }

    fn all_identifiers(&self) -> Result<BTreeSet<Cpv>> {
        Ok(scan_category_tree(&self.root, true))
    }

    fn cpv_exists(&self, cpv: &Cpv) -> bool {
        self.package_dir(cpv).is_dir()
    }
}
