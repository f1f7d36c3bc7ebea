// src/catalog/md5cache.rs

//! Repository store backed by `metadata/md5-cache`
//!
//! Each ebuild has a cache entry at `<repo>/metadata/md5-cache/<cat>/<pf>`
//! holding `KEY=VALUE` lines:
//!
//! ```text
//! EAPI=8
//! SRC_URI=https://example.org/foo-1.0.tar.gz -> foo-1.0-r1.tar.gz
//! RESTRICT=fetch
//! ```
//!
//! Several repositories (main tree plus overlays) can be stacked; the first
//! repository that has an entry answers attribute queries.

use super::{scan_category_tree, AuxKey, PackageStore};
use crate::cpv::{split_cp, Cpv};
use crate::error::{Error, Result};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const CACHE_SUBDIR: &str = "metadata/md5-cache";

/// Repository store over one or more md5-cache trees
#[derive(Debug, Clone)]
pub struct Md5CacheRepo {
    repos: Vec<PathBuf>,
}

impl Md5CacheRepo {
    /// Create a store over the given repository roots, in priority order
    pub fn new(repos: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            repos: repos.into_iter().map(Into::into).collect(),
        }
    }

    fn cache_dirs(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.repos.iter().map(|repo| repo.join(CACHE_SUBDIR))
    }

    fn entry_path(cache_dir: &Path, cpv: &Cpv) -> PathBuf {
        cache_dir.join(cpv.category()).join(cpv.pf())
    }

    fn read_entry(&self, cpv: &Cpv) -> Result<HashMap<String, String>> {
        for cache_dir in self.cache_dirs() {
            let path = Self::entry_path(&cache_dir, cpv);
            match fs::read_to_string(&path) {
                Ok(content) => return Ok(parse_entry(&content)),
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(Error::NotFound(cpv.to_string()))
    }
}

/// Parse `KEY=VALUE` lines; later duplicates win
fn parse_entry(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

impl PackageStore for Md5CacheRepo {
    fn attributes(&self, cpv: &Cpv, keys: &[AuxKey]) -> Result<Vec<String>> {
        let entry = self.read_entry(cpv)?;
        Ok(keys
            .iter()
            .map(|key| entry.get(key.as_ref()).cloned().unwrap_or_default())
            .collect())
    }

    fn all_identifiers(&self) -> Result<BTreeSet<Cpv>> {
        let mut all = BTreeSet::new();
        for cache_dir in self.cache_dirs() {
            if !cache_dir.is_dir() {
                debug!("No metadata cache at {}", cache_dir.display());
                continue;
            }
            all.extend(scan_category_tree(&cache_dir, false));
        }
        Ok(all)
    }

    fn cpv_exists(&self, cpv: &Cpv) -> bool {
        self.cache_dirs()
            .any(|cache_dir| Self::entry_path(&cache_dir, cpv).is_file())
    }

    fn cp_list(&self, cp: &str) -> Result<Vec<Cpv>> {
        let Some((category, name)) = split_cp(cp) else {
            return Ok(Vec::new());
        };

        let mut versions = BTreeSet::new();
        for cache_dir in self.cache_dirs() {
            let category_dir = cache_dir.join(category);
            let entries = match fs::read_dir(&category_dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            for entry in entries.filter_map(|e| e.ok()) {
                let pf = entry.file_name().to_string_lossy().into_owned();
                if !pf.starts_with(name) {
                    continue;
                }
                if let Ok(cpv) = Cpv::parse(&format!("{}/{}", category, pf)) {
                    if cpv.name() == name {
                        versions.insert(cpv);
                    }
                }
            }
        }

        Ok(versions.into_iter().collect())
    }
}
