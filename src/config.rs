// src/config.rs

//! Configuration file
//!
//! Every section is optional; a missing file section keeps its defaults.
//!
//! ```toml
//! [paths]
//! distdir = "/var/cache/distfiles"
//! pkgdir = "/var/cache/binpkgs"
//! repository = "/var/db/repos/gentoo"
//! overlays = ["/var/db/repos/guru"]
//! vdb = "/var/db/pkg"
//!
//! [policy]
//! destructive = false
//! unique_use = true
//!
//! [exclude]
//! packages = ["app-editors/vim"]
//! ```

use crate::catalog::{Md5CacheRepo, VdbStore};
use crate::error::{Error, Result};
use crate::exclude::ExcludeSpec;
use crate::policy::CleanPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Locations of the caches and package stores
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Downloaded source archives
    pub distdir: PathBuf,
    /// Binary packages and their `Packages` index
    pub pkgdir: PathBuf,
    /// Main repository
    pub repository: PathBuf,
    /// Additional repositories, highest priority first
    pub overlays: Vec<PathBuf>,
    /// Installed package database
    pub vdb: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            distdir: PathBuf::from("/var/cache/distfiles"),
            pkgdir: PathBuf::from("/var/cache/binpkgs"),
            repository: PathBuf::from("/var/db/repos/gentoo"),
            overlays: Vec::new(),
            vdb: PathBuf::from(crate::catalog::DEFAULT_VDB_PATH),
        }
    }
}

impl PathsConfig {
    /// Repository store over the overlays and the main repository
    pub fn repository_store(&self) -> Md5CacheRepo {
        Md5CacheRepo::new(self.overlays.iter().chain(std::iter::once(&self.repository)))
    }

    /// Installed package store
    pub fn installed_store(&self) -> VdbStore {
        VdbStore::new(&self.vdb)
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleanConfig {
    pub paths: PathsConfig,
    pub policy: CleanPolicy,
    pub exclude: ExcludeSpec,
}

impl CleanConfig {
    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration text
    pub fn parse(content: &str) -> Result<Self> {
        let config: CleanConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject flag combinations that have no effect
    pub fn validate(&self) -> Result<()> {
        let policy = &self.policy;
        if !policy.destructive && policy.package_names {
            return Err(Error::Config(
                "package_names only applies to destructive mode".to_string(),
            ));
        }
        if !policy.destructive && policy.fetch_restricted {
            return Err(Error::Config(
                "fetch_restricted only applies to destructive mode".to_string(),
            ));
        }
        Ok(())
    }
}
