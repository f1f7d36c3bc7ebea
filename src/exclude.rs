// src/exclude.rs

//! Exclusion specification
//!
//! Describes which packages and files must never be reported as obsolete.
//! Built programmatically or deserialized from the `[exclude]` section of
//! the configuration file:
//!
//! ```toml
//! [exclude]
//! categories = ["sys-kernel"]
//! packages = ["app-editors/vim"]
//! anti_packages = ["sys-kernel/gentoo-sources"]
//! cpvs = ["dev-lang/rust-1.75.0"]
//! filenames = ["important.tar.gz"]
//! filename_patterns = ["firefox-.*\\.xpi"]
//! ```
//!
//! Filename patterns match from the start of the filename.

use crate::catalog::PackageStore;
use crate::cpv::{split_cp, Cpv};
use crate::error::{Error, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;

/// Compiled exclusion matchers
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "ExcludeFile")]
pub struct ExcludeSpec {
    categories: BTreeSet<String>,
    packages: BTreeSet<String>,
    anti_packages: BTreeSet<String>,
    cpvs: BTreeSet<Cpv>,
    filenames: BTreeSet<String>,
    filename_patterns: Vec<Regex>,
}

/// Raw `[exclude]` table as written in the configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExcludeFile {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub packages: Vec<String>,
    #[serde(default)]
    pub anti_packages: Vec<String>,
    #[serde(default)]
    pub cpvs: Vec<String>,
    #[serde(default)]
    pub filenames: Vec<String>,
    #[serde(default)]
    pub filename_patterns: Vec<String>,
}

impl TryFrom<ExcludeFile> for ExcludeSpec {
    type Error = Error;

    fn try_from(file: ExcludeFile) -> Result<Self> {
        let mut spec = ExcludeSpec::new();
        for category in file.categories {
            spec.add_category(category);
        }
        for cp in file.packages {
            spec.add_package(cp)?;
        }
        for cp in file.anti_packages {
            spec.add_anti_package(cp)?;
        }
        for cpv in file.cpvs {
            spec.add_cpv(Cpv::parse(&cpv)?);
        }
        for name in file.filenames {
            spec.add_filename(name);
        }
        for pattern in file.filename_patterns {
            spec.add_filename_pattern(&pattern)?;
        }
        Ok(spec)
    }
}

fn check_cp(cp: &str) -> Result<()> {
    match split_cp(cp) {
        Some(_) => Ok(()),
        None => Err(Error::Config(format!(
            "'{}' is not a category/package key",
            cp
        ))),
    }
}

impl ExcludeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_category(&mut self, category: impl Into<String>) {
        self.categories.insert(category.into());
    }

    pub fn add_package(&mut self, cp: impl Into<String>) -> Result<()> {
        let cp = cp.into();
        check_cp(&cp)?;
        self.packages.insert(cp);
        Ok(())
    }

    /// Never exclude `cp`, even when its category is excluded
    pub fn add_anti_package(&mut self, cp: impl Into<String>) -> Result<()> {
        let cp = cp.into();
        check_cp(&cp)?;
        self.anti_packages.insert(cp);
        Ok(())
    }

    pub fn add_cpv(&mut self, cpv: Cpv) {
        self.cpvs.insert(cpv);
    }

    pub fn add_filename(&mut self, name: impl Into<String>) {
        self.filenames.insert(name.into());
    }

    /// Add a regex matched from the start of a filename
    pub fn add_filename_pattern(&mut self, pattern: &str) -> Result<()> {
        self.filename_patterns
            .push(Regex::new(&format!("^(?:{})", pattern))?);
        Ok(())
    }

    /// Whether no matcher at all is configured
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && self.packages.is_empty()
            && self.anti_packages.is_empty()
            && self.cpvs.is_empty()
            && self.filenames.is_empty()
            && self.filename_patterns.is_empty()
    }

    /// Whether any filename matcher is configured
    pub fn has_filename_rules(&self) -> bool {
        !self.filenames.is_empty() || !self.filename_patterns.is_empty()
    }

    /// Whether the versionless key `cp` is excluded
    pub fn matches_cp(&self, cp: &str) -> bool {
        if self.anti_packages.contains(cp) {
            return false;
        }
        if self.packages.contains(cp) {
            return true;
        }
        split_cp(cp).is_some_and(|(category, _)| self.categories.contains(category))
    }

    /// Whether the exact identifier, or its package, is excluded
    pub fn matches_cpv(&self, cpv: &Cpv) -> bool {
        self.cpvs.contains(cpv) || self.matches_cp(&cpv.cp())
    }

    /// Whether a distfile name is excluded, literally or by pattern
    pub fn matches_filename(&self, name: &str) -> bool {
        self.filenames.contains(name) || self.filename_patterns.iter().any(|re| re.is_match(name))
    }

    /// Every excluded `cp`: listed packages plus repository packages in
    /// excluded categories, minus anti-packages
    pub fn expand_cps(&self, repo: &dyn PackageStore) -> Result<BTreeSet<String>> {
        let mut cps: BTreeSet<String> = self.packages.clone();

        if !self.categories.is_empty() {
            for cp in repo.cp_all()? {
                let in_category =
                    split_cp(&cp).is_some_and(|(category, _)| self.categories.contains(category));
                if in_category {
                    cps.insert(cp);
                }
            }
        }

        cps.retain(|cp| !self.anti_packages.contains(cp));
        Ok(cps)
    }

    /// Every repository identifier covered by the package-level matchers
    pub fn expand_cpvs(&self, repo: &dyn PackageStore) -> Result<BTreeSet<Cpv>> {
        let mut cpvs = BTreeSet::new();
        for cp in self.expand_cps(repo)? {
            cpvs.extend(repo.cp_list(&cp)?);
        }
        cpvs.extend(self.cpvs.iter().cloned());
        Ok(cpvs)
    }

    /// Filename prefixes derived from excluded package names
    ///
    /// `app-editors/vim` yields `^vim[-_.]`, which protects `vim-9.0.tar.gz`
    /// and `vim_patches.tar.xz` but not `vimpager-1.0.tar.gz`.
    pub fn expand_pkgname_patterns(&self, repo: &dyn PackageStore) -> Result<Vec<Regex>> {
        let names: BTreeSet<String> = self
            .expand_cps(repo)?
            .iter()
            .filter_map(|cp| split_cp(cp).map(|(_, name)| name.to_string()))
            .collect();

        names
            .iter()
            .map(|name| Regex::new(&format!("^{}[-_.]", regex::escape(name))).map_err(Error::from))
            .collect()
    }
}
