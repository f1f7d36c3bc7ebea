// src/binpkgs.rs

//! Obsolete binary package selection
//!
//! Every binary package record is run through these retention rules in
//! order; the first rule that holds keeps the package:
//!
//! 1. The package (or its exact version) is excluded
//! 2. It was modified at or after the time limit
//! 3. Unique USE: an older build with the same version, EAPI and USE is
//!    superseded by the newer one (only the older is reported)
//! 4. Non-destructive: the repository still has the exact version, and with
//!    `changed_deps` its runtime dependencies are unchanged
//! 5. Destructive: with `package_names`, the package name is installed and
//!    the repository has the exact version; or this exact build is installed
//!
//! Records that no rule keeps are obsolete.

use crate::catalog::{AuxKey, BinaryPackage, BinaryStore, PackageStore};
use crate::cpv::Cpv;
use crate::depend::deps_equal;
use crate::error::{Error, Result};
use crate::exclude::ExcludeSpec;
use crate::output::OutputSink;
use crate::policy::CleanPolicy;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Obsolete binary packages: identifier -> package files
pub type ObsoleteBinaries = BTreeMap<Cpv, Vec<PathBuf>>;

/// Identity of a build configuration for unique-USE deduplication
type BuildKey = (Cpv, String, String);

/// Binary package selector
pub struct BinpkgSearch<'a> {
    binaries: &'a dyn BinaryStore,
    repo: &'a dyn PackageStore,
    installed: &'a dyn PackageStore,
    output: &'a dyn OutputSink,
}

fn parse_timestamp(value: &str, key: AuxKey, cpv: &Cpv) -> Result<i64> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse::<i64>()
        .map_err(|_| Error::ParseError(format!("Invalid {} '{}' for {}", key, value, cpv)))
}

/// Attribute values as a fixed-size array
fn exactly<const N: usize>(values: Vec<String>, cpv: &Cpv) -> Result<[String; N]> {
    values.try_into().map_err(|values: Vec<String>| {
        Error::ParseError(format!(
            "Expected {} attributes for {}, got {}",
            N,
            cpv,
            values.len()
        ))
    })
}

fn record(obsolete: &mut ObsoleteBinaries, package: &BinaryPackage) {
    debug!("Obsolete binary package {}", package.path.display());
    obsolete
        .entry(package.cpv.clone())
        .or_default()
        .push(package.path.clone());
}

impl<'a> BinpkgSearch<'a> {
    pub fn new(
        binaries: &'a dyn BinaryStore,
        repo: &'a dyn PackageStore,
        installed: &'a dyn PackageStore,
        output: &'a dyn OutputSink,
    ) -> Self {
        Self {
            binaries,
            repo,
            installed,
            output,
        }
    }

    fn timestamp(&self, package: &BinaryPackage, key: AuxKey) -> Result<i64> {
        let value = self
            .binaries
            .attributes(package, &[key])?
            .pop()
            .unwrap_or_default();
        parse_timestamp(&value, key, &package.cpv)
    }

    /// Whether the binary's runtime dependencies match the repository's
    fn deps_unchanged(&self, package: &BinaryPackage) -> Result<bool> {
        let keys = [AuxKey::Eapi, AuxKey::Use, AuxKey::Rdepend, AuxKey::Pdepend];
        let [bin_eapi, bin_use, bin_rdepend, bin_pdepend] =
            exactly(self.binaries.attributes(package, &keys)?, &package.cpv)?;
        let [repo_eapi, _, repo_rdepend, repo_pdepend] =
            exactly(self.repo.attributes(&package.cpv, &keys)?, &package.cpv)?;

        let use_flags: HashSet<String> = bin_use.split_whitespace().map(String::from).collect();
        let equal = deps_equal(
            &format!("{} {}", bin_rdepend, bin_pdepend),
            &bin_eapi,
            &format!("{} {}", repo_rdepend, repo_pdepend),
            &repo_eapi,
            &use_flags,
        )?;

        if !equal {
            debug!("Dependencies of {} changed since it was built", package.cpv);
        }
        Ok(equal)
    }

    /// Whether this very build is the installed one
    fn build_installed(&self, package: &BinaryPackage) -> Result<bool> {
        if !self.installed.cpv_exists(&package.cpv) {
            return Ok(false);
        }
        let installed = self.installed.attribute(&package.cpv, AuxKey::BuildTime)?;
        let binary = self
            .binaries
            .attributes(package, &[AuxKey::BuildTime])?
            .pop()
            .unwrap_or_default();
        Ok(installed.trim() == binary.trim())
    }

    /// Select obsolete binary packages of `pkgdir`
    pub fn find(
        &self,
        pkgdir: &Path,
        exclude: &ExcludeSpec,
        policy: &CleanPolicy,
    ) -> Result<ObsoleteBinaries> {
        if let Err(e) = fs::read_dir(pkgdir) {
            let err = Error::InaccessibleDirectory {
                path: pkgdir.to_path_buf(),
                reason: e.to_string(),
            };
            if policy.ignore_failure {
                warn!("{}; nothing to clean", err);
                return Ok(ObsoleteBinaries::new());
            }
            return Err(err);
        }

        let installed_cps: BTreeSet<String> = if policy.destructive && policy.package_names {
            self.installed.cp_all()?
        } else {
            BTreeSet::new()
        };
        let unique_use = !policy.destructive && policy.unique_use;

        let packages = self.binaries.packages()?;
        self.output
            .message(&format!("...checking {} binary packages", packages.len()));

        let mut obsolete = ObsoleteBinaries::new();
        let mut holders: HashMap<BuildKey, BinaryPackage> = HashMap::new();

        for package in &packages {
            let cpv = &package.cpv;

            if exclude.matches_cpv(cpv) {
                continue;
            }

            if let Some(limit) = policy.active_time_limit() {
                if self.timestamp(package, AuxKey::Mtime)? >= limit {
                    continue;
                }
            }

            let mut build_key = None;
            if unique_use {
                let [eapi, use_flags] =
                    exactly(self.binaries.attributes(package, &[AuxKey::Eapi, AuxKey::Use])?, cpv)?;
                let key: BuildKey = (cpv.clone(), eapi, use_flags);

                if let Some(holder) = holders.get(&key).cloned() {
                    let old_time = self.timestamp(&holder, AuxKey::BuildTime)?;
                    let new_time = self.timestamp(package, AuxKey::BuildTime)?;
                    if new_time >= old_time {
                        self.output
                            .message(&format!("   - {} superseded by a newer build", holder.path.display()));
                        record(&mut obsolete, &holder);
                        holders.insert(key.clone(), package.clone());
                    } else {
                        self.output
                            .message(&format!("   - {} superseded by a newer build", package.path.display()));
                        record(&mut obsolete, package);
                        continue;
                    }
                } else {
                    holders.insert(key.clone(), package.clone());
                }
                build_key = Some(key);
            }

            if !policy.destructive
                && self.repo.cpv_exists(cpv)
                && (!policy.changed_deps || self.deps_unchanged(package)?)
            {
                continue;
            }

            if policy.destructive {
                if installed_cps.contains(&cpv.cp()) && self.repo.cpv_exists(cpv) {
                    continue;
                }
                if self.build_installed(package)? {
                    continue;
                }
            }

            if let Some(key) = build_key {
                holders.remove(&key);
            }
            record(&mut obsolete, package);
        }

        info!(
            "{}: {} obsolete binary packages",
            pkgdir.display(),
            obsolete.values().map(Vec::len).sum::<usize>()
        );
        Ok(obsolete)
    }
}
