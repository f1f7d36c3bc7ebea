// src/distfiles/retained.rs

//! Building the set of packages whose sources must be kept
//!
//! The set is assembled by a short pipeline. Every stage takes the
//! accumulator by value and returns the extended one:
//!
//! 1. `non_destructive`: everything buildable or installed, or in
//!    destructive fetch-restricted mode, everything installed plus the
//!    fetch-restricted rest
//! 2. `destructive`: installed packages (or every repository version of an
//!    installed package name) and excluded packages

use crate::catalog::{has_token, AuxKey, PackageStore};
use crate::cpv::Cpv;
use crate::error::{Error, Result};
use crate::exclude::ExcludeSpec;
use crate::output::OutputSink;
use crate::policy::CleanPolicy;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Packages whose sources are protected, with their raw `SRC_URI`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetainedSet {
    pub packages: BTreeMap<Cpv, String>,
    /// Installed packages no repository provides any more
    pub deprecated: BTreeMap<Cpv, String>,
}

/// Where a package's metadata was found
enum Lookup {
    Repository(Vec<String>),
    Installed(Vec<String>),
    Missing,
}

/// The stores a pipeline run reads from
pub struct Catalogs<'a> {
    pub repo: &'a dyn PackageStore,
    pub installed: &'a dyn PackageStore,
    pub output: &'a dyn OutputSink,
}

impl Catalogs<'_> {
    fn lookup(&self, cpv: &Cpv, keys: &[AuxKey]) -> Result<Lookup> {
        match self.repo.attributes(cpv, keys) {
            Ok(values) => return Ok(Lookup::Repository(values)),
            Err(Error::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        match self.installed.attributes(cpv, keys) {
            Ok(values) => Ok(Lookup::Installed(values)),
            Err(Error::NotFound(_)) => Ok(Lookup::Missing),
            Err(e) => Err(e),
        }
    }

    fn report_deprecated(&self, cpv: &Cpv) {
        warn!("Installed package {} is no longer in any repository", cpv);
        self.output.message(&format!(
            "Installed package {} is no longer provided by any repository",
            cpv
        ));
    }

    fn report_missing(&self, cpv: &Cpv) {
        debug!("No metadata for {}", cpv);
        self.output.message(&format!("   - no metadata found for {}", cpv));
    }

    /// Retain every package in `cpvs`
    pub fn unrestricted<'c>(
        &self,
        mut acc: RetainedSet,
        cpvs: impl IntoIterator<Item = &'c Cpv>,
    ) -> Result<RetainedSet> {
        for cpv in cpvs {
            match self.lookup(cpv, &[AuxKey::SrcUri])? {
                Lookup::Repository(mut values) => {
                    acc.packages.insert(cpv.clone(), values.pop().unwrap_or_default());
                }
                Lookup::Installed(mut values) => {
                    let src_uri = values.pop().unwrap_or_default();
                    self.report_deprecated(cpv);
                    acc.deprecated.insert(cpv.clone(), src_uri.clone());
                    acc.packages.insert(cpv.clone(), src_uri);
                }
                Lookup::Missing => self.report_missing(cpv),
            }
        }
        Ok(acc)
    }

    /// Retain only the fetch-restricted packages of `cpvs`
    ///
    /// Installed-only packages are reported deprecated whether or not they
    /// are restricted.
    pub fn fetch_restricted<'c>(
        &self,
        mut acc: RetainedSet,
        cpvs: impl IntoIterator<Item = &'c Cpv>,
    ) -> Result<RetainedSet> {
        for cpv in cpvs {
            let values = match self.lookup(cpv, &[AuxKey::SrcUri, AuxKey::Restrict])? {
                Lookup::Repository(values) => values,
                Lookup::Installed(values) => {
                    self.report_deprecated(cpv);
                    acc.deprecated
                        .insert(cpv.clone(), values.first().cloned().unwrap_or_default());
                    values
                }
                Lookup::Missing => {
                    self.report_missing(cpv);
                    continue;
                }
            };

            if let [src_uri, restrict] = values.as_slice() {
                if has_token(restrict, "fetch") {
                    acc.packages.insert(cpv.clone(), src_uri.clone());
                }
            }
        }
        Ok(acc)
    }

    /// First stage: retain by availability
    pub fn non_destructive(
        &self,
        acc: RetainedSet,
        policy: &CleanPolicy,
        installed: &BTreeSet<Cpv>,
    ) -> Result<RetainedSet> {
        self.output.message("...non-destructive search");
        let mut cpvs = self.repo.all_identifiers()?;
        cpvs.extend(installed.iter().cloned());

        if policy.destructive && policy.fetch_restricted {
            self.output.message(&format!(
                "   - looking up sources of {} installed packages",
                installed.len()
            ));
            let acc = self.unrestricted(acc, installed)?;

            let remaining: Vec<&Cpv> = cpvs.difference(installed).collect();
            self.output.message(&format!(
                "   - looking up fetch-restricted sources of {} remaining packages",
                remaining.len()
            ));
            self.fetch_restricted(acc, remaining)
        } else {
            self.output
                .message(&format!("   - looking up sources of {} packages", cpvs.len()));
            self.unrestricted(acc, &cpvs)
        }
    }

    /// Second stage: retain what installed and excluded packages need
    pub fn destructive(
        &self,
        acc: RetainedSet,
        policy: &CleanPolicy,
        exclude: &ExcludeSpec,
        installed: &BTreeSet<Cpv>,
    ) -> Result<RetainedSet> {
        self.output.message(&format!(
            "...destructive search: {} packages already retained",
            acc.packages.len()
        ));

        // Installed packages are expanded in fetch-restricted mode too; the
        // earlier stage's entries are filtered out below.
        let mut pkgset = BTreeSet::new();
        if policy.package_names {
            let cps = self.installed.cp_all()?;
            self.output
                .message(&format!("   - expanding {} installed package names", cps.len()));
            for cp in &cps {
                pkgset.extend(self.repo.cp_list(cp)?);
            }
        } else {
            self.output
                .message(&format!("   - adding {} installed packages", installed.len()));
            pkgset.extend(installed.iter().cloned());
        }

        let excluded = exclude.expand_cpvs(self.repo)?;
        let excluded_count = excluded.len();
        pkgset.extend(excluded);
        pkgset.retain(|cpv| !acc.packages.contains_key(cpv));

        self.output.message(&format!(
            "   - {} additional packages to look up ({} from exclusions)",
            pkgset.len(),
            excluded_count
        ));
        self.unrestricted(acc, &pkgset)
    }

    /// Run the whole pipeline for `policy`
    pub fn build(&self, policy: &CleanPolicy, exclude: &ExcludeSpec) -> Result<RetainedSet> {
        let installed = self.installed.all_identifiers()?;
        let mut acc = RetainedSet::default();

        if !policy.destructive || policy.fetch_restricted {
            acc = self.non_destructive(acc, policy, &installed)?;
        }
        if policy.destructive {
            acc = self.destructive(acc, policy, exclude, &installed)?;
        }

        debug!(
            "Retained sources of {} packages ({} deprecated)",
            acc.packages.len(),
            acc.deprecated.len()
        );
        Ok(acc)
    }
}
