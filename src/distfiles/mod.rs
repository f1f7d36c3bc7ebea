// src/distfiles/mod.rs

//! Obsolete source archive selection
//!
//! `DistfilesSearch::find` walks a distfiles directory and decides which
//! downloaded archives no package still needs:
//!
//! 1. Build the retained package set from the repository and installed
//!    stores (see [`retained`])
//! 2. Run every file through the check chain (see [`checks`]); files that
//!    pass every check are candidates
//! 3. Drop candidates a retained package still downloads
//! 4. Unless reporting deprecated packages, rescue candidates whose names
//!    start with an excluded package name
//!
//! Nothing is deleted here; the caller decides what to do with the result.

pub mod checks;
pub mod protect;
pub mod retained;

pub use checks::{CheckOutcome, CustomCheck, FileCheck, FileInfo};
pub use protect::Candidates;
pub use retained::RetainedSet;

use crate::catalog::PackageStore;
use crate::cpv::Cpv;
use crate::error::{Error, Result};
use crate::exclude::ExcludeSpec;
use crate::output::OutputSink;
use crate::policy::CleanPolicy;
use retained::Catalogs;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Outcome of a distfiles search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistfilesResult {
    /// Files safe to delete
    pub obsolete: Candidates,
    /// Files that would be obsolete but belong to excluded packages
    pub rescued: Candidates,
    /// Installed packages that no repository provides, with their `SRC_URI`
    pub deprecated: BTreeMap<Cpv, String>,
}

/// Source archive selector
pub struct DistfilesSearch<'a> {
    repo: &'a dyn PackageStore,
    installed: &'a dyn PackageStore,
    output: &'a dyn OutputSink,
    extra_checks: Vec<Box<CustomCheck<'a>>>,
}

impl<'a> DistfilesSearch<'a> {
    pub fn new(
        repo: &'a dyn PackageStore,
        installed: &'a dyn PackageStore,
        output: &'a dyn OutputSink,
    ) -> Self {
        Self {
            repo,
            installed,
            output,
            extra_checks: Vec::new(),
        }
    }

    /// Append a check that runs after the built-in ones
    pub fn with_check(mut self, check: impl Fn(&FileInfo) -> CheckOutcome + 'a) -> Self {
        self.extra_checks.push(Box::new(check));
        self
    }

    /// Select obsolete files in `distdir`
    ///
    /// With `deprecate` set the exclusion rescue pass is skipped, so files of
    /// excluded packages show up as obsolete too.
    pub fn find(
        &self,
        distdir: &Path,
        exclude: &ExcludeSpec,
        policy: &CleanPolicy,
        deprecate: bool,
    ) -> Result<DistfilesResult> {
        let files = match checks::scan_directory(distdir) {
            Ok(files) => files,
            Err(e @ Error::InaccessibleDirectory { .. }) if policy.ignore_failure => {
                warn!("{}; nothing to clean", e);
                return Ok(DistfilesResult::default());
            }
            Err(e) => return Err(e),
        };

        let catalogs = Catalogs {
            repo: self.repo,
            installed: self.installed,
            output: self.output,
        };
        let retained = catalogs.build(policy, exclude)?;

        self.output.message(&format!(
            "...checking limits for {} files",
            files.len()
        ));
        let mut chain = checks::default_checks(exclude, policy);
        chain.extend(self.extra_checks.iter().map(|check| FileCheck::Custom(check.as_ref())));
        debug!("File checks: {:?}", chain);

        let mut candidates = Candidates::new();
        for file in files {
            if checks::is_dirty(&file, &chain) {
                candidates.insert(file.name, vec![file.path]);
            }
        }

        self.output.message(&format!(
            "...removing protected sources from {} candidates",
            candidates.len()
        ));
        protect::remove_protected(&retained.packages, &mut candidates);

        let mut rescued = Candidates::new();
        if !deprecate && !exclude.is_empty() && !candidates.is_empty() {
            self.output.message(&format!(
                "...checking {} remaining candidates against exclusions",
                candidates.len()
            ));
            let patterns = exclude.expand_pkgname_patterns(self.repo)?;
            rescued = protect::rescue(&patterns, &mut candidates, self.output);
        }

        info!(
            "{}: {} obsolete, {} rescued, {} deprecated",
            distdir.display(),
            candidates.len(),
            rescued.len(),
            retained.deprecated.len()
        );

        Ok(DistfilesResult {
            obsolete: candidates,
            rescued,
            deprecated: retained.deprecated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AuxKey, MemoryStore};
    use crate::output::SilentOutput;
    use std::fs;
    use tempfile::TempDir;

    fn cpv(s: &str) -> Cpv {
        Cpv::parse(s).unwrap()
    }

    fn distdir(names: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for name in names {
            fs::write(temp.path().join(name), b"data").unwrap();
        }
        temp
    }

    #[test]
    fn test_unreferenced_files_are_obsolete() {
        let dir = distdir(&["foo-1.0.tar.gz", "foo-2.0.tar.gz", ".keep"]);
        let repo = MemoryStore::new()
            .with_package(cpv("app-misc/foo-2.0"), [(AuxKey::SrcUri, "https://x.org/foo-2.0.tar.gz")]);
        let installed = MemoryStore::new();
        let search = DistfilesSearch::new(&repo, &installed, &SilentOutput);

        let result = search
            .find(dir.path(), &ExcludeSpec::new(), &CleanPolicy::new(), false)
            .unwrap();
        assert_eq!(result.obsolete.keys().collect::<Vec<_>>(), vec!["foo-1.0.tar.gz"]);
        assert!(result.rescued.is_empty());
        assert!(result.deprecated.is_empty());
    }

    #[test]
    fn test_destructive_includes_dot_files() {
        let dir = distdir(&[".hidden"]);
        let repo = MemoryStore::new();
        let installed = MemoryStore::new();
        let search = DistfilesSearch::new(&repo, &installed, &SilentOutput);

        let result = search
            .find(dir.path(), &ExcludeSpec::new(), &CleanPolicy::destructive(), false)
            .unwrap();
        assert!(result.obsolete.contains_key(".hidden"));
    }

    #[test]
    fn test_extra_check_retains() {
        let dir = distdir(&["foo-1.0.tar.gz", "bar-1.0.zip"]);
        let repo = MemoryStore::new();
        let installed = MemoryStore::new();
        let search = DistfilesSearch::new(&repo, &installed, &SilentOutput).with_check(|file| {
            if file.name.ends_with(".zip") {
                CheckOutcome::Retain
            } else {
                CheckOutcome::Continue
            }
        });

        let result = search
            .find(dir.path(), &ExcludeSpec::new(), &CleanPolicy::new(), false)
            .unwrap();
        assert_eq!(result.obsolete.keys().collect::<Vec<_>>(), vec!["foo-1.0.tar.gz"]);
    }

    #[test]
    fn test_inaccessible_directory() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("distfiles");
        let repo = MemoryStore::new();
        let installed = MemoryStore::new();
        let search = DistfilesSearch::new(&repo, &installed, &SilentOutput);

        let err = search
            .find(&missing, &ExcludeSpec::new(), &CleanPolicy::new(), false)
            .unwrap_err();
        assert!(err.to_string().contains("distfiles"));

        let policy = CleanPolicy { ignore_failure: true, ..CleanPolicy::default() };
        let result = search.find(&missing, &ExcludeSpec::new(), &policy, false).unwrap();
        assert_eq!(result, DistfilesResult::default());
    }
}
