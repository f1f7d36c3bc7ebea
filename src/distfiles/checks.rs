// src/distfiles/checks.rs

//! Per-file checks applied to every entry of the distfiles directory
//!
//! Every file starts out dirty. The checks run in order and the first one
//! that stops the chain decides the file is not a candidate.

use crate::error::{Error, Result};
use crate::exclude::ExcludeSpec;
use crate::policy::CleanPolicy;
use chrono::{DateTime, Utc};
use std::fmt;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Result of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Keep the file; stop checking
    Retain,
    /// Not a cleaning candidate at all; stop checking
    Reject,
    /// Nothing against cleaning; go on with the next check
    Continue,
}

/// A directory entry with its `lstat` metadata
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub name: String,
    pub path: PathBuf,
    pub metadata: Metadata,
}

impl FileInfo {
    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.metadata.len()
    }

    /// Modification time in unix seconds
    pub fn mtime(&self) -> Option<i64> {
        self.metadata
            .modified()
            .ok()
            .map(|time| DateTime::<Utc>::from(time).timestamp())
    }
}

/// Caller-supplied check
pub type CustomCheck<'a> = dyn Fn(&FileInfo) -> CheckOutcome + 'a;

/// One step of the check chain
pub enum FileCheck<'a> {
    /// Reject anything that is not a regular file (symlinks included)
    Regular,
    /// Retain files named by the exclusion specification
    Filenames(&'a ExcludeSpec),
    /// Retain files at least this many bytes large
    Size(u64),
    /// Retain files modified at or after this unix timestamp
    Time(i64),
    /// Retain hidden files
    DotFile,
    Custom(&'a CustomCheck<'a>),
}

impl fmt::Debug for FileCheck<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regular => write!(f, "Regular"),
            Self::Filenames(_) => write!(f, "Filenames"),
            Self::Size(limit) => write!(f, "Size({})", limit),
            Self::Time(limit) => write!(f, "Time({})", limit),
            Self::DotFile => write!(f, "DotFile"),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl FileCheck<'_> {
    pub fn apply(&self, file: &FileInfo) -> CheckOutcome {
        match self {
            Self::Regular => {
                if file.metadata.file_type().is_file() {
                    CheckOutcome::Continue
                } else {
                    CheckOutcome::Reject
                }
            }
            Self::Filenames(exclude) => {
                if exclude.matches_filename(&file.name) {
                    CheckOutcome::Retain
                } else {
                    CheckOutcome::Continue
                }
            }
            Self::Size(limit) => {
                if file.size() >= *limit {
                    CheckOutcome::Retain
                } else {
                    CheckOutcome::Continue
                }
            }
            Self::Time(limit) => match file.mtime() {
                Some(mtime) if mtime < *limit => CheckOutcome::Continue,
                _ => CheckOutcome::Retain,
            },
            Self::DotFile => {
                if file.name.starts_with('.') {
                    CheckOutcome::Retain
                } else {
                    CheckOutcome::Continue
                }
            }
            Self::Custom(check) => check(file),
        }
    }
}

/// Build the chain for a run; unconfigured checks are left out
pub fn default_checks<'a>(exclude: &'a ExcludeSpec, policy: &CleanPolicy) -> Vec<FileCheck<'a>> {
    let mut checks = vec![FileCheck::Regular];

    if exclude.has_filename_rules() {
        checks.push(FileCheck::Filenames(exclude));
    }
    if let Some(limit) = policy.active_size_limit() {
        checks.push(FileCheck::Size(limit));
    }
    if let Some(limit) = policy.active_time_limit() {
        checks.push(FileCheck::Time(limit));
    }
    if !policy.destructive {
        checks.push(FileCheck::DotFile);
    }

    checks
}

/// Whether a file survives the whole chain
pub fn is_dirty(file: &FileInfo, checks: &[FileCheck<'_>]) -> bool {
    checks
        .iter()
        .all(|check| check.apply(file) == CheckOutcome::Continue)
}

/// List `dir` once, `lstat`ing every entry
///
/// Entries that vanish or cannot be inspected are skipped.
pub fn scan_directory(dir: &Path) -> Result<Vec<FileInfo>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::InaccessibleDirectory {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let Ok(name) = entry.file_name().into_string() else {
            debug!("Skipping non UTF-8 name in {}", dir.display());
            continue;
        };
        let path = entry.path();
        let Ok(metadata) = fs::symlink_metadata(&path) else {
            continue;
        };
        files.push(FileInfo {
            name,
            path,
            metadata,
        });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}
