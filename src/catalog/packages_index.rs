// src/catalog/packages_index.rs

//! Binary package store backed by the `Packages` index of a package directory
//!
//! The index is a header stanza followed by one stanza per binary package,
//! separated by blank lines:
//!
//! ```text
//! ARCH: amd64
//! VERSION: 0
//!
//! BUILD_ID: 1
//! BUILD_TIME: 1700000000
//! CPV: app-misc/foo-1.0
//! MTIME: 1700000123
//! PATH: app-misc/foo/foo-1.0-1.gpkg.tar
//! USE: amd64 ssl
//! ```
//!
//! Records without `PATH` live at `<cat>/<pf>.tbz2`. Keys a record does not
//! set fall back to the header value.

use super::{AuxKey, BinaryPackage, BinaryStore};
use crate::cpv::Cpv;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the index file inside the package directory
pub const INDEX_FILE: &str = "Packages";

type Stanza = HashMap<String, String>;

/// Binary package store over a `Packages` index
#[derive(Debug, Clone, Default)]
pub struct PackagesIndex {
    header: Stanza,
    records: Vec<(BinaryPackage, Stanza)>,
}

impl PackagesIndex {
    /// Load the index of `pkgdir`
    ///
    /// A package directory without an index holds no known packages. Any
    /// other read failure is reported as an inaccessible directory.
    pub fn open(pkgdir: &Path) -> Result<Self> {
        let index_path = pkgdir.join(INDEX_FILE);
        match fs::read_to_string(&index_path) {
            Ok(content) => Self::parse(pkgdir, &content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No binary package index at {}", index_path.display());
                Ok(Self::default())
            }
            Err(e) => Err(Error::InaccessibleDirectory {
                path: pkgdir.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    /// Parse index text; record paths are resolved against `pkgdir`
    pub fn parse(pkgdir: &Path, content: &str) -> Result<Self> {
        let mut stanzas = split_stanzas(content)?.into_iter().peekable();

        let header = match stanzas.peek() {
            Some(first) if !first.contains_key("CPV") => stanzas.next().unwrap_or_default(),
            _ => Stanza::new(),
        };

        let mut records = Vec::new();
        for stanza in stanzas {
            let Some(cpv_text) = stanza.get("CPV") else {
                warn!("Skipping binary package index entry without CPV");
                continue;
            };
            let cpv = match Cpv::parse(cpv_text) {
                Ok(cpv) => cpv,
                Err(e) => {
                    warn!("Skipping binary package index entry: {}", e);
                    continue;
                }
            };

            let build_id = match stanza.get("BUILD_ID") {
                Some(id) => Some(id.trim().parse::<u64>().map_err(|_| {
                    Error::ParseError(format!("Invalid BUILD_ID '{}' for {}", id, cpv))
                })?),
                None => None,
            };

            let relative = stanza
                .get("PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(cpv.category()).join(format!("{}.tbz2", cpv.pf())));

            records.push((
                BinaryPackage {
                    cpv,
                    build_id,
                    path: pkgdir.join(relative),
                },
                stanza,
            ));
        }

        Ok(Self { header, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn index_key(key: &AuxKey) -> &str {
        match key {
            AuxKey::Mtime => "MTIME",
            other => other.as_ref(),
        }
    }
}

fn split_stanzas(content: &str) -> Result<Vec<Stanza>> {
    let mut stanzas = Vec::new();
    let mut current = Stanza::new();

    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                stanzas.push(std::mem::take(&mut current));
            }
            continue;
        }

        let (key, value) = line.split_once(':').ok_or_else(|| {
            Error::ParseError(format!("Packages line {}: expected 'KEY: value'", lineno + 1))
        })?;
        current.insert(key.trim().to_string(), value.trim().to_string());
    }

    if !current.is_empty() {
        stanzas.push(current);
    }

    Ok(stanzas)
}

impl BinaryStore for PackagesIndex {
    fn packages(&self) -> Result<Vec<BinaryPackage>> {
        Ok(self.records.iter().map(|(pkg, _)| pkg.clone()).collect())
    }

    fn attributes(&self, package: &BinaryPackage, keys: &[AuxKey]) -> Result<Vec<String>> {
        let (_, stanza) = self
            .records
            .iter()
            .find(|(pkg, _)| pkg == package)
            .ok_or_else(|| Error::NotFound(package.cpv.to_string()))?;

        Ok(keys
            .iter()
            .map(|key| {
                let name = Self::index_key(key);
                stanza
                    .get(name)
                    .or_else(|| self.header.get(name))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect())
    }
}
