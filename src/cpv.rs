// src/cpv.rs

//! Package identifiers
//!
//! A CPV (`category/name-version`) is the primary key of every store. The
//! version part follows the ebuild version syntax, e.g. `1.2.3b_rc2_p1-r4`.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(\.\d+)*[a-z]?(_(alpha|beta|pre|rc|p)\d*)*(-r\d+)?$").unwrap()
});

static CATEGORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9+_.-]*$").unwrap());

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9+_-]*$").unwrap());

/// A `category/name-version` package identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cpv {
    category: String,
    name: String,
    version: String,
}

impl Cpv {
    /// Parse an identifier such as `app-misc/foo-bar-1.0-r1`
    ///
    /// The name/version boundary is the first hyphen whose remainder is a
    /// valid version, so names containing hyphens are handled.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let (category, pf) = s
            .split_once('/')
            .ok_or_else(|| Error::InvalidCpv(s.to_string()))?;

        if !CATEGORY_RE.is_match(category) {
            return Err(Error::InvalidCpv(s.to_string()));
        }

        let (name, version) = pf
            .match_indices('-')
            .map(|(pos, _)| (&pf[..pos], &pf[pos + 1..]))
            .find(|(_, version)| VERSION_RE.is_match(version))
            .ok_or_else(|| Error::InvalidCpv(s.to_string()))?;

        if !NAME_RE.is_match(name) {
            return Err(Error::InvalidCpv(s.to_string()));
        }

        Ok(Self {
            category: category.to_string(),
            name: name.to_string(),
            version: version.to_string(),
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Package name without category or version
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The versionless `category/name` key
    pub fn cp(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }

    /// `name-version`, the on-disk entry name in most stores
    pub fn pf(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

/// Split a `category/name` key into its parts
pub fn split_cp(cp: &str) -> Option<(&str, &str)> {
    cp.split_once('/')
        .filter(|(cat, name)| !cat.is_empty() && !name.is_empty())
}

impl fmt::Display for Cpv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}-{}", self.category, self.name, self.version)
    }
}

impl FromStr for Cpv {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Cpv::parse(s)
    }
}

impl TryFrom<String> for Cpv {
    type Error = Error;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Cpv::parse(&value)
    }
}

impl From<Cpv> for String {
    fn from(cpv: Cpv) -> Self {
        cpv.to_string()
    }
}
