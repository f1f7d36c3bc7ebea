// src/depend/eapi.rs

//! EAPI revisions and the dependency syntax each one allows

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// An EAPI revision (0 through 8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Eapi(u8);

impl Eapi {
    /// Newest revision whose grammar is understood
    pub const LATEST: Eapi = Eapi(8);

    /// Parse an EAPI value as stored in metadata; an empty value means EAPI 0
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self(0));
        }

        match s.parse::<u8>() {
            Ok(n) if n <= Self::LATEST.0 => Ok(Self(n)),
            _ => Err(Error::UnsupportedEapi(s.to_string())),
        }
    }

    /// `:slot` dependencies
    pub fn has_slot_deps(self) -> bool {
        self.0 >= 1
    }

    /// `[flag]` USE dependencies
    pub fn has_use_deps(self) -> bool {
        self.0 >= 2
    }

    /// `!!atom` strong blockers
    pub fn has_strong_blocks(self) -> bool {
        self.0 >= 2
    }

    /// `^^ ( ... )` exactly-one-of groups
    pub fn has_exactly_one_of(self) -> bool {
        self.0 >= 4
    }

    /// `[flag(+)]` USE dependency defaults
    pub fn has_use_dep_defaults(self) -> bool {
        self.0 >= 4
    }

    /// `:=`/`:*` slot operators and `/subslot`
    pub fn has_slot_operators(self) -> bool {
        self.0 >= 5
    }

    /// `?? ( ... )` at-most-one-of groups
    pub fn has_at_most_one_of(self) -> bool {
        self.0 >= 5
    }
}

impl fmt::Display for Eapi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Eapi {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Eapi::parse(s)
    }
}
