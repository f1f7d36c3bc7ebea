// src/depend/atom.rs

//! Dependency atoms
//!
//! Syntax: `[!|!!][op]category/name[-version][*][:slot[/subslot][=|*]][::repo][use,deps]`
//! Examples:
//! - `dev-libs/openssl` → any version
//! - `>=dev-libs/openssl-3.0:0/3=` → version bound with a slot operator
//! - `!!<sys-apps/portage-2.1` → strong blocker

use super::eapi::Eapi;
use crate::cpv::{split_cp, Cpv};
use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9+_.-]*$").unwrap());

static USE_DEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(!)?(-)?[A-Za-z0-9][A-Za-z0-9+_@-]*(\([+-]\))?([=?])?$").unwrap()
});

/// Blocker prefix of an atom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Blocker {
    /// `!atom`
    Weak,
    /// `!!atom`
    Strong,
}

impl Blocker {
    pub fn as_prefix(&self) -> &'static str {
        match self {
            Self::Weak => "!",
            Self::Strong => "!!",
        }
    }
}

/// Version comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Less,
    LessOrEqual,
    Equal,
    /// `~`: any revision of the version
    Approximate,
    GreaterOrEqual,
    Greater,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Equal => "=",
            Self::Approximate => "~",
            Self::GreaterOrEqual => ">=",
            Self::Greater => ">",
        }
    }

    /// Split a leading operator off an atom body
    fn split_prefix(s: &str) -> (Option<Self>, &str) {
        // Two-character operators first
        for (prefix, op) in [
            (">=", Self::GreaterOrEqual),
            ("<=", Self::LessOrEqual),
            (">", Self::Greater),
            ("<", Self::Less),
            ("=", Self::Equal),
            ("~", Self::Approximate),
        ] {
            if let Some(rest) = s.strip_prefix(prefix) {
                return (Some(op), rest);
            }
        }
        (None, s)
    }
}

/// Slot operator: how a dependency reacts to slot/sub-slot changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotOperator {
    /// `:=` rebuild on slot or sub-slot change
    Equal,
    /// `:*` any slot, never rebuild
    Star,
}

/// The `:slot[/subslot][op]` part of an atom
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotDep {
    pub slot: Option<String>,
    pub subslot: Option<String>,
    pub operator: Option<SlotOperator>,
}

impl SlotDep {
    fn parse(s: &str, eapi: Eapi) -> std::result::Result<Self, String> {
        if s == "*" {
            if !eapi.has_slot_operators() {
                return Err(format!("slot operators are not allowed in EAPI {}", eapi));
            }
            return Ok(Self {
                slot: None,
                subslot: None,
                operator: Some(SlotOperator::Star),
            });
        }

        let (body, operator) = match s.strip_suffix('=') {
            Some(body) => {
                if !eapi.has_slot_operators() {
                    return Err(format!("slot operators are not allowed in EAPI {}", eapi));
                }
                (body, Some(SlotOperator::Equal))
            }
            None => (s, None),
        };

        if body.is_empty() {
            return match operator {
                Some(_) => Ok(Self {
                    slot: None,
                    subslot: None,
                    operator,
                }),
                None => Err("empty slot".to_string()),
            };
        }

        let (slot, subslot) = match body.split_once('/') {
            Some((slot, subslot)) => {
                if !eapi.has_slot_operators() {
                    return Err(format!("sub-slots are not allowed in EAPI {}", eapi));
                }
                (slot, Some(subslot))
            }
            None => (body, None),
        };

        if !NAME_RE.is_match(slot) || subslot.is_some_and(|s| !NAME_RE.is_match(s)) {
            return Err(format!("invalid slot '{}'", body));
        }

        Ok(Self {
            slot: Some(slot.to_string()),
            subslot: subslot.map(str::to_string),
            operator,
        })
    }
}

impl fmt::Display for SlotDep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":")?;
        if let Some(ref slot) = self.slot {
            write!(f, "{}", slot)?;
        }
        if let Some(ref subslot) = self.subslot {
            write!(f, "/{}", subslot)?;
        }
        match self.operator {
            Some(SlotOperator::Equal) => write!(f, "="),
            Some(SlotOperator::Star) => write!(f, "*"),
            None => Ok(()),
        }
    }
}

/// A single package dependency atom
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    pub blocker: Option<Blocker>,
    pub operator: Option<Operator>,
    /// `category/name`
    pub cp: String,
    pub version: Option<String>,
    /// Trailing `*` on an `=` atom
    pub glob: bool,
    pub slot: Option<SlotDep>,
    pub repo: Option<String>,
    /// USE dependencies in written order
    pub use_deps: Vec<String>,
}

impl Atom {
    /// Parse an atom under the grammar of `eapi`
    pub fn parse(s: &str, eapi: Eapi) -> Result<Self> {
        let invalid = |reason: &str| Error::ParseError(format!("Invalid atom '{}': {}", s, reason));

        let (blocker, rest) = if let Some(rest) = s.strip_prefix("!!") {
            if !eapi.has_strong_blocks() {
                return Err(invalid(&format!("strong blockers are not allowed in EAPI {}", eapi)));
            }
            (Some(Blocker::Strong), rest)
        } else if let Some(rest) = s.strip_prefix('!') {
            (Some(Blocker::Weak), rest)
        } else {
            (None, s)
        };

        let (operator, rest) = Operator::split_prefix(rest);

        let (rest, use_deps) = match rest.find('[') {
            Some(pos) => {
                if !eapi.has_use_deps() {
                    return Err(invalid(&format!("USE dependencies are not allowed in EAPI {}", eapi)));
                }
                let inner = rest[pos + 1..]
                    .strip_suffix(']')
                    .ok_or_else(|| invalid("unterminated USE dependency"))?;
                let deps = parse_use_deps(inner, eapi).map_err(|reason| invalid(&reason))?;
                (&rest[..pos], deps)
            }
            None => (rest, Vec::new()),
        };

        let (rest, repo) = match rest.split_once("::") {
            Some((body, repo)) => {
                if !NAME_RE.is_match(repo) {
                    return Err(invalid("invalid repository name"));
                }
                (body, Some(repo.to_string()))
            }
            None => (rest, None),
        };

        let (rest, slot) = match rest.split_once(':') {
            Some((body, slot)) => {
                if !eapi.has_slot_deps() {
                    return Err(invalid(&format!("slot dependencies are not allowed in EAPI {}", eapi)));
                }
                (body, Some(SlotDep::parse(slot, eapi).map_err(|reason| invalid(&reason))?))
            }
            None => (rest, None),
        };

        let (cp, version, glob) = match operator {
            Some(op) => {
                let (body, glob) = match rest.strip_suffix('*') {
                    Some(body) => (body, true),
                    None => (rest, false),
                };
                if glob && op != Operator::Equal {
                    return Err(invalid("'*' suffix requires the '=' operator"));
                }
                let cpv = Cpv::parse(body).map_err(|_| invalid("operator requires a versioned package"))?;
                (cpv.cp(), Some(cpv.version().to_string()), glob)
            }
            None => {
                if Cpv::parse(rest).is_ok() {
                    return Err(invalid("version requires an operator"));
                }
                let valid = split_cp(rest)
                    .is_some_and(|(cat, name)| NAME_RE.is_match(cat) && NAME_RE.is_match(name));
                if !valid {
                    return Err(invalid("expected category/name"));
                }
                (rest.to_string(), None, false)
            }
        };

        Ok(Self {
            blocker,
            operator,
            cp,
            version,
            glob,
            slot,
            repo,
            use_deps,
        })
    }

    /// Drop the slot part of an atom that carries a slot operator
    ///
    /// Built packages record `:=` as the resolved `:slot/subslot=`, so the
    /// slot and sub-slot go together with the operator.
    pub fn strip_slot_operator(&mut self) {
        if self.slot.as_ref().is_some_and(|s| s.operator.is_some()) {
            self.slot = None;
        }
    }
}

fn parse_use_deps(inner: &str, eapi: Eapi) -> std::result::Result<Vec<String>, String> {
    inner
        .split(',')
        .map(|dep| {
            let caps = USE_DEP_RE
                .captures(dep)
                .ok_or_else(|| format!("invalid USE dependency '{}'", dep))?;
            let negated = caps.get(1).is_some();
            let minus = caps.get(2).is_some();
            let default = caps.get(3).is_some();
            let suffix = caps.get(4).is_some();

            if (negated && (minus || !suffix)) || (minus && suffix) {
                return Err(format!("invalid USE dependency '{}'", dep));
            }
            if default && !eapi.has_use_dep_defaults() {
                return Err(format!("USE dependency defaults are not allowed in EAPI {}", eapi));
            }
            Ok(dep.to_string())
        })
        .collect()
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(blocker) = self.blocker {
            write!(f, "{}", blocker.as_prefix())?;
        }
        if let Some(op) = self.operator {
            write!(f, "{}", op.as_str())?;
        }
        write!(f, "{}", self.cp)?;
        if let Some(ref version) = self.version {
            write!(f, "-{}", version)?;
        }
        if self.glob {
            write!(f, "*")?;
        }
        if let Some(ref slot) = self.slot {
            write!(f, "{}", slot)?;
        }
        if let Some(ref repo) = self.repo {
            write!(f, "::{}", repo)?;
        }
        if !self.use_deps.is_empty() {
            write!(f, "[{}]", self.use_deps.join(","))?;
        }
        Ok(())
    }
}
