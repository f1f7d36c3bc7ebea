// src/policy.rs

//! Cleaning policy
//!
//! Flags and limits that steer both selectors. Limit values are absolute:
//! `time_limit` is a unix timestamp and `size_limit` a byte count. The
//! helpers [`parse_time_limit`] and [`parse_size_limit`] turn the relative
//! command-line forms (`2w3d`, `50M`) into those values.

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

static LIMIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)([A-Za-z]?)").unwrap());

/// Policy flags shared by the distfiles and binary package selectors
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleanPolicy {
    /// Keep only what installed packages need, not everything buildable
    pub destructive: bool,
    /// In destructive mode, also keep sources of fetch-restricted packages
    pub fetch_restricted: bool,
    /// In destructive mode, keep every repository version of an installed
    /// package name instead of only the installed versions
    pub package_names: bool,
    /// Drop older binary packages built with the same USE configuration
    pub unique_use: bool,
    /// Report binary packages whose dependencies differ from the repository
    pub changed_deps: bool,
    /// Unix timestamp; artifacts modified at or after it are kept. 0 disables
    pub time_limit: Option<i64>,
    /// Byte count; files at least this large are kept. 0 disables
    pub size_limit: Option<u64>,
    /// Treat an inaccessible cache directory as empty instead of failing
    pub ignore_failure: bool,
}

impl CleanPolicy {
    /// Non-destructive policy with every flag off
    pub fn new() -> Self {
        Self::default()
    }

    /// Destructive policy with every other flag off
    pub fn destructive() -> Self {
        Self {
            destructive: true,
            ..Self::default()
        }
    }

    /// Time limit in effect, if any
    pub fn active_time_limit(&self) -> Option<i64> {
        self.time_limit.filter(|limit| *limit != 0)
    }

    /// Size limit in effect, if any
    pub fn active_size_limit(&self) -> Option<u64> {
        self.size_limit.filter(|limit| *limit != 0)
    }
}

/// Split `<n><unit>` pairs, e.g. `2w3d` into `[(2, "w"), (3, "d")]`
fn limit_pairs<'a>(spec: &'a str, what: &str) -> Result<Vec<(u64, &'a str)>> {
    let spec = spec.trim();
    let invalid = || Error::ParseError(format!("Invalid {} limit '{}'", what, spec));

    let mut pairs = Vec::new();
    let mut consumed = 0;
    for caps in LIMIT_RE.captures_iter(spec) {
        let whole = caps.get(0).ok_or_else(invalid)?;
        if whole.start() != consumed {
            return Err(invalid());
        }
        consumed = whole.end();

        let count = caps[1].parse::<u64>().map_err(|_| invalid())?;
        let unit = caps.get(2).map_or("", |m| m.as_str());
        pairs.push((count, unit));
    }

    if pairs.is_empty() || consumed != spec.len() {
        return Err(invalid());
    }
    Ok(pairs)
}

/// Convert a relative age such as `2w3d` into an absolute cut-off
///
/// Units: `y` (365 days), `m` (30 days), `w`, `d`, `h`. A bare number is
/// days. The result is `now` minus the age, in unix seconds.
pub fn parse_time_limit(spec: &str, now: DateTime<Utc>) -> Result<i64> {
    let too_large = || Error::ParseError(format!("Time limit '{}' is too large", spec));
    let mut age_secs: i64 = 0;

    for (count, unit) in limit_pairs(spec, "time")? {
        let step = match unit {
            "y" => Duration::days(365),
            "m" => Duration::days(30),
            "w" => Duration::weeks(1),
            "d" | "" => Duration::days(1),
            "h" => Duration::hours(1),
            other => {
                return Err(Error::ParseError(format!(
                    "Invalid time unit '{}' in '{}' (expected y, m, w, d or h)",
                    other, spec
                )));
            }
        };
        age_secs = i64::try_from(count)
            .ok()
            .and_then(|count| count.checked_mul(step.num_seconds()))
            .and_then(|secs| age_secs.checked_add(secs))
            .ok_or_else(too_large)?;
    }

    let cutoff = Duration::try_seconds(age_secs)
        .and_then(|age| now.checked_sub_signed(age))
        .ok_or_else(too_large)?;
    Ok(cutoff.timestamp())
}

/// Convert a size such as `50M` into bytes
///
/// Units: `G`, `M`, `K` (powers of 1024) and `B`. A bare number is bytes.
pub fn parse_size_limit(spec: &str) -> Result<u64> {
    let mut total: u64 = 0;

    for (count, unit) in limit_pairs(spec, "size")? {
        let multiplier: u64 = match unit {
            "G" => 1024 * 1024 * 1024,
            "M" => 1024 * 1024,
            "K" => 1024,
            "B" | "" => 1,
            other => {
                return Err(Error::ParseError(format!(
                    "Invalid size unit '{}' in '{}' (expected G, M, K or B)",
                    other, spec
                )));
            }
        };
        total = count
            .checked_mul(multiplier)
            .and_then(|bytes| total.checked_add(bytes))
            .ok_or_else(|| Error::ParseError(format!("Size limit '{}' is too large", spec)))?;
    }

    Ok(total)
}
