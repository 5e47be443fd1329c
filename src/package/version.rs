//! Package versions and version ranges.
//!
//! Versions keep the raw string they were declared with. Ordering is lenient
//! semantic versioning: `1.2` is padded to `1.2.0`, pre-releases sort before
//! the release, and strings that are not semver at all fall back to a
//! segment-wise comparison. The empty version ("unversioned") sorts lowest.

use crate::error::ParseIdError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A package version as declared, with lenient semantic ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(raw: impl Into<String>) -> Self {
        Version(raw.into().trim().to_string())
    }

    pub fn unversioned() -> Self {
        Version(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Precedence comparison. Unlike `Ord`, two differently spelled versions
    /// (`1.0` and `1.0.0`) compare equal here.
    pub fn cmp_precedence(&self, other: &Version) -> Ordering {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
        match (lenient_semver(&self.0), lenient_semver(&other.0)) {
            (Some(a), Some(b)) => a
                .major
                .cmp(&b.major)
                .then(a.minor.cmp(&b.minor))
                .then(a.patch.cmp(&b.patch))
                .then_with(|| a.pre.cmp(&b.pre)),
            _ => compare_segments(&self.0, &other.0),
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_precedence(other).then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Version {
    fn from(raw: &str) -> Self {
        Version::new(raw)
    }
}

fn lenient_semver(raw: &str) -> Option<semver::Version> {
    if let Ok(v) = semver::Version::parse(raw) {
        return Some(v);
    }
    let split = raw.find(|c| c == '-' || c == '+').unwrap_or(raw.len());
    let (core, rest) = raw.split_at(split);
    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3
        || parts
            .iter()
            .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }
    let mut padded = parts.join(".");
    for _ in parts.len()..3 {
        padded.push_str(".0");
    }
    padded.push_str(rest);
    semver::Version::parse(&padded).ok()
}

fn compare_segments(a: &str, b: &str) -> Ordering {
    let is_sep = |c: char| c == '.' || c == '-' || c == '_';
    let mut left = a.split(is_sep);
    let mut right = b.split(is_sep);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (Some(x), Some(y)) => {
                let ord = compare_runs(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Split a segment into alternating digit and non-digit runs.
fn runs(segment: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut digits = None;
    for (idx, c) in segment.char_indices() {
        let is_digit = c.is_ascii_digit();
        if digits.is_some_and(|d| d != is_digit) {
            out.push(&segment[start..idx]);
            start = idx;
        }
        digits = Some(is_digit);
    }
    if start < segment.len() {
        out.push(&segment[start..]);
    }
    out
}

/// Digit runs compare numerically and sort after text runs, so `SP12`
/// follows `SP3`.
fn compare_runs(a: &str, b: &str) -> Ordering {
    let numeric = |run: &str| run.bytes().all(|b| b.is_ascii_digit());
    let (left, right) = (runs(a), runs(b));
    for (x, y) in left.iter().zip(right.iter()) {
        let ord = match (numeric(x), numeric(y)) {
            (true, true) => {
                let (x, y) = (x.trim_start_matches('0'), y.trim_start_matches('0'));
                x.len().cmp(&y.len()).then_with(|| x.cmp(y))
            }
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    left.len().cmp(&right.len())
}

/// Version range with optional inclusive/exclusive bounds.
///
/// Textual forms:
/// - `""` matches any version
/// - `1.0` means "1.0 or later"
/// - `[1.0,2.0)`, `(1.0,]`, `[,2.0]` with either bound optional
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VersionRange {
    low: Option<Version>,
    low_inclusive: bool,
    high: Option<Version>,
    high_inclusive: bool,
}

impl VersionRange {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn at_least(version: impl Into<Version>) -> Self {
        VersionRange {
            low: Some(version.into()),
            low_inclusive: true,
            high: None,
            high_inclusive: false,
        }
    }

    pub fn between(
        low: Option<Version>,
        low_inclusive: bool,
        high: Option<Version>,
        high_inclusive: bool,
    ) -> Self {
        VersionRange {
            low,
            low_inclusive,
            high,
            high_inclusive,
        }
    }

    pub fn is_any(&self) -> bool {
        self.low.is_none() && self.high.is_none()
    }

    pub fn contains(&self, version: &Version) -> bool {
        if let Some(low) = &self.low {
            match version.cmp_precedence(low) {
                Ordering::Less => return false,
                Ordering::Equal if !self.low_inclusive => return false,
                _ => {}
            }
        }
        if let Some(high) = &self.high {
            match version.cmp_precedence(high) {
                Ordering::Greater => return false,
                Ordering::Equal if !self.high_inclusive => return false,
                _ => {}
            }
        }
        true
    }
}

impl FromStr for VersionRange {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(VersionRange::any());
        }
        let first = s.chars().next().unwrap_or_default();
        if first != '[' && first != '(' {
            if s.contains(',') {
                return Err(ParseIdError::InvalidRange(s.to_string()));
            }
            return Ok(VersionRange::at_least(Version::new(s)));
        }
        let low_inclusive = first == '[';
        let high_inclusive = match s.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(ParseIdError::InvalidRange(s.to_string())),
        };
        let inner = &s[1..s.len() - 1];
        let (low, high) = inner
            .split_once(',')
            .ok_or_else(|| ParseIdError::InvalidRange(s.to_string()))?;
        let bound = |raw: &str| {
            let raw = raw.trim();
            (!raw.is_empty()).then(|| Version::new(raw))
        };
        let range = VersionRange {
            low: bound(low),
            low_inclusive,
            high: bound(high),
            high_inclusive,
        };
        if let (Some(l), Some(h)) = (&range.low, &range.high) {
            if l.cmp_precedence(h) == Ordering::Greater {
                return Err(ParseIdError::InvalidRange(s.to_string()));
            }
        }
        Ok(range)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            return Ok(());
        }
        if let (Some(low), None, true) = (&self.low, &self.high, self.low_inclusive) {
            return write!(f, "{}", low);
        }
        write!(
            f,
            "{}{},{}{}",
            if self.low_inclusive { '[' } else { '(' },
            self.low.as_ref().map(|v| v.as_str()).unwrap_or(""),
            self.high.as_ref().map(|v| v.as_str()).unwrap_or(""),
            if self.high_inclusive { ']' } else { ')' },
        )
    }
}
