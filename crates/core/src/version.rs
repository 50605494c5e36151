// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Product versions and version ranges.
//!
//! A version is a dot-separated list of unsigned integers of any arity.
//! Ordering pads the shorter list with zeros, so `4.9` and `4.9.0.0` are
//! the same version. An optional `-qualifier` suffix (e.g. `-SNAPSHOT`) is
//! kept for display but ignored for ordering and equality.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing a version string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("empty version string")]
    Empty,
    #[error("invalid version '{text}': segment '{segment}' is not a number")]
    InvalidSegment { text: String, segment: String },
}

/// An immutable product version such as `4.9.2.0`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    segments: Vec<u64>,
    text: String,
}

impl Version {
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let text = text.trim();
        let numeric = match text.split_once('-') {
            Some((numeric, _qualifier)) => numeric,
            None => text,
        };
        if numeric.is_empty() {
            return Err(VersionError::Empty);
        }

        let segments = numeric
            .split('.')
            .map(|segment| {
                segment
                    .parse::<u64>()
                    .map_err(|_| VersionError::InvalidSegment {
                        text: text.to_string(),
                        segment: segment.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            segments,
            text: text.to_string(),
        })
    }

    /// Numeric segments as written (no padding).
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Dotless form used in script names: `2.1.7` → `217`, `4.10.0` → `4100`.
    pub fn compact(&self) -> String {
        self.segments.iter().map(u64::to_string).collect()
    }

    /// Segments with trailing zeros removed; the canonical form for hashing.
    fn significant(&self) -> &[u64] {
        let len = self
            .segments
            .iter()
            .rposition(|s| *s != 0)
            .map_or(0, |i| i + 1);
        &self.segments[..len]
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let a = self.segments.get(i).copied().unwrap_or(0);
            let b = other.segments.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version({})", self.text)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.text
    }
}

/// Inclusive range of versions a migration step may start from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionRange {
    pub lower: Version,
    pub upper: Version,
}

impl VersionRange {
    pub fn new(lower: Version, upper: Version) -> Self {
        Self { lower, upper }
    }

    /// Range covering exactly one version.
    pub fn exact(version: Version) -> Self {
        Self {
            lower: version.clone(),
            upper: version,
        }
    }

    pub fn contains(&self, version: &Version) -> bool {
        &self.lower <= version && version <= &self.upper
    }

    /// True when the range holds a single version.
    pub fn is_exact(&self) -> bool {
        self.lower == self.upper
    }

    pub fn is_inverted(&self) -> bool {
        self.upper < self.lower
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_exact() {
            write!(f, "{}", self.lower)
        } else {
            write!(f, "{}..={}", self.lower, self.upper)
        }
    }
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
