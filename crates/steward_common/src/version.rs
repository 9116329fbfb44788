//! Version values for installed, running, available and latest client builds
//!
//! Probes hand us free-form strings (`v1.10.13`, `2.0.1-rc.0`, `1.10.12+build1`).
//! They are parsed into `Version`; anything a probe could not determine is the
//! `ProbedVersion::Unknown` sentinel, which never takes part in a comparison.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A parsed release version (semver-like, any number of numeric components)
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Numeric release components (e.g. [1, 10, 13])
    pub release: Vec<u64>,
    /// Pre-release label (e.g. "rc.0"), sorts before the plain release
    pub pre: Option<String>,
}

impl Version {
    /// Parse a version string, tolerating a leading `v` and trailing build metadata
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let without_build = trimmed.split('+').next().unwrap_or(trimmed);

        let (release_part, pre) = match without_build.split_once('-') {
            Some((release, pre)) if !pre.is_empty() => (release, Some(pre.to_string())),
            Some((release, _)) => (release, None),
            None => (without_build, None),
        };

        if release_part.is_empty() {
            return None;
        }

        let mut release = Vec::new();
        for component in release_part.split('.') {
            release.push(component.parse::<u64>().ok()?);
        }

        Some(Version { release, pre })
    }

    fn component(&self, index: usize) -> u64 {
        self.release.get(index).copied().unwrap_or(0)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let width = self.release.len().max(other.release.len());
        for index in 0..width {
            match self.component(index).cmp(&other.component(index)) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }

        match (&self.pre, &other.pre) {
            (None, None) => Ordering::Equal,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a), Some(b)) => compare_pre(a, b),
        }
    }
}

/// Compare pre-release labels identifier by identifier
///
/// Numeric identifiers compare as numbers and sort below alphanumeric ones.
/// A label that is a prefix of the other sorts first.
fn compare_pre(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        let ordering = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match (x.parse::<u64>(), y.parse::<u64>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                (Ok(_), Err(_)) => Ordering::Less,
                (Err(_), Ok(_)) => Ordering::Greater,
                (Err(_), Err(_)) => x.cmp(y),
            },
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let release: Vec<String> = self.release.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", release.join("."))?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

/// A version as reported by a probe: either concretely known or unknown
///
/// Deliberately has no ordering. Use `is_older_than`, which refuses to
/// compare when either side is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProbedVersion {
    Known(Version),
    #[default]
    Unknown,
}

impl ProbedVersion {
    /// Parse a probe string, degrading to `Unknown` when it is not a version
    pub fn parse(input: &str) -> Self {
        match Version::parse(input) {
            Some(version) => ProbedVersion::Known(version),
            None => ProbedVersion::Unknown,
        }
    }

    pub fn known(&self) -> Option<&Version> {
        match self {
            ProbedVersion::Known(version) => Some(version),
            ProbedVersion::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        self.known().is_some()
    }

    /// True only when both versions are known and `self < other`
    pub fn is_older_than(&self, other: &ProbedVersion) -> bool {
        match (self.known(), other.known()) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        }
    }
}

impl From<Version> for ProbedVersion {
    fn from(version: Version) -> Self {
        ProbedVersion::Known(version)
    }
}

impl fmt::Display for ProbedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbedVersion::Known(version) => write!(f, "{}", version),
            ProbedVersion::Unknown => write!(f, "unknown"),
        }
    }
}
