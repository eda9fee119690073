//! Semantic versions and version range predicates.
//!
//! Only what override gating needs: `MAJOR.MINOR[.PATCH]` versions (an
//! optional `v` prefix and any pre-release/build suffix are accepted and
//! ignored for ordering) and comma-separated comparator lists such as
//! `>=2.4.0, <2.6.0`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("invalid version: {0}")]
    InvalidVersion(String),
    #[error("invalid version requirement: {0}")]
    InvalidRequirement(String),
    #[error("version requirement cannot be empty")]
    EmptyRequirement,
}

/// A `MAJOR.MINOR.PATCH` version.
///
/// # Examples
///
/// ```
/// use ansible_schema_core::Version;
///
/// let version: Version = "v2.5".parse().unwrap();
/// assert_eq!(version, Version::new(2, 5, 0));
/// assert!(version < "2.6.0".parse().unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || VersionError::InvalidVersion(raw.to_string());
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let core = trimmed
            .split(['-', '+'])
            .next()
            .filter(|core| !core.is_empty())
            .ok_or_else(invalid)?;

        let parts = core
            .split('.')
            .map(|part| part.parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        match parts.as_slice() {
            [major, minor] => Ok(Self::new(*major, *minor, 0)),
            [major, minor, patch] => Ok(Self::new(*major, *minor, *patch)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl Op {
    fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Comparator {
    op: Op,
    version: Version,
}

impl Comparator {
    fn matches(&self, version: &Version) -> bool {
        match self.op {
            Op::Lt => version < &self.version,
            Op::Le => version <= &self.version,
            Op::Gt => version > &self.version,
            Op::Ge => version >= &self.version,
            Op::Eq => version == &self.version,
        }
    }
}

/// A conjunction of version comparators.
///
/// # Examples
///
/// ```
/// use ansible_schema_core::{Version, VersionReq};
///
/// let req: VersionReq = ">=2.4, <2.6.0".parse().unwrap();
/// assert!(req.matches(&Version::new(2, 5, 0)));
/// assert!(!req.matches(&Version::new(2, 6, 0)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionReq {
    comparators: Vec<Comparator>,
}

impl VersionReq {
    /// Requirement matching every version strictly below `version`.
    pub fn less_than(version: Version) -> Self {
        Self {
            comparators: vec![Comparator {
                op: Op::Lt,
                version,
            }],
        }
    }

    /// Returns `true` when `version` satisfies every comparator.
    pub fn matches(&self, version: &Version) -> bool {
        self.comparators
            .iter()
            .all(|comparator| comparator.matches(version))
    }
}

impl FromStr for VersionReq {
    type Err = VersionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.trim().is_empty() {
            return Err(VersionError::EmptyRequirement);
        }

        let comparators = raw
            .split(',')
            .map(|part| parse_comparator(part.trim()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { comparators })
    }
}

fn parse_comparator(raw: &str) -> Result<Comparator, VersionError> {
    let (op, rest) = if let Some(rest) = raw.strip_prefix("<=") {
        (Op::Le, rest)
    } else if let Some(rest) = raw.strip_prefix(">=") {
        (Op::Ge, rest)
    } else if let Some(rest) = raw.strip_prefix("==") {
        (Op::Eq, rest)
    } else if let Some(rest) = raw.strip_prefix('<') {
        (Op::Lt, rest)
    } else if let Some(rest) = raw.strip_prefix('>') {
        (Op::Gt, rest)
    } else if let Some(rest) = raw.strip_prefix('=') {
        (Op::Eq, rest)
    } else {
        (Op::Eq, raw)
    };

    let version = rest
        .trim()
        .parse()
        .map_err(|_| VersionError::InvalidRequirement(raw.to_string()))?;
    Ok(Comparator { op, version })
}

impl TryFrom<String> for VersionReq {
    type Error = VersionError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<VersionReq> for String {
    fn from(req: VersionReq) -> Self {
        req.to_string()
    }
}

impl fmt::Display for VersionReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .comparators
            .iter()
            .map(|comparator| format!("{}{}", comparator.op.symbol(), comparator.version))
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_ignores_prerelease_suffix() {
        let version: Version = "2.6.0-rc1".parse().unwrap();
        assert_eq!(version, Version::new(2, 6, 0));
    }

    #[test]
    fn test_version_rejects_garbage() {
        assert!("two.five".parse::<Version>().is_err());
        assert!("2".parse::<Version>().is_err());
        assert!("".parse::<Version>().is_err());
    }

    #[test]
    fn test_requirement_upper_bound_is_exclusive() {
        let req: VersionReq = "<2.6.0".parse().unwrap();
        assert!(req.matches(&Version::new(2, 5, 9)));
        assert!(!req.matches(&Version::new(2, 6, 0)));
    }

    #[test]
    fn test_bare_requirement_means_exact_match() {
        let req: VersionReq = "2.5.0".parse().unwrap();
        assert!(req.matches(&Version::new(2, 5, 0)));
        assert!(!req.matches(&Version::new(2, 5, 1)));
    }

    #[test]
    fn test_requirement_rejects_empty_and_malformed_input() {
        assert_eq!(
            "  ".parse::<VersionReq>(),
            Err(VersionError::EmptyRequirement)
        );
        assert!(matches!(
            "<2.x".parse::<VersionReq>(),
            Err(VersionError::InvalidRequirement(_))
        ));
    }

    #[test]
    fn test_requirement_display_round_trips() {
        let req: VersionReq = ">= 2.4, <2.6.0".parse().unwrap();
        assert_eq!(req.to_string(), ">=2.4.0, <2.6.0");
        assert_eq!(req.to_string().parse::<VersionReq>().unwrap(), req);
    }
}
