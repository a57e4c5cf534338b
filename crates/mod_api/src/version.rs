//! Numeric, arbitrary-length versions used by mods and the host.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A version made of any number of numeric components, e.g. `1.0.2`.
///
/// Ordering compares components pairwise; when one version is a prefix of
/// the other the shorter one sorts first, so `1.0 < 1.0.0 < 1.0.1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(Vec<u64>);

impl Version {
    /// Creates a version from its components.
    pub fn new(parts: impl Into<Vec<u64>>) -> Self {
        Self(parts.into())
    }

    /// The empty version, used as "no constraint" by instance requests.
    pub fn any() -> Self {
        Self(Vec::new())
    }

    pub fn parts(&self) -> &[u64] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u64]> for Version {
    fn from(parts: &[u64]) -> Self {
        Self(parts.to_vec())
    }
}

impl<const N: usize> From<[u64; N]> for Version {
    fn from(parts: [u64; N]) -> Self {
        Self(parts.to_vec())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = self.0.iter();
        if let Some(first) = parts.next() {
            write!(f, "{}", first)?;
            for part in parts {
                write!(f, ".{}", part)?;
            }
        }
        Ok(())
    }
}

/// Error returned when a version string contains a non-numeric component.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version component `{component}` in `{input}`")]
pub struct ParseVersionError {
    pub input: String,
    pub component: String,
}

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Self::any());
        }
        trimmed
            .split('.')
            .map(|component| {
                component.parse::<u64>().map_err(|_| ParseVersionError {
                    input: s.to_string(),
                    component: component.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorter_prefix_sorts_first() {
        assert!(Version::from([1, 0]) < Version::from([1, 0, 1]));
        assert!(Version::from([2, 1]) < Version::from([2, 1, 0]));
        assert!(Version::from([1, 9]) < Version::from([1, 10]));
        assert!(Version::from([2]) > Version::from([1, 99, 99]));
    }

    #[test]
    fn parses_and_displays_dotted_form() {
        let version: Version = "1.20.3".parse().unwrap();
        assert_eq!(version.parts(), &[1, 20, 3]);
        assert_eq!(version.to_string(), "1.20.3");
        assert_eq!("".parse::<Version>().unwrap(), Version::any());
    }

    #[test]
    fn rejects_non_numeric_components() {
        let err = "1.x.3".parse::<Version>().unwrap_err();
        assert_eq!(err.component, "x");
    }

    #[test]
    fn serializes_as_integer_array() {
        let json = serde_json::to_string(&Version::from([0, 4, 1])).unwrap();
        assert_eq!(json, "[0,4,1]");
    }
}
