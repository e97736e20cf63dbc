//! Dotted release versions (`v1.2.3`) and their comparison.
//!
//! A version is folded into a single integer where each component occupies
//! one power-of-1000 place value, most significant first. Both sides of a
//! comparison are zero-padded to the same number of components before they
//! are folded, so `v1.2` and `v1.2.0` encode to the same value.
use std::{cmp::Ordering, fmt, str::FromStr};

use crate::{constants::VERSION_COMPONENT_BASE, error::VersionError};

/// Largest number of components that still fits in an `i128` encoding.
pub const MAX_VERSION_COMPONENTS: usize = 12;

/// A parsed `v<major>.<minor>...` version.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    components: Vec<u64>,
}

impl Version {
    /// Numeric components, most significant first.
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// Folds the version into one integer using `width` place values.
    ///
    /// Missing trailing components count as zero. Components beyond `width`
    /// are ignored, so callers pass the longest component count of the pair
    /// they compare.
    pub fn encode(&self, width: usize) -> i128 {
        let base = VERSION_COMPONENT_BASE as i128;
        (0..width).fold(0, |acc, n| {
            acc * base + self.components.get(n).copied().unwrap_or(0) as i128
        })
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let raw = value.trim();
        let digits = raw
            .strip_prefix('v')
            .ok_or_else(|| VersionError::MissingPrefix(raw.to_string()))?;

        let mut components = Vec::new();
        for part in digits.split('.') {
            if part.is_empty() {
                return Err(VersionError::EmptyComponent(raw.to_string()));
            }

            let component: u64 =
                part.parse().map_err(|source| VersionError::InvalidComponent {
                    version: raw.to_string(),
                    component: part.to_string(),
                    source,
                })?;

            if component >= VERSION_COMPONENT_BASE {
                return Err(VersionError::ComponentOutOfRange {
                    version: raw.to_string(),
                    component,
                    limit: VERSION_COMPONENT_BASE,
                });
            }

            components.push(component);
        }

        if components.len() > MAX_VERSION_COMPONENTS {
            return Err(VersionError::TooManyComponents {
                version: raw.to_string(),
                limit: MAX_VERSION_COMPONENTS,
            });
        }

        Ok(Self {
            raw: raw.to_string(),
            components,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let width = self.components.len().max(other.components.len());
        (0..width)
            .map(|n| {
                let lhs = self.components.get(n).copied().unwrap_or(0);
                let rhs = other.components.get(n).copied().unwrap_or(0);
                lhs.cmp(&rhs)
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// Returns `online - local` on the shared place-value scale.
///
/// Positive means the online release is newer, negative means the local build
/// is ahead of every official release, zero means both are the same release.
pub fn delta_version(online: &str, local: &str) -> Result<i128, VersionError> {
    let local: Version = local.parse()?;
    let online: Version = online.parse()?;

    let width = online.components.len().max(local.components.len());
    Ok(online.encode(width) - local.encode(width))
}
