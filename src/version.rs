use crate::error::{GitReleaseError, Result};

/// Release version format accepted everywhere in git-release: three dotted
/// numeric components, nothing else (no pre-release or build metadata).
const VERSION_PATTERN: &str = r"^(\d+)\.(\d+)\.(\d+)$";

/// Represents a semantic version with major, minor, and patch components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Creates a new Version with the specified major, minor, and patch components.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// The kind of version change to apply during a bump.
///
/// Major, Minor, and Patch increment one component and reset the lower ones.
/// Explicit carries a fully specified target version and bypasses the
/// arithmetic entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bump {
    Major,
    Minor,
    Patch,
    Explicit(Version),
}

impl Bump {
    /// Parses the CLI bump argument.
    ///
    /// Accepts one of the literal kinds (`major`, `minor`, `patch`) or an
    /// explicit `X.Y.Z` version.
    ///
    /// # Returns
    /// * `Ok(Bump)` - Recognized bump kind
    /// * `Err` - Parse error naming the accepted forms
    pub fn from_arg(arg: &str) -> Result<Bump> {
        match arg {
            "major" => Ok(Bump::Major),
            "minor" => Ok(Bump::Minor),
            "patch" => Ok(Bump::Patch),
            other => parse_version(other).map(Bump::Explicit).map_err(|_| {
                GitReleaseError::parse(format!(
                    "expected 'major', 'minor', 'patch', or an explicit X.Y.Z version, got '{}'",
                    other
                ))
            }),
        }
    }
}

/// Parses a release version string.
///
/// The input must match `^\d+\.\d+\.\d+$` exactly; anything else (prefixes,
/// pre-release suffixes, missing components) is a parse error.
///
/// # Example
/// ```
/// # use git_release::version::parse_version;
/// let version = parse_version("1.2.3").unwrap();
/// assert_eq!(version.to_string(), "1.2.3");
/// assert!(parse_version("v1.2.3").is_err());
/// ```
pub fn parse_version(input: &str) -> Result<Version> {
    let re = regex::Regex::new(VERSION_PATTERN)
        .map_err(|e| GitReleaseError::parse(e.to_string()))?;

    let captures = re
        .captures(input)
        .ok_or_else(|| GitReleaseError::parse(format!("'{}' is not an X.Y.Z version", input)))?;

    let mut components = [0u64; 3];
    for (slot, index) in components.iter_mut().zip(1..=3) {
        let digits = captures
            .get(index)
            .ok_or_else(|| GitReleaseError::parse(format!("'{}' is missing a component", input)))?;
        *slot = digits.as_str().parse::<u64>().map_err(|e| {
            GitReleaseError::parse(format!("component '{}' of '{}': {}", digits.as_str(), input, e))
        })?;
    }

    Ok(Version::new(components[0], components[1], components[2]))
}

/// Computes the next version from the current version string and a bump kind.
///
/// - **Major**: `(major+1, 0, 0)`
/// - **Minor**: `(major, minor+1, 0)`
/// - **Patch**: `(major, minor, patch+1)`
/// - **Explicit**: the supplied version, unchanged
///
/// Explicit bumps are not checked against the current version; an explicit
/// downgrade is accepted silently.
///
/// Pure function: no side effects, the manifest is untouched.
pub fn resolve(current: &str, bump: &Bump) -> Result<Version> {
    let version = parse_version(current)?;

    Ok(match bump {
        Bump::Major => Version::new(version.major + 1, 0, 0),
        Bump::Minor => Version::new(version.major, version.minor + 1, 0),
        Bump::Patch => Version::new(version.major, version.minor, version.patch + 1),
        Bump::Explicit(explicit) => explicit.clone(),
    })
}
