//! The `(major, minor)` release track identity

use std::fmt;

use crate::version::Version;

/// The major and minor segments of a [`Version`].
///
/// Useful for matching and comparing whole release lines: all patch releases
/// of `v1.26.x` share the same `MajorMinor`, and the upgrade planner buckets
/// the catalog by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MajorMinor {
    major: u32,
    minor: u32,
}

impl MajorMinor {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// True when the version's major and minor segments equal this track.
    /// Missing segments in the version are assumed to be zero.
    pub fn matches(&self, version: &Version) -> bool {
        *self == MajorMinor::from(version)
    }
}

impl From<&Version> for MajorMinor {
    fn from(version: &Version) -> Self {
        MajorMinor::new(version.major(), version.minor())
    }
}

impl fmt::Display for MajorMinor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn displays_without_prefix() {
        assert_eq!(MajorMinor::new(1, 2).to_string(), "1.2");
    }

    #[rstest]
    #[case("v1.2.3", true)]
    #[case("v1.2.0-rc.1+k0s.0", true)]
    #[case("v1.2", true)]
    #[case("v1.3.0", false)]
    #[case("v2.2.0", false)]
    fn matches_versions_on_the_same_track(#[case] version: &str, #[case] expected: bool) {
        let track = MajorMinor::new(1, 2);
        assert_eq!(track.matches(&Version::parse(version).unwrap()), expected);
    }

    #[test]
    fn missing_minor_segment_reads_as_zero() {
        let version = Version::parse("v2").unwrap();
        assert_eq!(MajorMinor::from(&version), MajorMinor::new(2, 0));
    }

    #[test]
    fn orders_major_first() {
        assert!(MajorMinor::new(1, 9) < MajorMinor::new(2, 0));
        assert!(MajorMinor::new(1, 2) < MajorMinor::new(1, 10));
        assert_eq!(MajorMinor::new(1, 2), MajorMinor::new(1, 2));
    }
}
