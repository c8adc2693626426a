//! Classification of the difference between two versions

use std::cmp::Ordering;
use std::fmt;

use crate::version::Version;

/// Describes how version `b` differs from version `a`.
///
/// Exactly one of the upgrade flags corresponds to the highest-order segment
/// that increased; `build_metadata_change` is tracked independently of the
/// others because metadata never affects precedence.
#[derive(Debug, Clone)]
pub struct Delta {
    a: Version,
    b: Version,
    pub major_upgrade: bool,
    pub minor_upgrade: bool,
    pub patch_upgrade: bool,
    pub k0s_upgrade: bool,
    pub equal: bool,
    pub downgrade: bool,
    pub prerelease_only: bool,
    pub build_metadata_change: bool,
    pub consecutive: bool,
}

impl Delta {
    /// Analyzes the difference between two versions.
    pub fn new(a: &Version, b: &Version) -> Self {
        let cmp = a.compare(b);
        let less_than = cmp == Ordering::Less;

        let a_segments = a.padded_segments();
        let b_segments = b.padded_segments();
        let major_equal = a_segments[0] == b_segments[0];
        let minor_equal = a_segments[1] == b_segments[1];
        let patch_equal = a_segments[2] == b_segments[2];

        let mut delta = Delta {
            a: a.clone(),
            b: b.clone(),
            major_upgrade: less_than && a_segments[0] < b_segments[0],
            minor_upgrade: less_than && major_equal && a_segments[1] < b_segments[1],
            patch_upgrade: less_than && major_equal && minor_equal && a_segments[2] < b_segments[2],
            k0s_upgrade: major_equal
                && minor_equal
                && patch_equal
                && a.prerelease() == b.prerelease()
                && a.is_k0s()
                && b.is_k0s()
                && a.k0s_build() < b.k0s_build(),
            equal: cmp == Ordering::Equal,
            downgrade: cmp == Ordering::Greater,
            prerelease_only: less_than
                && a_segments == b_segments
                && (a.is_prerelease() || b.is_prerelease()),
            build_metadata_change: a.metadata() != b.metadata(),
            consecutive: false,
        };

        delta.consecutive = if delta.patch_upgrade {
            b_segments[2] - a_segments[2] == 1
        } else if delta.minor_upgrade {
            b_segments[1] - a_segments[1] == 1 && b_segments[2] == 0
        } else if delta.major_upgrade {
            b_segments[0] - a_segments[0] == 1 && b_segments[1] == 0 && b_segments[2] == 0
        } else if delta.k0s_upgrade {
            b.k0s_build() - a.k0s_build() == 1
        } else {
            false
        };

        delta
    }

    fn conseq(&self) -> &'static str {
        if self.consecutive {
            "consecutive"
        } else {
            "non-consecutive"
        }
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.downgrade {
            return write!(f, "{} is a downgrade from {}", self.b, self.a);
        }
        if self.major_upgrade {
            return write!(
                f,
                "a {} major upgrade from {} to {}",
                self.conseq(),
                self.a.truncated(1),
                self.b.truncated(1)
            );
        }
        if self.minor_upgrade {
            return write!(
                f,
                "a {} minor upgrade from {} to {}",
                self.conseq(),
                self.a.truncated(2),
                self.b.truncated(2)
            );
        }
        if self.prerelease_only {
            if self.b.is_prerelease() {
                return write!(
                    f,
                    "an upgrade between pre-release versions of {}",
                    self.a.truncated(3)
                );
            }
            return write!(
                f,
                "an upgrade from a {} pre-release to stable",
                self.a.truncated(3)
            );
        }
        if self.patch_upgrade {
            return write!(f, "a {} patch upgrade to {}", self.conseq(), self.b);
        }
        if self.k0s_upgrade {
            return write!(
                f,
                "a {} k0s upgrade to k0s build {}",
                self.conseq(),
                self.b.k0s_build()
            );
        }
        if self.build_metadata_change {
            return write!(
                f,
                "build metadata changes from {:?} to {:?}",
                self.a.metadata(),
                self.b.metadata()
            );
        }
        f.write_str("no change")
    }
}
