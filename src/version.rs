//! The k0s version value: parsing, precedence and rendering
//!
//! k0s versions follow Semantic Versioning 2.0 with one extension: a
//! `+k0s.N` build-metadata tag that participates in precedence. The pair is
//! hoisted out of the metadata during parsing, so `v1.23.3+k0s.1` and
//! `v1.23.3+k0s.2` compare unequal even though plain semver would treat the
//! build metadata as insignificant.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config;
use crate::error::InvalidVersion;

/// Base URL of the k0s release repository, used by the URL builders.
pub const BASE_URL: &str = "https://github.com/k0sproject/k0s/";

const K0S: &str = "k0s";
const MAX_SEGMENTS: usize = 3;

/// A parsed k0s version.
///
/// Immutable once parsed. The default value is the "unset" zero version: it
/// has no segments, renders as the empty string and is never produced by the
/// parser.
///
/// Ordering folds the `k0s.N` build tag into precedence:
///
/// ```
/// use k0s_version::Version;
///
/// let a: Version = "1.23.1+k0s.1".parse().unwrap();
/// let b: Version = "1.23.1+k0s.2".parse().unwrap();
/// assert!(a < b);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Version {
    segments: [u32; MAX_SEGMENTS],
    num_segments: usize,
    pre: String,
    is_k0s: bool,
    k0s: u32,
    meta: String,
}

impl Version {
    /// Parses a version string. A leading `v` is stripped; the remainder may
    /// only contain `a-z`, `0-9`, `+`, `-` and `.`.
    pub fn parse(input: &str) -> Result<Self, InvalidVersion> {
        let body = input.strip_prefix('v').unwrap_or(input);
        if body.is_empty() {
            return Err(InvalidVersion::new(input, "empty version"));
        }
        if let Some(c) = body
            .chars()
            .find(|c| !matches!(c, 'a'..='z' | '0'..='9' | '+' | '-' | '.'))
        {
            return Err(InvalidVersion::new(
                input,
                format!("character {c:?} is not allowed"),
            ));
        }

        let (core, extra) = match body.find(['-', '+']) {
            Some(idx) => (&body[..idx], &body[idx..]),
            None => (body, ""),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > MAX_SEGMENTS {
            return Err(InvalidVersion::new(
                input,
                format!("too many segments ({} > {MAX_SEGMENTS})", parts.len()),
            ));
        }

        let mut segments = [0u32; MAX_SEGMENTS];
        for (idx, part) in parts.iter().enumerate() {
            segments[idx] = part.parse::<u32>().map_err(|err| {
                InvalidVersion::new(input, format!("parsing segment {part:?}: {err}"))
            })?;
        }

        let mut version = Version {
            segments,
            num_segments: parts.len(),
            ..Default::default()
        };

        if extra.is_empty() {
            return Ok(version);
        }

        let (pre, meta) = match extra.strip_prefix('-') {
            Some(tail) => match tail.split_once('+') {
                Some((pre, meta)) => (pre, Some(meta)),
                None => (tail, None),
            },
            None => ("", extra.strip_prefix('+')),
        };

        version.pre = pre.to_string();
        if let Some(meta) = meta {
            let (is_k0s, k0s, retained) = hoist_k0s(meta);
            version.is_k0s = is_k0s;
            version.k0s = k0s;
            version.meta = retained;
        }

        Ok(version)
    }

    /// The numeric segments actually present in the input (1 to 3).
    pub fn segments(&self) -> &[u32] {
        &self.segments[..self.num_segments]
    }

    /// How many numeric segments the input carried.
    pub fn segment_count(&self) -> usize {
        self.num_segments
    }

    /// The major segment. Missing segments read as zero.
    pub fn major(&self) -> u32 {
        self.segments[0]
    }

    /// The minor segment. Missing segments read as zero.
    pub fn minor(&self) -> u32 {
        self.segments[1]
    }

    /// The patch segment. Missing segments read as zero.
    pub fn patch(&self) -> u32 {
        self.segments[2]
    }

    /// The prerelease tail without the leading `-`, empty for stable versions.
    pub fn prerelease(&self) -> &str {
        &self.pre
    }

    /// True when the version carries a prerelease tail.
    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }

    /// True when the build metadata carried a `k0s.N` tag.
    pub fn is_k0s(&self) -> bool {
        self.is_k0s
    }

    /// The k0s build number (the `N` of `+k0s.N`), zero when untagged.
    pub fn k0s_build(&self) -> u32 {
        self.k0s
    }

    /// The build metadata with any `k0s.N` pair removed.
    ///
    /// The pair is hoisted wherever it appears, so `+foo.k0s.7` retains
    /// `foo` here even if the author did not intend a build tag. When the
    /// number fails to parse the tokens stay in the metadata untouched.
    pub fn metadata(&self) -> &str {
        &self.meta
    }

    /// True for the unset zero value.
    pub fn is_zero(&self) -> bool {
        self.num_segments == 0
    }

    /// Compares two versions; build metadata never affects the result.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    /// URL of the release information page for this version.
    pub fn release_url(&self) -> String {
        format!("{BASE_URL}releases/tag/{}", self.url_string())
    }

    /// Download URL of the k0s binary for the given OS and architecture.
    /// The `.exe` suffix is appended for OS names starting with `win`.
    pub fn download_url(&self, os: &str, arch: &str) -> String {
        let ext = if os.to_lowercase().starts_with("win") {
            ".exe"
        } else {
            ""
        };
        format!("{}k0s-{self}-{arch}{ext}", self.asset_base_url())
    }

    /// Download URL of the airgap bundle for the given architecture.
    pub fn airgap_download_url(&self, arch: &str) -> String {
        format!("{}k0s-airgap-bundle-{self}-{arch}", self.asset_base_url())
    }

    /// URL of the documentation page for this version.
    pub fn docs_url(&self) -> String {
        format!("{}/{self}/", config::DEFAULT_DOCS_BASE_URL)
    }

    /// A copy truncated to the first `n` numeric segments, with the
    /// prerelease and metadata tails dropped.
    pub(crate) fn truncated(&self, n: usize) -> Version {
        let num_segments = n.min(MAX_SEGMENTS);
        let mut segments = [0u32; MAX_SEGMENTS];
        segments[..num_segments].copy_from_slice(&self.segments[..num_segments]);
        Version {
            segments,
            num_segments,
            ..Default::default()
        }
    }

    pub(crate) fn padded_segments(&self) -> &[u32; MAX_SEGMENTS] {
        &self.segments
    }

    /// A copy with missing trailing segments made explicit, so `1.1-rc.1`
    /// renders as `v1.1.0-rc.1`. Precedence is unaffected.
    pub(crate) fn zero_padded(&self) -> Version {
        let mut padded = self.clone();
        padded.num_segments = MAX_SEGMENTS;
        padded
    }

    fn url_string(&self) -> String {
        self.to_string().replace('+', "%2B")
    }

    fn asset_base_url(&self) -> String {
        format!("{BASE_URL}releases/download/{}/", self.url_string())
    }
}

/// Splits build metadata on `.` and extracts a `k0s.<N>` pair. The pair is
/// removed and the remaining parts are rejoined in order. A `k0s` token
/// without a numeric follower stays in the metadata.
fn hoist_k0s(meta: &str) -> (bool, u32, String) {
    let parts: Vec<&str> = meta.split('.').collect();
    let mut is_k0s = false;
    let mut k0s = 0;
    let mut retained = Vec::with_capacity(parts.len());

    let mut idx = 0;
    while idx < parts.len() {
        if parts[idx] == K0S && idx + 1 < parts.len() {
            if let Ok(n) = parts[idx + 1].parse::<u32>() {
                is_k0s = true;
                k0s = n;
                idx += 2;
                continue;
            }
        }
        retained.push(parts[idx]);
        idx += 1;
    }

    (is_k0s, k0s, retained.join("."))
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.num_segments == 0 {
            return Ok(());
        }

        f.write_str("v")?;
        for (idx, segment) in self.segments().iter().enumerate() {
            if idx > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        if !self.pre.is_empty() {
            write!(f, "-{}", self.pre)?;
        }
        if self.is_k0s || !self.meta.is_empty() {
            f.write_str("+")?;
        }
        if self.is_k0s {
            write!(f, "k0s.{}", self.k0s)?;
            if !self.meta.is_empty() {
                f.write_str(".")?;
            }
        }
        f.write_str(&self.meta)
    }
}

impl FromStr for Version {
    type Err = InvalidVersion;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Version::parse(input)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments
            .cmp(&other.segments)
            .then_with(|| match (self.pre.is_empty(), other.pre.is_empty()) {
                // stable beats prerelease
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                _ => self.pre.cmp(&other.pre),
            })
            .then_with(|| self.is_k0s.cmp(&other.is_k0s))
            .then_with(|| self.k0s.cmp(&other.k0s))
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

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        if text.is_empty() {
            return Ok(Version::default());
        }
        text.parse().map_err(de::Error::custom)
    }
}
