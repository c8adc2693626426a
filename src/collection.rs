//! An ordered sequence of versions

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::error::InvalidVersion;
use crate::version::Version;

/// A sortable list of [`Version`]s.
///
/// Serializes as an array of canonical version strings. Versions differing
/// only in build metadata compare equal but are distinct entries; sorting
/// keeps them all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection(Vec<Version>);

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection by parsing every input string. Fails on the first
    /// invalid version.
    pub fn from_strings<I, S>(versions: I) -> Result<Self, InvalidVersion>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        versions
            .into_iter()
            .map(|s| Version::parse(s.as_ref()))
            .collect()
    }

    /// Parses versions line by line, ignoring blank lines, `#` comments and
    /// lines that fail to parse. This is the tolerant reader used for the
    /// on-disk cache.
    pub fn parse_lines_lossy(text: &str) -> Self {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| Version::parse(line).ok())
            .collect()
    }

    pub fn push(&mut self, version: Version) {
        self.0.push(version);
    }

    /// Sorts in place, ascending by precedence.
    pub fn sort(&mut self) {
        self.0.sort();
    }

    /// Removes entries whose canonical string was already seen, preserving
    /// the order of first occurrences.
    pub fn dedup_by_canonical(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.0.retain(|version| seen.insert(version.to_string()));
    }

    /// The greatest version by precedence, skipping prereleases unless
    /// `allow_prerelease` is set.
    pub fn latest(&self, allow_prerelease: bool) -> Option<&Version> {
        self.0
            .iter()
            .filter(|version| allow_prerelease || !version.is_prerelease())
            .max()
    }

    /// Looks up the entry with the same canonical string, if present.
    pub fn find_exact(&self, version: &Version) -> Option<&Version> {
        let canonical = version.to_string();
        self.0.iter().find(|v| v.to_string() == canonical)
    }
}

impl Deref for Collection {
    type Target = [Version];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<Version> for Collection {
    fn from_iter<I: IntoIterator<Item = Version>>(iter: I) -> Self {
        Collection(iter.into_iter().collect())
    }
}

impl IntoIterator for Collection {
    type Item = Version;
    type IntoIter = std::vec::IntoIter<Version>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Version;
    type IntoIter = std::slice::Iter<'a, Version>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Extend<Version> for Collection {
    fn extend<I: IntoIterator<Item = Version>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}
