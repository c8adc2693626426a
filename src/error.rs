//! Error types for parsing, cache, tag source and planner operations

use thiserror::Error;

/// Returned when a version string does not conform to the k0s version grammar.
///
/// Carries the offending input so callers can report it verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid version {input:?}: {reason}")]
pub struct InvalidVersion {
    pub(crate) input: String,
    pub(crate) reason: String,
}

impl InvalidVersion {
    pub(crate) fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// The input string that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

#[derive(Debug, Error)]
pub enum ConstraintError {
    #[error("empty constraint segment in {0:?}")]
    EmptySegment(String),

    #[error("unknown operator {0:?}")]
    UnknownOperator(String),

    #[error(transparent)]
    Version(#[from] InvalidVersion),
}

#[derive(Debug, Error)]
pub enum CacheError {
    /// No cached version data is available. Distinct from an I/O failure so
    /// the loader can treat it as "stale" rather than fatal. A cache file
    /// that exists but holds no parseable versions still carries its
    /// modification time, so conditional fetches keep working.
    #[error("no cached versions available")]
    Miss {
        modified: Option<std::time::SystemTime>,
    },

    #[error("cache directory could not be determined")]
    NoCacheDir,

    #[error("cache i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum TagSourceError {
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request to {url} failed: status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    TagSource(#[from] TagSourceError),
}

#[derive(Debug, Error)]
pub enum LatestError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("documentation endpoint lookup failed: {0}")]
    Docs(#[source] TagSourceError),

    #[error(transparent)]
    Version(#[from] InvalidVersion),

    #[error("no matching versions available")]
    NoVersions,
}

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error(transparent)]
    Http(#[from] TagSourceError),

    #[error("no matching releases available")]
    NoReleases,
}

#[derive(Debug, Error)]
pub enum UpgradeError {
    #[error("target version {target} is older than {current}")]
    Downgrade { current: String, target: String },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
