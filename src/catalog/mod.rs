//! The catalog of known k0s versions
//!
//! The catalog merges the on-disk cache with fresh tags from the tag source.
//! A load follows a fixed sequence: read the cache, decide staleness, fetch
//! the delta since the cache modification time, merge, and persist when
//! anything changed. A fetch failure over a populated cache degrades to the
//! cached data with the `used_fallback` flag raised; over an empty cache, or
//! when a refresh was forced, it is an error.

pub mod cache;
pub mod github;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use crate::collection::Collection;
use crate::config;
use crate::error::{CacheError, CatalogError};
use crate::version::Version;

use self::cache::CacheFile;
use self::github::TagSource;

/// Result of a catalog load.
#[derive(Debug)]
pub struct LoadOutcome {
    pub versions: Collection,
    /// True when the tag source failed and stale cached data was served.
    pub used_fallback: bool,
}

/// Loader combining the cache file with a [`TagSource`].
pub struct Catalog {
    cache: CacheFile,
    source: Box<dyn TagSource>,
    max_age: Duration,
}

impl Catalog {
    /// Uses the default cache location and [`config::CACHE_MAX_AGE`].
    pub fn new(source: Box<dyn TagSource>) -> Result<Self, CacheError> {
        Ok(Self {
            cache: CacheFile::default_location()?,
            source,
            max_age: config::CACHE_MAX_AGE,
        })
    }

    /// Uses an explicit cache file path instead of the platform default.
    pub fn at(path: impl Into<PathBuf>, source: Box<dyn TagSource>) -> Self {
        Self {
            cache: CacheFile::at(path),
            source,
            max_age: config::CACHE_MAX_AGE,
        }
    }

    /// Overrides the freshness window.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Returns all known versions, sorted ascending by precedence. A `force`
    /// load always hits the tag source and fails rather than falling back.
    pub async fn load(&self, force: bool) -> Result<LoadOutcome, CatalogError> {
        // a present-but-empty cache is a miss, but keeps its modification
        // time so the fetch below stays conditional
        let (cached, modified, cache_missed) = match self.cache.read() {
            Ok((versions, modified)) => (versions, Some(modified), false),
            Err(CacheError::Miss { modified }) => (Collection::new(), modified, true),
            Err(err) => return Err(err.into()),
        };

        let mut known: BTreeMap<String, Version> = cached
            .iter()
            .map(|version| (version.to_string(), version.clone()))
            .collect();

        let age_expired = modified.is_some_and(|at| {
            SystemTime::now()
                .duration_since(at)
                .is_ok_and(|age| age > self.max_age)
        });

        if !(force || cache_missed || age_expired) {
            return Ok(LoadOutcome {
                versions: collection_from_map(known),
                used_fallback: false,
            });
        }

        let tags = match self.source.tags_since(modified).await {
            Ok(tags) => tags,
            Err(err) => {
                if force || known.is_empty() {
                    return Err(err.into());
                }
                warn!(%err, "tag source unavailable, serving stale cache");
                return Ok(LoadOutcome {
                    versions: collection_from_map(known),
                    used_fallback: true,
                });
            }
        };

        let mut updated = false;
        for tag in tags {
            let Ok(version) = Version::parse(&tag) else {
                debug!(%tag, "skipping unparseable tag");
                continue;
            };
            let key = version.to_string();
            if !known.contains_key(&key) {
                known.insert(key, version);
                updated = true;
            }
        }

        let versions = collection_from_map(known);
        if updated || cache_missed || force {
            self.cache.write(&versions)?;
        }

        Ok(LoadOutcome {
            versions,
            used_fallback: false,
        })
    }
}

fn collection_from_map(known: BTreeMap<String, Version>) -> Collection {
    let mut versions: Collection = known.into_values().collect();
    versions.sort();
    versions
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::github::MockTagSource;
    use std::fs;
    use tempfile::TempDir;

    const FOREVER: Duration = Duration::from_secs(60 * 60 * 24 * 365);

    fn catalog_in(dir: &TempDir, source: MockTagSource) -> Catalog {
        Catalog::at(dir.path().join("known_versions.txt"), Box::new(source)).with_max_age(FOREVER)
    }

    fn seed_cache(dir: &TempDir, lines: &str) {
        fs::write(dir.path().join("known_versions.txt"), lines).unwrap();
    }

    fn rendered(versions: &Collection) -> Vec<String> {
        versions.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn fresh_cache_is_served_without_a_fetch() {
        let dir = TempDir::new().unwrap();
        seed_cache(&dir, "v1.1.0\nv1.0.0\n");

        let mut source = MockTagSource::new();
        source.expect_tags_since().times(0);

        let outcome = catalog_in(&dir, source).load(false).await.unwrap();
        assert!(!outcome.used_fallback);
        assert_eq!(rendered(&outcome.versions), ["v1.0.0", "v1.1.0"]);
    }

    #[tokio::test]
    async fn stale_cache_merges_the_fetched_delta_and_persists() {
        let dir = TempDir::new().unwrap();
        seed_cache(&dir, "v1.0.0\n");

        let mut source = MockTagSource::new();
        source
            .expect_tags_since()
            .withf(|since| since.is_some())
            .returning(|_| Ok(vec!["v1.1.0".to_string(), "not-a-version".to_string()]));

        let catalog = catalog_in(&dir, source).with_max_age(Duration::ZERO);
        let outcome = catalog.load(false).await.unwrap();

        assert!(!outcome.used_fallback);
        assert_eq!(rendered(&outcome.versions), ["v1.0.0", "v1.1.0"]);

        let persisted = fs::read_to_string(dir.path().join("known_versions.txt")).unwrap();
        assert_eq!(persisted, "v1.1.0\nv1.0.0\n");
    }

    #[tokio::test]
    async fn unchanged_delta_leaves_the_cache_file_alone() {
        let dir = TempDir::new().unwrap();
        seed_cache(&dir, "v1.1.0\nv1.0.0\n");
        let before = fs::metadata(dir.path().join("known_versions.txt"))
            .unwrap()
            .modified()
            .unwrap();

        let mut source = MockTagSource::new();
        source
            .expect_tags_since()
            .returning(|_| Ok(vec!["v1.1.0".to_string()]));

        let catalog = catalog_in(&dir, source).with_max_age(Duration::ZERO);
        let outcome = catalog.load(false).await.unwrap();
        assert_eq!(outcome.versions.len(), 2);

        let after = fs::metadata(dir.path().join("known_versions.txt"))
            .unwrap()
            .modified()
            .unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn an_empty_cache_file_still_fetches_conditionally() {
        let dir = TempDir::new().unwrap();
        seed_cache(&dir, "# nothing parseable yet\n");
        let expected = fs::metadata(dir.path().join("known_versions.txt"))
            .unwrap()
            .modified()
            .unwrap();

        let mut source = MockTagSource::new();
        source
            .expect_tags_since()
            .withf(move |since| *since == Some(expected))
            .returning(|_| Ok(vec!["v1.0.0".to_string()]));

        let outcome = catalog_in(&dir, source).load(false).await.unwrap();
        assert!(!outcome.used_fallback);
        assert_eq!(rendered(&outcome.versions), ["v1.0.0"]);

        let persisted = fs::read_to_string(dir.path().join("known_versions.txt")).unwrap();
        assert_eq!(persisted, "v1.0.0\n");
    }

    #[tokio::test]
    async fn missing_cache_fetches_everything_and_persists() {
        let dir = TempDir::new().unwrap();

        let mut source = MockTagSource::new();
        source
            .expect_tags_since()
            .withf(|since| since.is_none())
            .returning(|_| Ok(vec!["v1.26.0+k0s.0".to_string(), "v1.25.0+k0s.0".to_string()]));

        let outcome = catalog_in(&dir, source).load(false).await.unwrap();
        assert!(!outcome.used_fallback);
        assert_eq!(
            rendered(&outcome.versions),
            ["v1.25.0+k0s.0", "v1.26.0+k0s.0"]
        );

        let persisted = fs::read_to_string(dir.path().join("known_versions.txt")).unwrap();
        assert_eq!(persisted, "v1.26.0+k0s.0\nv1.25.0+k0s.0\n");
    }

    #[tokio::test]
    async fn fetch_failure_over_a_populated_cache_degrades_to_fallback() {
        let dir = TempDir::new().unwrap();
        seed_cache(&dir, "v1.0.0\n");

        let mut source = MockTagSource::new();
        source.expect_tags_since().returning(|_| {
            Err(crate::error::TagSourceError::Status {
                url: "http://example.invalid".to_string(),
                status: 500,
                body: String::new(),
            })
        });

        let catalog = catalog_in(&dir, source).with_max_age(Duration::ZERO);
        let outcome = catalog.load(false).await.unwrap();

        assert!(outcome.used_fallback);
        assert_eq!(rendered(&outcome.versions), ["v1.0.0"]);
    }

    #[tokio::test]
    async fn fetch_failure_without_a_cache_is_an_error() {
        let dir = TempDir::new().unwrap();

        let mut source = MockTagSource::new();
        source.expect_tags_since().returning(|_| {
            Err(crate::error::TagSourceError::Status {
                url: "http://example.invalid".to_string(),
                status: 500,
                body: String::new(),
            })
        });

        let result = catalog_in(&dir, source).load(false).await;
        assert!(matches!(result, Err(CatalogError::TagSource(_))));
    }

    #[tokio::test]
    async fn forced_refresh_fails_rather_than_falling_back() {
        let dir = TempDir::new().unwrap();
        seed_cache(&dir, "v1.0.0\n");

        let mut source = MockTagSource::new();
        source.expect_tags_since().returning(|_| {
            Err(crate::error::TagSourceError::Status {
                url: "http://example.invalid".to_string(),
                status: 502,
                body: String::new(),
            })
        });

        let result = catalog_in(&dir, source).load(true).await;
        assert!(matches!(result, Err(CatalogError::TagSource(_))));
    }

    #[tokio::test]
    async fn forced_refresh_ignores_cache_freshness() {
        let dir = TempDir::new().unwrap();
        seed_cache(&dir, "v1.0.0\n");

        let mut source = MockTagSource::new();
        source
            .expect_tags_since()
            .times(1)
            .returning(|_| Ok(vec!["v1.1.0".to_string()]));

        // max_age is effectively infinite, so only force triggers the fetch
        let outcome = catalog_in(&dir, source).load(true).await.unwrap();
        assert_eq!(rendered(&outcome.versions), ["v1.0.0", "v1.1.0"]);
    }
}
