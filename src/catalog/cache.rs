//! The on-disk known-versions cache
//!
//! One canonical version string per line, newest first. `#`-prefixed lines
//! and blank lines are comments; unparseable lines are skipped on read. The
//! file is rewritten wholesale, never patched.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::collection::Collection;
use crate::config;
use crate::error::CacheError;

/// Handle to the cache file location.
#[derive(Debug, Clone)]
pub struct CacheFile {
    path: PathBuf,
}

impl CacheFile {
    /// Uses the platform default location, honoring `XDG_CACHE_HOME`.
    pub fn default_location() -> Result<Self, CacheError> {
        let path = config::cache_file().ok_or(CacheError::NoCacheDir)?;
        Ok(Self { path })
    }

    /// Uses an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the cached versions and the file's modification time.
    /// Returns [`CacheError::Miss`] when the file is absent or holds no
    /// parseable versions; in the latter case the miss still carries the
    /// file's modification time.
    pub fn read(&self) -> Result<(Collection, SystemTime), CacheError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::Miss { modified: None })
            }
            Err(err) => return Err(err.into()),
        };
        let modified = fs::metadata(&self.path)?.modified()?;

        let versions = Collection::parse_lines_lossy(&text);
        if versions.is_empty() {
            return Err(CacheError::Miss {
                modified: Some(modified),
            });
        }

        debug!(count = versions.len(), path = %self.path.display(), "read version cache");
        Ok((versions, modified))
    }

    /// Persists the collection, sorted newest first and deduplicated. The
    /// content is staged to a sibling file and moved into place so readers
    /// never observe a partial write.
    pub fn write(&self, versions: &Collection) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut ordered: Collection = versions.iter().cloned().collect();
        ordered.sort();
        let mut ordered: Collection = ordered.into_iter().rev().collect();
        ordered.dedup_by_canonical();

        let mut contents = String::new();
        for version in &ordered {
            contents.push_str(&version.to_string());
            contents.push('\n');
        }

        let staging = self.path.with_extension("tmp");
        fs::write(&staging, contents)?;
        if let Err(err) = fs::rename(&staging, &self.path) {
            warn!(path = %self.path.display(), %err, "staged cache rename failed");
            let _ = fs::remove_file(&staging);
            return Err(err.into());
        }

        debug!(count = ordered.len(), path = %self.path.display(), "wrote version cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cache_in(dir: &TempDir) -> CacheFile {
        CacheFile::at(dir.path().join("k0s_version").join("known_versions.txt"))
    }

    #[test]
    fn write_orders_newest_first() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);

        let versions = Collection::from_strings(["v1.0.0+k0s.1", "v1.0.1+k0s.0"]).unwrap();
        cache.write(&versions).unwrap();

        let data = fs::read_to_string(cache.path()).unwrap();
        assert_eq!(data, "v1.0.1+k0s.0\nv1.0.0+k0s.1\n");
    }

    #[test]
    fn write_then_read_round_trips_deduplicated() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);

        let versions =
            Collection::from_strings(["v1.0.0", "v1.2.0", "1.0.0", "v1.1.0"]).unwrap();
        cache.write(&versions).unwrap();

        let (read, modified) = cache.read().unwrap();
        let rendered: Vec<String> = read.iter().map(|v| v.to_string()).collect();
        assert_eq!(rendered, ["v1.2.0", "v1.1.0", "v1.0.0"]);
        assert!(modified.elapsed().unwrap().as_secs() < 60);
    }

    #[test]
    fn read_tolerates_comments_and_garbage_lines() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);

        fs::create_dir_all(cache.path().parent().unwrap()).unwrap();
        fs::write(cache.path(), "v1.0.0+k0s.1\ninvalid\n#comment\n\n").unwrap();

        let (read, _) = cache.read().unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].to_string(), "v1.0.0+k0s.1");
    }

    #[test]
    fn read_reports_a_miss_without_a_time_for_an_absent_file() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);

        assert!(matches!(
            cache.read(),
            Err(CacheError::Miss { modified: None })
        ));
    }

    #[test]
    fn read_reports_a_miss_with_the_time_for_a_file_with_no_versions() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);

        fs::create_dir_all(cache.path().parent().unwrap()).unwrap();
        fs::write(cache.path(), "# only comments here\n").unwrap();
        let expected = fs::metadata(cache.path()).unwrap().modified().unwrap();

        assert!(matches!(
            cache.read(),
            Err(CacheError::Miss {
                modified: Some(modified)
            }) if modified == expected
        ));
    }

    #[test]
    fn write_replaces_existing_contents() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);

        cache
            .write(&Collection::from_strings(["v1.0.0"]).unwrap())
            .unwrap();
        cache
            .write(&Collection::from_strings(["v2.0.0"]).unwrap())
            .unwrap();

        let data = fs::read_to_string(cache.path()).unwrap();
        assert_eq!(data, "v2.0.0\n");
    }
}
