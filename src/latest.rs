//! Resolution of the latest released version
//!
//! The catalog is authoritative. When it could only serve stale data (the
//! tag source was unreachable), the documentation site's version reference
//! is consulted as a second opinion and the greater of the two answers wins,
//! with ties going to the catalog.

use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::config;
use crate::error::{LatestError, TagSourceError};
use crate::version::Version;

/// Fetches the plain-text version references published on the docs site
/// (`stable.txt` and `latest.txt`).
pub struct DocsClient {
    client: reqwest::Client,
    base_url: String,
}

impl DocsClient {
    /// Targets the base URL from the environment
    /// (`K0S_VERSION_DOCS_BASE_URL`).
    pub fn new() -> Result<Self, TagSourceError> {
        Self::with_base_url(config::docs_base_url())
    }

    /// Targets an explicit base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, TagSourceError> {
        Ok(Self {
            client: config::http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The published latest version; `stable.txt` unless prereleases are
    /// allowed, in which case `latest.txt`.
    pub async fn latest(&self, allow_prerelease: bool) -> Result<Version, LatestError> {
        let path = if allow_prerelease {
            "latest.txt"
        } else {
            "stable.txt"
        };
        let url = format!("{}/{path}", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| LatestError::Docs(err.into()))?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let url = response.url().to_string();
            let body = response.text().await.unwrap_or_default();
            return Err(LatestError::Docs(TagSourceError::Status {
                url,
                status: status.as_u16(),
                body: body.trim().to_string(),
            }));
        }

        let body = response
            .text()
            .await
            .map_err(|err| LatestError::Docs(err.into()))?;
        Ok(Version::parse(body.trim())?)
    }
}

/// Resolves the latest known version, consulting the docs reference when the
/// catalog had to fall back to stale data.
pub async fn latest_by_prerelease(
    catalog: &Catalog,
    docs: &DocsClient,
    allow_prerelease: bool,
) -> Result<Version, LatestError> {
    let (candidate, catalog_err) = match catalog.load(false).await {
        Ok(outcome) => {
            let candidate = outcome.versions.latest(allow_prerelease).cloned();
            if let (Some(version), false) = (&candidate, outcome.used_fallback) {
                return Ok(version.clone());
            }
            (candidate, None)
        }
        Err(err) => {
            warn!(%err, "catalog load failed, trying docs reference");
            (None, Some(err))
        }
    };

    match docs.latest(allow_prerelease).await {
        Ok(published) => Ok(match candidate {
            // the catalog wins ties
            Some(version) if version >= published => version,
            _ => {
                debug!(%published, "docs reference supersedes catalog");
                published
            }
        }),
        Err(docs_err) => {
            if let Some(version) = candidate {
                return Ok(version);
            }
            match catalog_err {
                Some(err) => Err(err.into()),
                None => Err(docs_err),
            }
        }
    }
}

/// Shorthand for the latest stable version.
pub async fn latest_stable(catalog: &Catalog, docs: &DocsClient) -> Result<Version, LatestError> {
    latest_by_prerelease(catalog, docs, false).await
}

/// Shorthand for the latest version including prereleases.
pub async fn latest(catalog: &Catalog, docs: &DocsClient) -> Result<Version, LatestError> {
    latest_by_prerelease(catalog, docs, true).await
}
