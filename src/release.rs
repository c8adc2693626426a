//! GitHub release listings
//!
//! Thin models over the releases endpoint, for callers that want the release
//! page URL or the published assets rather than just a version number.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::{InvalidVersion, ReleaseError, TagSourceError};
use crate::version::Version;

/// A published k0s release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    #[serde(rename = "html_url", default)]
    pub url: String,
    #[serde(rename = "tag_name")]
    pub tag_name: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// A downloadable artifact attached to a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub url: String,
}

impl Release {
    /// Parses the release tag into a [`Version`].
    pub fn version(&self) -> Result<Version, InvalidVersion> {
        Version::parse(&self.tag_name)
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name.trim_start_matches('v'))
    }
}

/// Lists releases of the k0s repository.
pub struct ReleaseClient {
    client: reqwest::Client,
    base_url: String,
}

impl ReleaseClient {
    /// Targets the base URL from the environment (`GITHUB_API_URL`).
    pub fn new() -> Result<Self, TagSourceError> {
        Self::with_base_url(config::github_api_url())
    }

    /// Targets an explicit base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, TagSourceError> {
        Ok(Self {
            client: config::http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The release with the highest version among the most recent page of
    /// releases. Prereleases are skipped unless allowed.
    pub async fn latest_by_prerelease(
        &self,
        allow_prerelease: bool,
    ) -> Result<Release, ReleaseError> {
        let url = format!(
            "{}/repos/{}/{}/releases",
            self.base_url,
            config::REPO_OWNER,
            config::REPO_NAME
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("per_page", config::RELEASES_PER_PAGE.to_string()),
                ("page", "1".to_string()),
            ])
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(TagSourceError::from)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let url = response.url().to_string();
            let body = response.text().await.unwrap_or_default();
            return Err(TagSourceError::Status {
                url,
                status: status.as_u16(),
                body: body.trim().to_string(),
            }
            .into());
        }

        let releases: Vec<Release> = response.json().await.map_err(TagSourceError::from)?;

        releases
            .into_iter()
            .filter(|release| allow_prerelease || !release.prerelease)
            .filter_map(|release| release.version().ok().map(|version| (version, release)))
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, release)| release)
            .ok_or(ReleaseError::NoReleases)
    }

    /// The latest non-prerelease release.
    pub async fn latest_stable(&self) -> Result<Release, ReleaseError> {
        self.latest_by_prerelease(false).await
    }
}
