use std::path::PathBuf;
use std::time::Duration;

// =============================================================================
// Defaults and limits
// =============================================================================

/// Default base URL for the GitHub REST API.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Default base URL for the k0s documentation site.
pub const DEFAULT_DOCS_BASE_URL: &str = "https://docs.k0sproject.io";

/// Repository the tag and release catalogs are read from.
pub const REPO_OWNER: &str = "k0sproject";
pub const REPO_NAME: &str = "k0s";

/// User agent sent with every outgoing request.
pub const USER_AGENT: &str = "k0s-version";

/// Maximum age of the on-disk version cache before a refresh is attempted.
pub const CACHE_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Overall per-request HTTP timeout.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection establishment timeout.
pub const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Page size used when listing tags.
pub const TAGS_PER_PAGE: u32 = 100;

/// Page size used when listing releases.
pub const RELEASES_PER_PAGE: u32 = 20;

const CACHE_DIR_NAME: &str = "k0s_version";
const CACHE_FILE_NAME: &str = "known_versions.txt";

/// Returns the GitHub API base URL, honoring the GITHUB_API_URL environment
/// variable (useful for tests or GitHub Enterprise).
pub fn github_api_url() -> String {
    base_url_from_env(std::env::var("GITHUB_API_URL").ok(), DEFAULT_GITHUB_API_URL)
}

/// Returns the bearer token from GITHUB_TOKEN, if set and non-empty.
pub fn github_token() -> Option<String> {
    std::env::var("GITHUB_TOKEN")
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Returns the documentation base URL, honoring K0S_VERSION_DOCS_BASE_URL.
pub fn docs_base_url() -> String {
    base_url_from_env(
        std::env::var("K0S_VERSION_DOCS_BASE_URL").ok(),
        DEFAULT_DOCS_BASE_URL,
    )
}

/// Returns the path of the known-versions cache file.
/// Uses $XDG_CACHE_HOME/k0s_version/known_versions.txt when XDG_CACHE_HOME is
/// set, otherwise the platform cache directory.
pub fn cache_file() -> Option<PathBuf> {
    cache_file_with_env(std::env::var("XDG_CACHE_HOME").ok(), dirs::cache_dir())
}

/// Builds a reqwest client with the shared timeouts and user agent applied.
pub(crate) fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(HTTP_TIMEOUT)
        .connect_timeout(HTTP_CONNECT_TIMEOUT)
        .build()
}

fn base_url_from_env(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn cache_file_with_env(
    xdg_cache_home: Option<String>,
    cache_dir: Option<PathBuf>,
) -> Option<PathBuf> {
    let base = xdg_cache_home
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or(cache_dir)?;

    Some(base.join(CACHE_DIR_NAME).join(CACHE_FILE_NAME))
}
