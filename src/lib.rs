//! k0s version handling
//!
//! k0s versions extend Semantic Versioning 2.0 with a `+k0s.N` build tag
//! that participates in precedence. This crate parses and compares such
//! versions, evaluates constraint expressions over them, tracks the set of
//! published releases, and plans stepped upgrade paths.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  TagSource  │────▶│   Catalog   │◀────│ CacheFile   │
//! │  (GitHub)   │     │  (loader)   │     │ (text file) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                           │
//!               ┌───────────┼───────────┐
//!               ▼           ▼           ▼
//!         ┌──────────┐ ┌──────────┐ ┌──────────┐
//!         │  latest  │ │ upgrade  │ │   CLI    │
//!         │ resolver │ │ planner  │ │ k0s_sort │
//!         └──────────┘ └──────────┘ └──────────┘
//! ```
//!
//! # Modules
//!
//! - [`version`]: the [`Version`] value, parsing, precedence, rendering
//! - [`constraint`]: constraint expressions such as `>= 1.23, < 1.26`
//! - [`delta`]: classification of the difference between two versions
//! - [`majorminor`]: the `(major, minor)` release track identity
//! - [`collection`]: sortable version sequences
//! - [`catalog`]: the known-versions catalog, its cache and tag source
//! - [`latest`]: latest-version resolution with a docs-site fallback
//! - [`release`]: GitHub release listings with assets
//! - [`upgrade`]: stepped upgrade path planning
//! - [`error`]: error types
//!
//! # Example
//!
//! ```
//! use k0s_version::{Constraint, Version};
//!
//! let version: Version = "v1.23.3+k0s.1".parse()?;
//! assert!(version.is_k0s());
//!
//! let constraint: Constraint = ">= 1.23".parse()?;
//! assert!(constraint.matches(&version));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod catalog;
pub mod collection;
pub mod config;
pub mod constraint;
pub mod delta;
pub mod error;
pub mod latest;
pub mod majorminor;
pub mod release;
pub mod upgrade;
pub mod version;

pub use catalog::github::{GitHubTags, TagSource};
pub use catalog::{Catalog, LoadOutcome};
pub use collection::Collection;
pub use constraint::Constraint;
pub use delta::Delta;
pub use error::{
    CacheError, CatalogError, ConstraintError, InvalidVersion, LatestError, ReleaseError,
    TagSourceError, UpgradeError,
};
pub use latest::DocsClient;
pub use majorminor::MajorMinor;
pub use release::{Asset, Release, ReleaseClient};
pub use version::Version;
