//! Stepped upgrade path planning
//!
//! k0s supports upgrading one minor release at a time, so the path from
//! `v1.24.x` to `v1.26.y` goes through the newest stable patch of every
//! minor in between. The planner walks the catalog's minor tracks, picks
//! each tip, and finishes at the target.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};

use crate::catalog::Catalog;
use crate::collection::Collection;
use crate::error::UpgradeError;
use crate::majorminor::MajorMinor;
use crate::version::Version;

/// Computes the stepped upgrade path from `current` to `target` over the
/// known versions.
///
/// The result is strictly increasing, contains the newest stable version of
/// every minor track between the two, and ends with the target. It is empty
/// when there is nothing to do. A target below the current version is
/// refused.
pub fn plan(
    current: &Version,
    target: &Version,
    known: &Collection,
) -> Result<Collection, UpgradeError> {
    if target < current {
        return Err(UpgradeError::Downgrade {
            current: current.to_string(),
            target: target.to_string(),
        });
    }

    // newest stable version per minor track; prereleases never become tips
    let mut tips: BTreeMap<MajorMinor, Version> = BTreeMap::new();
    for candidate in known {
        if candidate.is_prerelease() {
            continue;
        }
        match tips.entry(MajorMinor::from(candidate)) {
            Entry::Occupied(mut entry) => {
                if *entry.get() < *candidate {
                    entry.insert(candidate.clone());
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(candidate.clone());
            }
        }
    }

    let start_track = MajorMinor::from(current);
    let target_track = MajorMinor::from(target);

    let mut cursor = current.clone();
    let mut path: Vec<Version> = Vec::new();

    for (track, tip) in tips.range(start_track..=target_track) {
        if target.is_prerelease() {
            // a prerelease target may precede its own track's tip
            if *track == target_track && tip > target {
                continue;
            }
        } else if tip > target {
            continue;
        }
        if *tip <= cursor {
            continue;
        }
        path.push(tip.clone());
        cursor = tip.clone();
    }

    let target_canonical = target.to_string();
    let needs_target = path
        .last()
        .map_or(true, |last| last.to_string() != target_canonical);
    if needs_target && (*target > cursor || target.is_prerelease()) {
        path.push(target.clone());
    }

    let mut seen = HashSet::new();
    Ok(path
        .into_iter()
        .filter(|step| step > current)
        .filter(|step| seen.insert(step.to_string()))
        .collect())
}

/// Loads the catalog and plans the upgrade path over it.
pub async fn upgrade_path(
    catalog: &Catalog,
    current: &Version,
    target: &Version,
) -> Result<Collection, UpgradeError> {
    let outcome = catalog.load(false).await?;
    plan(current, target, &outcome.versions)
}
