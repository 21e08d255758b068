//! Comparison semantics between the tracking spreadsheet and the two
//! authoritative inventories.
//!
//! The engine is a pure function of its three input lists. It performs no IO,
//! keeps no state between calls, and treats every list it receives as a
//! complete snapshot of its source.

use std::collections::BTreeSet;

use tracing::{debug, instrument};

use crate::index::{ExactMatch, InventoryIndex, NameMatcher};
use crate::model::{DeviceAssessment, DeviceName, DeviceRecord, ReconciliationResult, TrackedDevice};

/// Reconciles the tracked devices against the cloud and directory inventories
/// using exact name equality.
pub fn reconcile(
    tracked: &[TrackedDevice],
    cloud: &[DeviceRecord],
    directory: &[DeviceRecord],
) -> ReconciliationResult {
    reconcile_with(ExactMatch, tracked, cloud, directory)
}

/// Reconciles using the provided name matcher for every membership test.
#[instrument(
    level = "debug",
    skip_all,
    fields(tracked = tracked.len(), cloud = cloud.len(), directory = directory.len())
)]
pub fn reconcile_with<M: NameMatcher + Clone>(
    matcher: M,
    tracked: &[TrackedDevice],
    cloud: &[DeviceRecord],
    directory: &[DeviceRecord],
) -> ReconciliationResult {
    let cloud_index = InventoryIndex::build_with(matcher.clone(), cloud);
    let directory_index = InventoryIndex::build_with(matcher.clone(), directory);

    let mut result = ReconciliationResult::default();

    for device in tracked {
        let in_domain = directory_index.contains(&device.name);
        let in_cloud = cloud_index.contains(&device.name);

        // Both flags are evaluated independently; neither check gates the other.
        if !in_domain {
            result.missing_from_directory.insert(device.name.clone());
        }
        if !in_cloud {
            result.missing_from_cloud.insert(device.name.clone());
        }

        result.per_device.push(DeviceAssessment {
            device: device.clone(),
            in_domain,
            in_cloud,
        });
    }

    result.missing_from_both = result
        .missing_from_cloud
        .intersection(&result.missing_from_directory)
        .cloned()
        .collect();

    let tracked_index = InventoryIndex::from_names(
        matcher,
        tracked.iter().map(|device| device.name.as_str()),
    );
    result.untracked_in_cloud = untracked(&cloud_index, &tracked_index);
    result.untracked_in_directory = untracked(&directory_index, &tracked_index);

    debug!(
        missing_from_cloud = result.missing_from_cloud.len(),
        missing_from_directory = result.missing_from_directory.len(),
        missing_from_both = result.missing_from_both.len(),
        untracked_in_cloud = result.untracked_in_cloud.len(),
        untracked_in_directory = result.untracked_in_directory.len(),
        "reconciliation computed"
    );

    result
}

fn untracked<M: NameMatcher>(
    source: &InventoryIndex<M>,
    tracked: &InventoryIndex<M>,
) -> BTreeSet<DeviceName> {
    source
        .names()
        .filter(|name| !tracked.contains(name))
        .cloned()
        .collect()
}
