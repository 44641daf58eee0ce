//! Hierarchy cache key - content fingerprint of a compiled profile
//!
//! The hierarchy for a map depends only on the allowed ways, their speeds, the
//! left-turn flag and the transport mode. Hashing a canonical serialization of
//! those lets an existing `.ch` file be reused.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::profile::{CompiledProfile, Metric};

/// Hex SHA-256 over the sorted profile contents.
///
/// Ids are fed as `-<id>`, speeds as `-<speed>-<id>`, followed by
/// `-<prevent_left_turns>` and `-<mode code>`.
pub fn derive_hash(profile: &CompiledProfile) -> String {
    let mut hasher = Sha256::new();

    let mut ids: Vec<i64> = profile.allowed_way_ids.iter().copied().collect();
    ids.sort_unstable();
    for id in ids {
        hasher.update(format!("-{id}"));
    }

    let mut speeds: Vec<(i64, u32)> = profile
        .way_speeds
        .iter()
        .map(|(&id, &speed)| (id, speed))
        .collect();
    speeds.sort_unstable_by_key(|&(id, _)| id);
    for (id, speed) in speeds {
        hasher.update(format!("-{speed}-{id}"));
    }

    hasher.update(format!("-{}", profile.prevent_left_turns));
    hasher.update(format!("-{}", profile.transport_mode.code()));

    hex::encode(hasher.finalize())
}

/// `<map>_<profile>_<distance|duration>_<hash>.ch`, next to the map file.
pub fn hierarchy_file_name(map_file: &Path, profile: &CompiledProfile, metric: Metric) -> PathBuf {
    let mut name = map_file.as_os_str().to_os_string();
    name.push(format!(
        "_{}_{}_{}.ch",
        profile.name,
        metric.as_str(),
        derive_hash(profile)
    ));
    PathBuf::from(name)
}
