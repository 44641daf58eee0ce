//! Profile compilation - one pass over the ways of a map

use std::time::Instant;
use tracing::{debug, info};

use crate::ingest::{OsmSource, SourceError};
use crate::profile::{CompiledProfile, Profile};
use crate::profiles::TagLookup;

/// Run `profile` over every way of `source`.
///
/// Allowed ways get their speed recorded. A way whose speed comes out as 0 is
/// dropped from the allowed set and recorded with speed 1.
pub fn compile_profile(
    source: &dyn OsmSource,
    profile: &Profile,
) -> Result<CompiledProfile, SourceError> {
    let start = Instant::now();
    let mut compiled = CompiledProfile::empty(profile);
    let mut ways_seen = 0usize;
    let mut demoted = 0usize;

    source.for_each_way(&mut |way| {
        ways_seen += 1;
        let pairs = way.tag_pairs();
        let tags = TagLookup::new(&pairs);

        if !profile.rules.allows(way.id, &tags) {
            return;
        }

        let speed = profile.rules.speed(way.id, &tags);
        if speed == 0 {
            debug!(way_id = way.id, "zero speed, way not routable");
            compiled.way_speeds.insert(way.id, 1);
            demoted += 1;
            return;
        }

        compiled.allowed_way_ids.insert(way.id);
        compiled.way_speeds.insert(way.id, speed);
    })?;

    info!(
        profile = %profile.name,
        map = %source.path().display(),
        ways = ways_seen,
        allowed = compiled.allowed_way_ids.len(),
        demoted,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "compiled profile"
    );

    Ok(compiled)
}
