//! Truck routing profile
//!
//! Dimensional gating on top of the car rules. A restriction that cannot be
//! parsed is logged and ignored, so the way stays routable.

use tracing::warn;

use super::car;
use super::tag_lookup::TagLookup;
use crate::measure::{is_unrestricted, parse_meters, parse_tonnes, ParseError};

/// Vehicle dimensions in meters and weight in tonnes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruckLimits {
    pub height: f64,
    pub width: f64,
    pub length: f64,
    pub weight: f64,
}

impl TruckLimits {
    /// Name of the first dimension that is not a positive finite number
    pub fn invalid_dimension(&self) -> Option<&'static str> {
        [
            ("height", self.height),
            ("width", self.width),
            ("length", self.length),
            ("weight", self.weight),
        ]
        .into_iter()
        .find(|&(_, value)| !(value.is_finite() && value > 0.0))
        .map(|(name, _)| name)
    }
}

impl Default for TruckLimits {
    /// A typical 40 t articulated lorry
    fn default() -> Self {
        Self {
            height: 4.0,
            width: 2.55,
            length: 16.5,
            weight: 40.0,
        }
    }
}

/// Parse one restriction tag, `None` when absent, unrestricted, zero or malformed.
fn restriction(
    way_id: i64,
    tags: &TagLookup<'_>,
    key: &str,
    parse: fn(&str) -> Result<f64, ParseError>,
) -> Option<f64> {
    let value = tags.get_str(key)?;
    if is_unrestricted(value) {
        return None;
    }
    match parse(value) {
        Ok(limit) if limit > 0.0 => Some(limit),
        Ok(_) => None,
        Err(err) => {
            warn!(way_id, tag = key, value, error = %err, "ignoring unparseable restriction");
            None
        }
    }
}

/// Smallest of the signed and the `:physical` limit.
fn dimension_limit(way_id: i64, tags: &TagLookup<'_>, key: &str) -> Option<f64> {
    let physical = format!("{key}:physical");
    let signed = restriction(way_id, tags, key, parse_meters);
    let physical = restriction(way_id, tags, &physical, parse_meters);
    match (signed, physical) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Decide whether a truck with `limits` may use the way.
pub fn allows(way_id: i64, tags: &TagLookup<'_>, limits: &TruckLimits) -> bool {
    let exceeds = |limit: Option<f64>, value: f64| limit.is_some_and(|limit| value > limit);

    if exceeds(dimension_limit(way_id, tags, "maxheight"), limits.height)
        || exceeds(dimension_limit(way_id, tags, "maxwidth"), limits.width)
        || exceeds(restriction(way_id, tags, "maxlength", parse_meters), limits.length)
        || exceeds(restriction(way_id, tags, "maxweight", parse_tonnes), limits.weight)
    {
        return false;
    }
    car::allows(way_id, tags)
}

/// Car speed clamped to the truck's top speed.
pub fn speed(way_id: i64, tags: &TagLookup<'_>, max_speed: u32) -> u32 {
    car::speed(way_id, tags).min(max_speed)
}
