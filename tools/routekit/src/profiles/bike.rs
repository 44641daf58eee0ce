//! Bicycle routing profile

use super::car::{self, is_junction_or_ferry};
use super::tag_lookup::TagLookup;

/// `access` values that still let a bicycle through
pub(crate) const NON_MOTOR_ACCESS: &[&str] = &[
    "yes",
    "permissive",
    "delivery",
    "designated",
    "destination",
    "agricultural",
    "forestry",
    "public",
];

const BIKE_HIGHWAYS: &[&str] = &[
    "secondary",
    "tertiary",
    "unclassified",
    "residential",
    "service",
    "secondary_link",
    "tertiary_link",
    "living_street",
    "track",
    "bicycle_road",
    "primary",
    "primary_link",
    "path",
    "footway",
    "cycleway",
    "bridleway",
    "pedestrian",
    "crossing",
    "escape",
    "steps",
    "ferry",
];

const NON_BIKE_HIGHWAYS: &[&str] = &[
    "motorway",
    "motorway_link",
    "motorway_junction",
    "trunk",
    "trunk_link",
    "construction",
    "bus_guideway",
    "raceway",
    "conveying",
];

const RAIL: &[&str] = &["train", "railway", "subway", "light_rail", "monorail", "tram"];

/// Top speed of the bike model
pub const MAX_BIKE_SPEED: u32 = 25;
const WALKING_SPEED: u32 = 4;

/// Decide whether a bicycle may use the way.
pub fn allows(_way_id: i64, tags: &TagLookup<'_>) -> bool {
    if is_junction_or_ferry(tags) {
        return true;
    }
    let Some(highway) = tags.get_str("highway") else {
        return false;
    };
    if highway == "proposed" {
        return false;
    }
    if let Some(access) = tags.get_str("access") {
        if !NON_MOTOR_ACCESS.contains(&access) {
            return false;
        }
    }
    if tags.is_any("bicycle", &["no", "use_sidepath"]) {
        return false;
    }
    if tags.iter().any(|(key, _)| key.starts_with("cycleway")) {
        return true;
    }
    if BIKE_HIGHWAYS.contains(&highway) {
        return true;
    }
    if NON_BIKE_HIGHWAYS.contains(&highway) {
        return false;
    }
    false
}

/// Bicycle speed in km/h.
///
/// Platforms are walked, rail-bound and parking ways have fixed speeds; everything
/// else follows the car speed capped at [`MAX_BIKE_SPEED`].
pub fn speed(way_id: i64, tags: &TagLookup<'_>) -> u32 {
    if tags.is("bridge", "movable") || tags.is("route", "ferry") {
        return 5;
    }
    if tags.is("public_transport", "platform") || tags.is("railway", "platform") {
        return WALKING_SPEED;
    }
    if tags.is_any("railway", RAIL) {
        return 10;
    }
    if tags.is_any("amenity", &["parking", "parking_entrance"]) {
        return 10;
    }
    if tags.is_any("highway", &["track", "path"]) {
        return 12;
    }
    car::speed(way_id, tags).min(MAX_BIKE_SPEED)
}
