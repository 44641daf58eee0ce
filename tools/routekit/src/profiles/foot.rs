//! Pedestrian routing profile - Tag semantics for walking

use super::bike::NON_MOTOR_ACCESS;
use super::car::is_junction_or_ferry;
use super::tag_lookup::TagLookup;

const FOOT_HIGHWAYS: &[&str] = &[
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
    "path",
    "footway",
    "cycleway",
    "bridleway",
    "pedestrian",
    "escape",
    "steps",
    "crossing",
    "escalator",
    "elevator",
    "platform",
    "ferry",
];

const NON_FOOT_HIGHWAYS: &[&str] = &[
    "motorway",
    "motorway_link",
    "motorway_junction",
    "trunk",
    "trunk_link",
    "primary",
    "primary_link",
    "construction",
    "bus_guideway",
    "raceway",
    "proposed",
    "conveying",
];

const STOP_PUBLIC_TRANSPORT: &[&str] = &["stop_position", "platform", "stop_area", "station"];
const STOP_RAILWAY: &[&str] = &["halt", "platform", "subway_entrance", "station", "tram_stop"];

pub const WALKING_SPEED: u32 = 5;

/// Decide whether a pedestrian may use the way.
pub fn allows(_way_id: i64, tags: &TagLookup<'_>) -> bool {
    if is_junction_or_ferry(tags) {
        return true;
    }
    if tags.is_any("public_transport", STOP_PUBLIC_TRANSPORT) || tags.is_any("railway", STOP_RAILWAY)
    {
        return true;
    }
    let Some(highway) = tags.get_str("highway") else {
        return false;
    };
    if let Some(access) = tags.get_str("access") {
        if !NON_MOTOR_ACCESS.contains(&access) {
            return false;
        }
    }
    if tags.is("crossing", "no") {
        return false;
    }
    if FOOT_HIGHWAYS.contains(&highway) {
        return true;
    }
    if NON_FOOT_HIGHWAYS.contains(&highway) {
        return false;
    }
    false
}

/// Walking speed in km/h, slowed down on loose or soft surfaces.
pub fn speed(_way_id: i64, tags: &TagLookup<'_>) -> u32 {
    let multiplier = match tags.get_str("surface") {
        Some("fine_gravel" | "gravel" | "pebblestone") => 0.75,
        Some("mud" | "sand") => 0.5,
        _ => 1.0,
    };
    (f64::from(WALKING_SPEED) * multiplier) as u32
}
