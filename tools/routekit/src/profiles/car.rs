//! Car routing profile - Tag semantics for automobile routing
//!
//! The filter is a precedence chain: the first rule that matches decides.

use super::maxspeed::parse_maxspeed_list;
use super::tag_lookup::TagLookup;

/// `access` values that still let a car through
const CAR_ACCESS: &[&str] = &["yes", "permissive", "delivery", "designated", "destination"];

const CAR_HIGHWAYS: &[&str] = &[
    "motorway",
    "trunk",
    "primary",
    "secondary",
    "tertiary",
    "unclassified",
    "residential",
    "service",
    "motorway_link",
    "trunk_link",
    "primary_link",
    "secondary_link",
    "tertiary_link",
    "motorway_junction",
    "living_street",
    "track",
    "ferry",
];

const NON_CAR_HIGHWAYS: &[&str] = &[
    "construction",
    "path",
    "footway",
    "cycleway",
    "bridleway",
    "pedestrian",
    "bus_guideway",
    "raceway",
    "escape",
    "steps",
    "proposed",
    "conveying",
];

/// Ways that are routable regardless of their `highway` tag
pub(crate) fn is_junction_or_ferry(tags: &TagLookup<'_>) -> bool {
    tags.has("junction") || tags.is("route", "ferry") || tags.is("ferry", "yes")
}

/// Decide whether a car may use the way.
pub fn allows(_way_id: i64, tags: &TagLookup<'_>) -> bool {
    if is_junction_or_ferry(tags) {
        return true;
    }
    let Some(highway) = tags.get_str("highway") else {
        return false;
    };
    if tags.is("motorcar", "no") || tags.is("motor_vehicle", "no") {
        return false;
    }
    if let Some(access) = tags.get_str("access") {
        if !CAR_ACCESS.contains(&access) {
            return false;
        }
    }
    if CAR_HIGHWAYS.contains(&highway) {
        return true;
    }
    if highway == "bicycle_road" {
        return tags.is("motorcar", "yes");
    }
    if NON_CAR_HIGHWAYS.contains(&highway) {
        return false;
    }
    if tags.is_any("oneway", &["reversible", "alternating"]) {
        return false;
    }
    tags.has("maxspeed")
}

/// Speed by highway class when no `maxspeed` is posted
fn highway_speed(highway: &str) -> Option<u32> {
    let kmh = match highway {
        "motorway" => 90,
        "motorway_link" => 45,
        "trunk" => 85,
        "trunk_link" => 40,
        "primary" => 65,
        "primary_link" => 30,
        "secondary" => 55,
        "secondary_link" => 25,
        "tertiary" => 40,
        "tertiary_link" => 20,
        "unclassified" => 25,
        "residential" => 25,
        "living_street" => 10,
        "service" => 8,
        "track" => 8,
        "ferry" => 5,
        _ => return None,
    };
    Some(kmh)
}

fn surface_cap(surface: &str) -> Option<u32> {
    let kmh = match surface {
        "cement" | "compacted" | "fine_gravel" => 80,
        "paving_stones" | "metal" | "bricks" => 60,
        "grass" | "wood" | "sett" | "grass_paver" | "gravel" | "unpaved" | "ground" | "dirt"
        | "pebblestone" | "tartan" => 40,
        "cobblestone" | "clay" => 30,
        "earth" | "stone" | "rocky" | "sand" => 20,
        "mud" => 10,
        _ => return None,
    };
    Some(kmh)
}

fn tracktype_cap(tracktype: &str) -> Option<u32> {
    let kmh = match tracktype {
        "grade1" => 60,
        "grade2" => 40,
        "grade3" => 30,
        "grade4" => 25,
        "grade5" => 20,
        _ => return None,
    };
    Some(kmh)
}

fn smoothness_cap(smoothness: &str) -> Option<u32> {
    let kmh = match smoothness {
        "intermediate" => 80,
        "bad" => 40,
        "very_bad" => 20,
        "horrible" => 10,
        "very_horrible" => 5,
        "impassable" => 0,
        _ => return None,
    };
    Some(kmh)
}

/// Base car speed before road-condition caps.
///
/// Posted `maxspeed` wins; otherwise the highway class, then junctions (20),
/// then ferries (5), then 50 km/h.
fn base_speed(tags: &TagLookup<'_>) -> u32 {
    let posted = tags
        .get_str("maxspeed")
        .filter(|v| *v != "unposted")
        .and_then(parse_maxspeed_list);
    if let Some(kmh) = posted {
        return kmh;
    }
    if let Some(kmh) = tags.get_str("highway").and_then(highway_speed) {
        return kmh;
    }
    if tags.has("junction") {
        return 20;
    }
    if tags.is("route", "ferry") || tags.has("ferry") {
        return 5;
    }
    50
}

/// Car speed in km/h, capped by surface, tracktype and smoothness.
///
/// May return 0 (`smoothness=impassable`); the profile compiler demotes such ways.
pub fn speed(_way_id: i64, tags: &TagLookup<'_>) -> u32 {
    let caps = [
        tags.get_str("surface").and_then(surface_cap),
        tags.get_str("tracktype").and_then(tracktype_cap),
        tags.get_str("smoothness").and_then(smoothness_cap),
    ];
    caps.into_iter()
        .flatten()
        .fold(base_speed(tags), u32::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed(pairs: &[(&str, &str)]) -> bool {
        allows(1, &TagLookup::new(pairs))
    }

    fn kmh(pairs: &[(&str, &str)]) -> u32 {
        speed(1, &TagLookup::new(pairs))
    }

    #[test]
    fn test_shortcuts_precede_highway_check() {
        assert!(allowed(&[("junction", "roundabout")]));
        assert!(allowed(&[("route", "ferry")]));
        assert!(allowed(&[("ferry", "yes")]));
        assert!(!allowed(&[("ferry", "ferry")]));
        assert!(!allowed(&[("name", "Nowhere")]));
    }

    #[test]
    fn test_access_restrictions() {
        assert!(!allowed(&[("highway", "primary"), ("motorcar", "no")]));
        assert!(!allowed(&[("highway", "primary"), ("motor_vehicle", "no")]));
        assert!(!allowed(&[("highway", "primary"), ("access", "private")]));
        assert!(allowed(&[("highway", "primary"), ("access", "destination")]));
    }

    #[test]
    fn test_highway_classes() {
        assert!(allowed(&[("highway", "motorway")]));
        assert!(allowed(&[("highway", "track")]));
        assert!(!allowed(&[("highway", "footway")]));
        assert!(!allowed(&[("highway", "steps"), ("maxspeed", "10")]));
        assert!(!allowed(&[("highway", "bicycle_road")]));
        assert!(allowed(&[("highway", "bicycle_road"), ("motorcar", "yes")]));
    }

    #[test]
    fn test_unknown_highway_needs_maxspeed() {
        assert!(!allowed(&[("highway", "road")]));
        assert!(allowed(&[("highway", "road"), ("maxspeed", "30")]));
        assert!(!allowed(&[
            ("highway", "road"),
            ("maxspeed", "30"),
            ("oneway", "alternating")
        ]));
    }

    #[test]
    fn test_speed_precedence() {
        assert_eq!(kmh(&[("highway", "motorway"), ("maxspeed", "120")]), 120);
        assert_eq!(kmh(&[("highway", "motorway")]), 90);
        assert_eq!(kmh(&[("highway", "primary"), ("maxspeed", "70;50")]), 50);
        assert_eq!(kmh(&[("highway", "primary"), ("maxspeed", "signals")]), 65);
        assert_eq!(kmh(&[("junction", "roundabout")]), 20);
        assert_eq!(kmh(&[("route", "ferry")]), 5);
        assert_eq!(kmh(&[("highway", "road")]), 50);
    }

    #[test]
    fn test_road_condition_caps() {
        assert_eq!(kmh(&[("highway", "primary"), ("surface", "gravel")]), 40);
        assert_eq!(kmh(&[("highway", "trunk"), ("tracktype", "grade5")]), 20);
        assert_eq!(kmh(&[("highway", "residential"), ("surface", "asphalt")]), 25);
        assert_eq!(kmh(&[("highway", "track"), ("smoothness", "impassable")]), 0);
    }
}
