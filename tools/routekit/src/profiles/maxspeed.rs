//! `maxspeed` tag interpretation
//!
//! Handles plain numbers, unit suffixes (`mph`, `knots`, `km/h`, `kmh`, `kph`)
//! and the country-coded implicit limits documented on the OSM wiki
//! (`de:rural`, `gb:nsl_single`, ...). All results are km/h.

/// Implicit limits keyed by the full tag value.
///
/// `None` marks values that are known but post no limit (unrestricted motorways,
/// variable signs).
const IMPLICIT: &[(&str, Option<u32>)] = &[
    ("at:motorway", Some(130)),
    ("at:rural", Some(100)),
    ("at:trunk", Some(100)),
    ("be-bru:rural", Some(70)),
    ("be-bru:urban", Some(30)),
    ("be-vlg:rural", Some(70)),
    ("be:motorway", Some(120)),
    ("by:motorway", Some(110)),
    ("by:urban", Some(60)),
    ("ch:motorway", Some(120)),
    ("ch:rural", Some(80)),
    ("ch:trunk", Some(100)),
    ("cz:motorway", None),
    ("cz:trunk", None),
    ("de:living_street", Some(7)),
    ("de:motorway", None),
    ("de:rural", Some(100)),
    ("de:zone30", Some(30)),
    ("de:zone:30", Some(30)),
    ("dk:rural", Some(80)),
    ("fr:rural", Some(80)),
    ("gb:motorway", Some(112)),
    ("gb:nsl_dual", Some(112)),
    ("gb:nsl_single", Some(96)),
    ("hu:rural", Some(90)),
    ("it:rural", Some(90)),
    ("nl:rural", Some(80)),
    ("nl:trunk", Some(100)),
    ("no:motorway", Some(110)),
    ("no:rural", Some(80)),
    ("pl:motorway", Some(140)),
    ("pl:rural", Some(100)),
    ("pl:trunk", Some(120)),
    ("ro:motorway", Some(130)),
    ("ro:rural", Some(100)),
    ("ro:trunk", Some(100)),
    ("ru:living_street", Some(20)),
    ("ru:motorway", Some(110)),
    ("ru:rural", Some(90)),
    ("ru:urban", Some(60)),
    ("ua:rural", Some(90)),
    ("uk:motorway", Some(112)),
    ("uk:nsl_dual", Some(112)),
    ("uk:nsl_single", Some(96)),
    ("za:rural", Some(100)),
    ("za:urban", Some(60)),
    ("rural", Some(100)),
    ("national", Some(100)),
    ("none", Some(130)),
    ("unlimited", Some(130)),
    ("signals", None),
    ("variable", None),
    ("foot", Some(5)),
];

/// Fallback by zone once the country code is stripped (`xx:urban`).
fn zone_default(zone: &str) -> Option<u32> {
    match zone {
        "walk" => Some(5),
        "living_street" => Some(10),
        "urban" => Some(40),
        "rural" => Some(90),
        "trunk" => Some(110),
        "motorway" => Some(130),
        _ => None,
    }
}

/// Parse a single `maxspeed` entry into km/h.
///
/// Returns `None` when the entry posts no usable limit; callers treat that as
/// unbounded.
pub fn parse_maxspeed(entry: &str) -> Option<u32> {
    if let Some((_, limit)) = IMPLICIT.iter().find(|(value, _)| *value == entry) {
        return *limit;
    }

    match entry.split_once(':') {
        Some((country, zone)) if is_country_code(country) => return zone_default(zone),
        _ => {
            if let Some(limit) = zone_default(entry) {
                return Some(limit);
            }
        }
    }

    parse_speed_with_units(entry).map(|kmh| kmh as u32)
}

/// Parse the minimum limit of a `;`-separated `maxspeed` value.
///
/// Entries that do not parse are ignored; `None` if no entry posts a limit.
pub fn parse_maxspeed_list(value: &str) -> Option<u32> {
    value
        .split(';')
        .filter_map(|entry| parse_maxspeed(entry.trim_start()))
        .min()
}

/// Parse `50`, `50 km/h`, `30mph` or `12 knots` into km/h.
pub fn parse_speed_with_units(value: &str) -> Option<f64> {
    const UNITS: &[(&str, f64)] = &[
        ("km/h", 1.0),
        ("kmh", 1.0),
        ("kph", 1.0),
        ("mph", 1.609),
        ("knots", 1.852),
    ];

    let (number, factor) = UNITS
        .iter()
        .find_map(|(unit, factor)| {
            value
                .strip_suffix(unit)
                .map(|n| (n.strip_suffix(' ').unwrap_or(n), *factor))
        })
        .unwrap_or((value, 1.0));

    let mut bytes = number.bytes();
    if !bytes.next().is_some_and(|b| b.is_ascii_digit())
        || !bytes.all(|b| b.is_ascii_digit() || b == b'.')
    {
        return None;
    }

    let speed: f64 = number.parse().ok()?;
    Some((speed * factor).floor())
}

/// `xx` or `xx-yyy` subdivision codes
fn is_country_code(code: &str) -> bool {
    let country = code.split('-').next().unwrap_or(code);
    country.len() == 2 && country.bytes().all(|b| b.is_ascii_lowercase())
}
