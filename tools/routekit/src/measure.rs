//! Measurement parsers for free-form OSM tag values
//!
//! Heights, widths and lengths are normalized to meters, weights to metric tonnes.
//! Accepted grammars:
//!
//! - meters: `13'11"` or `13'` (feet and inches), or `13`, `13.1`, `13 m`
//! - tonnes: `7.5`, `7.5 t`, `3 st`, `10000 lbs`, `10000 kg`, `12 lt`, `30 cwt`
//!
//! Sentinels such as `default` or `none` are not measurements; callers check
//! [`is_unrestricted`] before parsing.

use std::num::{ParseFloatError, ParseIntError};
use thiserror::Error;

const METERS_PER_FOOT: f64 = 0.3048;
const METERS_PER_INCH: f64 = 0.0254;

const TONNES_PER_SHORT_TON: f64 = 0.9071847;
const TONNES_PER_LB: f64 = 0.000_453_592_37;
const TONNES_PER_KG: f64 = 0.001;
const TONNES_PER_LONG_TON: f64 = 1.016047;
const TONNES_PER_LONG_HUNDREDWEIGHT: f64 = 0.05080;

/// Tag values meaning "no restriction signed"
const UNRESTRICTED: &[&str] = &[
    "default",
    "below_default",
    "no_indications",
    "no_sign",
    "none",
    "unsigned",
];

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("could not parse {value:?} as a {unit} value")]
    Unrecognized { value: String, unit: &'static str },

    #[error("invalid {component} value in {value:?}: {source}")]
    InvalidInteger {
        component: &'static str,
        value: String,
        source: ParseIntError,
    },

    #[error("invalid number in {value:?}: {source}")]
    InvalidNumber {
        value: String,
        source: ParseFloatError,
    },
}

/// True for sentinel values that mean the restriction is not in force.
pub fn is_unrestricted(value: &str) -> bool {
    UNRESTRICTED.contains(&value)
}

/// Parse a length such as `13'11"`, `4.5` or `4.5 m` into meters.
pub fn parse_meters(text: &str) -> Result<f64, ParseError> {
    if let Some((feet, rest)) = text.split_once('\'') {
        return parse_imperial(text, feet, rest);
    }

    let number = text.strip_suffix(" m").unwrap_or(text);
    if !is_decimal(number) {
        return Err(unrecognized(text, "meter"));
    }
    parse_float(text, number)
}

/// Parse a weight such as `7.5`, `7.5 t` or `10000 lbs` into tonnes.
pub fn parse_tonnes(text: &str) -> Result<f64, ParseError> {
    let (number, unit) = match text.split_once(' ') {
        Some((number, unit)) => (number, Some(unit)),
        None => (text, None),
    };
    if !is_decimal(number) {
        return Err(unrecognized(text, "tonnes"));
    }

    let factor = match unit {
        None | Some("t") => 1.0,
        Some("kg") => TONNES_PER_KG,
        Some("st") => TONNES_PER_SHORT_TON,
        Some("lt") => TONNES_PER_LONG_TON,
        Some("lbs") => TONNES_PER_LB,
        Some("cwt") => TONNES_PER_LONG_HUNDREDWEIGHT,
        Some(_) => return Err(unrecognized(text, "tonnes")),
    };

    Ok(parse_float(text, number)? * factor)
}

fn parse_imperial(text: &str, feet: &str, rest: &str) -> Result<f64, ParseError> {
    if !is_integer(feet) {
        return Err(unrecognized(text, "meter"));
    }
    let inches = if rest.is_empty() {
        None
    } else {
        match rest.strip_suffix('"') {
            Some(inches) if is_integer(inches) => Some(inches),
            _ => return Err(unrecognized(text, "meter")),
        }
    };

    let feet: u32 = feet.parse().map_err(|source| ParseError::InvalidInteger {
        component: "feet",
        value: text.to_string(),
        source,
    })?;
    let mut meters = f64::from(feet) * METERS_PER_FOOT;

    if let Some(inches) = inches {
        let inches: u32 = inches.parse().map_err(|source| ParseError::InvalidInteger {
            component: "inch",
            value: text.to_string(),
            source,
        })?;
        meters += f64::from(inches) * METERS_PER_INCH;
    }

    Ok(meters)
}

fn parse_float(text: &str, number: &str) -> Result<f64, ParseError> {
    number.parse::<f64>().map_err(|source| ParseError::InvalidNumber {
        value: text.to_string(),
        source,
    })
}

fn unrecognized(text: &str, unit: &'static str) -> ParseError {
    ParseError::Unrecognized {
        value: text.to_string(),
        unit,
    }
}

fn is_integer(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `\d+(\.\d*)?`
fn is_decimal(s: &str) -> bool {
    match s.split_once('.') {
        Some((whole, frac)) => is_integer(whole) && frac.bytes().all(|b| b.is_ascii_digit()),
        None => is_integer(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(expected: f64, got: f64) {
        let diff = (expected - got).abs();
        let mean = (expected + got).abs() / 2.0;
        assert!(
            mean == 0.0 || diff / mean < 1e-5,
            "expected {expected}, got {got}"
        );
    }

    #[test]
    fn test_parse_meters_imperial() {
        assert_close(4.2418, parse_meters("13'11\"").unwrap());
        assert_close(3.9624, parse_meters("13'").unwrap());
    }

    #[test]
    fn test_parse_meters_decimal() {
        assert_close(13.0, parse_meters("13").unwrap());
        assert_close(13.1, parse_meters("13.1").unwrap());
        assert_close(13.0, parse_meters("13 m").unwrap());
        assert_close(13.1, parse_meters("13.1 m").unwrap());
    }

    #[test]
    fn test_parse_meters_rejects() {
        for value in ["'", "13'bdo", "13.1 moo", "13,1", "", "13.1m", "13'11", "-3"] {
            assert!(parse_meters(value).is_err(), "{value:?} should not parse");
        }
    }

    #[test]
    fn test_parse_meters_integer_overflow() {
        let err = parse_meters("99999999999'").unwrap_err();
        assert!(matches!(err, ParseError::InvalidInteger { component: "feet", .. }));
    }

    #[test]
    fn test_parse_tonnes_units() {
        assert_close(3.0, parse_tonnes("3").unwrap());
        assert_close(3.0, parse_tonnes("3.0").unwrap());
        assert_close(3.0, parse_tonnes("3 t").unwrap());
        assert_close(3.1, parse_tonnes("3.1 t").unwrap());
        assert_close(2.72155, parse_tonnes("3 st").unwrap());
        assert_close(4.535924, parse_tonnes("10000 lbs").unwrap());
        assert_close(10.0, parse_tonnes("10000 kg").unwrap());
        assert_close(12.1926, parse_tonnes("12 lt").unwrap());
        assert_close(1.524, parse_tonnes("30 cwt").unwrap());
    }

    #[test]
    fn test_parse_tonnes_rejects() {
        assert!(parse_tonnes("30cwt").is_err());
        assert!(parse_tonnes("30 dogs").is_err());
        assert!(parse_tonnes("").is_err());
    }

    #[test]
    fn test_sentinels_are_not_measurements() {
        assert!(is_unrestricted("none"));
        assert!(is_unrestricted("no_sign"));
        assert!(!is_unrestricted("3.5"));
        assert!(parse_meters("default").is_err());
    }
}
