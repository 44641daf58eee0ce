//! Error types and utilities for the routekit toolkit
//!
//! Provides the crate-wide error taxonomy and fuzzy matching for profile names.

use std::fmt;
use std::path::PathBuf;
use strsim::{jaro_winkler, normalized_levenshtein};

/// Boxed error carried across crate boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Profile names understood by the routekit CLI and client constructors.
pub const KNOWN_PROFILES: &[&str] = &["car", "bike", "pedestrian", "truck"];

/// Find the best fuzzy match for `input` among `candidates`.
///
/// Scores are 70% Jaro-Winkler plus 30% normalized Levenshtein, with a prefix
/// bonus for inputs that share their first characters with a candidate. Matches
/// below 0.65 are discarded.
fn find_best_fuzzy_match(input: &str, candidates: &[&str]) -> Option<String> {
    let input_lower = input.to_lowercase();
    let mut best_match = None;
    let mut best_score = 0.0f64;

    let min_threshold = 0.65;

    for candidate in candidates {
        let candidate_lower = candidate.to_lowercase();

        let jw_score = jaro_winkler(&input_lower, &candidate_lower);
        let lev_score = normalized_levenshtein(&input_lower, &candidate_lower);
        let mut score = (jw_score * 0.7) + (lev_score * 0.3);

        // Abbreviations such as "ped" or "bicycle" share a prefix with the real name.
        if input_lower.chars().count() >= 3 && candidate_lower.starts_with(&input_lower) {
            score += 0.15;
        }

        if score >= min_threshold && score > best_score {
            best_score = score;
            best_match = Some((*candidate).to_string());
        }
    }

    best_match
}

/// Suggest a correction for a potentially misspelled profile name.
///
/// Returns `None` when `name` already is a known profile (case-insensitive) or
/// nothing is close enough.
pub fn suggest_profile(name: &str) -> Option<String> {
    if KNOWN_PROFILES.iter().any(|p| p.eq_ignore_ascii_case(name)) {
        return None;
    }
    if name.eq_ignore_ascii_case("bicycle") || name.eq_ignore_ascii_case("cycling") {
        return Some("bike".to_string());
    }
    if name.eq_ignore_ascii_case("foot") || name.eq_ignore_ascii_case("walking") {
        return Some("pedestrian".to_string());
    }
    find_best_fuzzy_match(name, KNOWN_PROFILES)
}

/// Main error type for routekit operations
#[derive(Debug)]
pub enum Error {
    /// Invalid client configuration (empty profile name, zero concurrency, ...)
    Configuration(String),

    /// The map file given to a client does not exist
    MapNotFound(PathBuf),

    /// Profile name not recognized
    UnknownProfile {
        name: String,
        suggestion: Option<String>,
    },

    /// The map could not be opened or its decode stream failed
    Source { path: PathBuf, source: BoxError },

    /// The routing engine failed to build or load its hierarchy
    EngineConstruction(BoxError),

    /// File I/O error
    Io(std::io::Error),
}

impl Error {
    /// Build an `UnknownProfile` error, attaching a suggestion when one exists.
    pub fn unknown_profile(name: &str) -> Self {
        Error::UnknownProfile {
            name: name.to_string(),
            suggestion: suggest_profile(name),
        }
    }

    /// Configuration problems are not retryable without fixing the input.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_) | Error::MapNotFound(_) | Error::UnknownProfile { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(msg) => {
                write!(f, "Invalid configuration: {msg}")
            }
            Error::MapNotFound(path) => {
                write!(f, "Could not find map file at {}", path.display())
            }
            Error::UnknownProfile { name, suggestion } => match suggestion {
                Some(s) => write!(f, "Unknown profile '{name}'. Did you mean '{s}'?"),
                None => write!(
                    f,
                    "Unknown profile '{name}' (expected one of: {})",
                    KNOWN_PROFILES.join(", ")
                ),
            },
            Error::Source { path, source } => {
                write!(f, "Failed to read map {}: {source}", path.display())
            }
            Error::EngineConstruction(err) => {
                write!(f, "Routing engine construction failed: {err}")
            }
            Error::Io(err) => {
                write!(f, "I/O error: {err}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Source { source, .. } => Some(source.as_ref()),
            Error::EngineConstruction(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

/// Convenience result type for routekit operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_profile_typos() {
        assert_eq!(suggest_profile("pedestrain"), Some("pedestrian".to_string()));
        assert_eq!(suggest_profile("truk"), Some("truck".to_string()));
        assert_eq!(suggest_profile("bicycle"), Some("bike".to_string()));
        assert_eq!(suggest_profile("foot"), Some("pedestrian".to_string()));
    }

    #[test]
    fn test_suggest_profile_exact_match_needs_no_suggestion() {
        assert_eq!(suggest_profile("car"), None);
        assert_eq!(suggest_profile("CAR"), None);
    }

    #[test]
    fn test_suggest_profile_nonsense() {
        assert_eq!(suggest_profile("zeppelin-express"), None);
    }

    #[test]
    fn test_configuration_classification() {
        assert!(Error::Configuration("empty".into()).is_configuration());
        assert!(Error::MapNotFound(PathBuf::from("x.pbf")).is_configuration());
        assert!(Error::unknown_profile("boat").is_configuration());
        let io = Error::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(!io.is_configuration());
    }

    #[test]
    fn test_unknown_profile_message() {
        let err = Error::unknown_profile("pedestrain");
        assert_eq!(
            err.to_string(),
            "Unknown profile 'pedestrain'. Did you mean 'pedestrian'?"
        );
    }
}
