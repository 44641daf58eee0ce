//! Common utilities for the routekit toolkit

pub mod error;

pub use error::{suggest_profile, BoxError, Error, Result};

#[cfg(test)]
mod tests {
    use crate::error::suggest_profile;

    #[test]
    fn suggest_profile_returns_expected_mode() {
        assert_eq!(suggest_profile("biek"), Some("bike".to_string()));
    }
}
