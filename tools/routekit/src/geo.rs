//! Great-circle helpers over `geo`

use geo::{Distance, Haversine, Point};

/// Mean earth radius in meters, as used by [`Haversine`]
pub const EARTH_RADIUS: f64 = 6_371_008.8;

/// Great-circle distance in meters between two `(lon, lat)` positions
pub fn haversine_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    Haversine::distance(Point::new(lon1, lat1), Point::new(lon2, lat2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_one_degree_latitude() {
        let d = haversine_distance(13.0, 52.0, 13.0, 53.0);
        assert!((d - 111_195.0).abs() < 1.0, "{d}");
    }

    #[test]
    fn test_earth_radius_matches_haversine() {
        let half_turn = haversine_distance(0.0, 0.0, 180.0, 0.0);
        assert!((half_turn - EARTH_RADIUS * std::f64::consts::PI).abs() < 1e-3, "{half_turn}");
    }

    #[test]
    fn test_haversine_zero() {
        assert_eq!(haversine_distance(8.5, 47.3, 8.5, 47.3), 0.0);
    }
}
