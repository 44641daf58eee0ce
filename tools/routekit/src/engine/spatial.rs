//! Snapping coordinates onto routing nodes
//!
//! The R-tree works in degrees. A query collects every node inside the
//! longitude/latitude box that encloses the snap circle and picks the closest
//! one by great-circle distance.

use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};
use std::f64::consts::FRAC_PI_2;

use crate::geo::{haversine_distance, EARTH_RADIUS};

type IndexedPoint = GeomWithData<[f64; 2], u32>;

/// Slack in degrees for rounding at the box edges
const BOX_MARGIN: f64 = 1e-9;

#[derive(Debug)]
pub struct SpatialIndex {
    tree: RTree<IndexedPoint>,
}

impl SpatialIndex {
    pub fn new(coords: &[[f64; 2]]) -> Self {
        let points = coords
            .iter()
            .enumerate()
            .map(|(i, &c)| IndexedPoint::new(c, i as u32))
            .collect();
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    /// Closest node within `radius` meters of `(lon, lat)`
    pub fn nearest(&self, lon: f64, lat: f64, radius: f64) -> Option<u32> {
        let mut best: Option<(f64, u32)> = None;
        for envelope in search_boxes(lon, lat, radius) {
            for point in self.tree.locate_in_envelope(&envelope) {
                let [plon, plat] = *point.geom();
                let meters = haversine_distance(lon, lat, plon, plat);
                if meters <= radius && !matches!(best, Some((b, _)) if b <= meters) {
                    best = Some((meters, point.data));
                }
            }
        }
        best.map(|(_, node)| node)
    }
}

/// Boxes covering every position within `radius` meters of `(lon, lat)`.
///
/// Two boxes when the circle crosses the antimeridian, a full longitude band
/// when it reaches a pole.
fn search_boxes(lon: f64, lat: f64, radius: f64) -> Vec<AABB<[f64; 2]>> {
    let angle = radius / EARTH_RADIUS;
    let dlat = angle.to_degrees() + BOX_MARGIN;
    let south = (lat - dlat).max(-90.0);
    let north = (lat + dlat).min(90.0);

    let cos_lat = lat.to_radians().cos();
    if angle >= FRAC_PI_2 || angle.sin() >= cos_lat || south <= -90.0 || north >= 90.0 {
        return vec![AABB::from_corners([-180.0, south], [180.0, north])];
    }

    // widest longitude offset of a spherical cap
    let dlon = (angle.sin() / cos_lat).asin().to_degrees() + BOX_MARGIN;
    let (west, east) = (lon - dlon, lon + dlon);
    if west < -180.0 {
        vec![
            AABB::from_corners([-180.0, south], [east, north]),
            AABB::from_corners([west + 360.0, south], [180.0, north]),
        ]
    } else if east > 180.0 {
        vec![
            AABB::from_corners([west, south], [180.0, north]),
            AABB::from_corners([-180.0, south], [east - 360.0, north]),
        ]
    } else {
        vec![AABB::from_corners([west, south], [east, north])]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_nearest_within_radius() {
        let index = SpatialIndex::new(&[[13.0, 52.0], [13.01, 52.0]]);

        assert_eq!(index.nearest(13.0001, 52.0, 100.0), Some(0));
        assert_eq!(index.nearest(13.0099, 52.0, 100.0), Some(1));
        assert_eq!(index.nearest(13.005, 52.0, 100.0), None);
        assert_eq!(index.nearest(13.0001, 52.0, 1.0), None);
    }

    #[test]
    fn test_empty_index() {
        let index = SpatialIndex::new(&[]);
        assert_eq!(index.nearest(0.0, 0.0, 1e9), None);
    }

    #[test]
    fn test_high_latitude_ranks_by_meters() {
        // 111 m east, then a row 167-172 m north that is closer in degrees
        let mut coords = vec![[0.002, 60.0]];
        coords.extend((0..8).map(|i| [-0.0007 + 0.0002 * f64::from(i), 60.0015]));
        let index = SpatialIndex::new(&coords);

        assert_eq!(index.nearest(0.0, 60.0, 150.0), Some(0));
        assert_eq!(index.nearest(0.0, 60.0, 1000.0), Some(0));
        assert_eq!(index.nearest(0.0, 60.0, 100.0), None);
    }

    #[test]
    fn test_antimeridian_and_pole() {
        let index = SpatialIndex::new(&[[179.9995, 0.0], [123.0, 89.9999]]);

        // 111 m apart across the date line
        assert_eq!(index.nearest(-179.9995, 0.0, 150.0), Some(0));
        assert_eq!(index.nearest(-179.9995, 0.0, 100.0), None);
        // 22 m apart over the pole
        assert_eq!(index.nearest(-57.0, 89.9999, 50.0), Some(1));

        let antipode = SpatialIndex::new(&[[-60.0, -45.0]]);
        assert_eq!(antipode.nearest(120.0, 45.0, 2.1e7), Some(0));
        assert_eq!(antipode.nearest(120.0, 45.0, 1.9e7), None);
    }

    #[test]
    fn test_matches_exhaustive_scan() {
        let mut rng = StdRng::seed_from_u64(17);
        for base_lat in [0.0, 45.0, 70.0, -80.0] {
            let coords: Vec<[f64; 2]> = (0..300)
                .map(|_| {
                    [
                        rng.random_range(-0.05..0.05),
                        base_lat + rng.random_range(-0.02..0.02),
                    ]
                })
                .collect();
            let index = SpatialIndex::new(&coords);

            for _ in 0..100 {
                let (lon, lat) = (
                    rng.random_range(-0.05..0.05),
                    base_lat + rng.random_range(-0.02..0.02),
                );
                let radius = rng.random_range(10.0..800.0);
                let expected = coords
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (haversine_distance(lon, lat, c[0], c[1]), i as u32))
                    .filter(|&(d, _)| d <= radius)
                    .min_by(|a, b| a.0.total_cmp(&b.0))
                    .map(|(_, i)| i);
                assert_eq!(index.nearest(lon, lat, radius), expected);
            }
        }
    }
}
