//! Built-in routing profiles for different travel modes
//!
//! Each mode supplies a filter (`allows`) and a speed mapper (`speed`) over the
//! tags of one way. [`WayRules`] selects between them.

pub mod bike;
pub mod car;
pub mod foot;
pub mod maxspeed;
pub mod tag_lookup;
pub mod truck;

pub use tag_lookup::TagLookup;
pub use truck::TruckLimits;

/// Filter and speed rules of one travel mode
#[derive(Debug, Clone, PartialEq)]
pub enum WayRules {
    Car,
    Bike,
    Pedestrian,
    Truck { limits: TruckLimits, max_speed: u32 },
}

impl WayRules {
    /// Whether the way is traversable in this mode.
    pub fn allows(&self, way_id: i64, tags: &TagLookup<'_>) -> bool {
        match self {
            WayRules::Car => car::allows(way_id, tags),
            WayRules::Bike => bike::allows(way_id, tags),
            WayRules::Pedestrian => foot::allows(way_id, tags),
            WayRules::Truck { limits, .. } => truck::allows(way_id, tags, limits),
        }
    }

    /// Travel speed on the way in km/h; may be 0 for impassable surfaces.
    pub fn speed(&self, way_id: i64, tags: &TagLookup<'_>) -> u32 {
        match self {
            WayRules::Car => car::speed(way_id, tags),
            WayRules::Bike => bike::speed(way_id, tags),
            WayRules::Pedestrian => foot::speed(way_id, tags),
            WayRules::Truck { max_speed, .. } => truck::speed(way_id, tags, *max_speed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch() {
        let pairs = [("highway", "footway")];
        let tags = TagLookup::new(&pairs);

        assert!(!WayRules::Car.allows(1, &tags));
        assert!(WayRules::Bike.allows(1, &tags));
        assert!(WayRules::Pedestrian.allows(1, &tags));
        assert_eq!(WayRules::Pedestrian.speed(1, &tags), 5);
    }

    #[test]
    fn test_truck_dispatch_clamps_speed() {
        let rules = WayRules::Truck {
            limits: TruckLimits::default(),
            max_speed: 70,
        };
        let pairs = [("highway", "motorway")];
        let tags = TagLookup::new(&pairs);

        assert!(rules.allows(1, &tags));
        assert_eq!(rules.speed(1, &tags), 70);
    }
}
