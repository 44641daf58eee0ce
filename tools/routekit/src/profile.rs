//! Routing profiles and their compiled form

use routekit_common::Error;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::profiles::{TruckLimits, WayRules};

/// Default top speed for the truck profile in km/h
pub const DEFAULT_TRUCK_SPEED: u32 = 90;

/// How the engine treats edge direction and turn costs
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportMode {
    Vehicle = 0,
    Bike = 1,
    Pedestrian = 2,
}

impl TransportMode {
    /// Stable numeric code, part of the hierarchy cache key
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            TransportMode::Vehicle => "vehicle",
            TransportMode::Bike => "bike",
            TransportMode::Pedestrian => "pedestrian",
        }
    }

    /// Whether `oneway` and roundabout direction apply
    pub fn honours_oneway(self) -> bool {
        self == TransportMode::Vehicle
    }
}

/// What an edge weight measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Metric {
    /// Meters
    #[default]
    Distance,
    /// Milliseconds
    Duration,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Distance => "distance",
            Metric::Duration => "duration",
        }
    }
}

/// A named travel mode together with its way rules
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub transport_mode: TransportMode,
    pub prevent_left_turns: bool,
    pub prevent_u_turns: bool,
    pub rules: WayRules,
}

impl Profile {
    pub fn new(name: impl Into<String>, transport_mode: TransportMode, rules: WayRules) -> Self {
        Self {
            name: name.into(),
            transport_mode,
            prevent_left_turns: false,
            prevent_u_turns: false,
            rules,
        }
    }

    pub fn car() -> Self {
        Self::new("car", TransportMode::Vehicle, WayRules::Car)
    }

    pub fn bike() -> Self {
        Self::new("bike", TransportMode::Bike, WayRules::Bike)
    }

    pub fn pedestrian() -> Self {
        Self::new("pedestrian", TransportMode::Pedestrian, WayRules::Pedestrian)
    }

    pub fn truck(limits: TruckLimits, max_speed: u32) -> Self {
        Self::new(
            "truck",
            TransportMode::Vehicle,
            WayRules::Truck { limits, max_speed },
        )
    }

    /// Look up a built-in profile; the truck gets default dimensions.
    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            "car" => Ok(Self::car()),
            "bike" => Ok(Self::bike()),
            "pedestrian" => Ok(Self::pedestrian()),
            "truck" => Ok(Self::truck(TruckLimits::default(), DEFAULT_TRUCK_SPEED)),
            other => Err(Error::unknown_profile(other)),
        }
    }

    pub fn with_prevent_left_turns(mut self, prevent: bool) -> Self {
        self.prevent_left_turns = prevent;
        self
    }

    pub fn with_prevent_u_turns(mut self, prevent: bool) -> Self {
        self.prevent_u_turns = prevent;
        self
    }

    /// Reject profiles that cannot produce a usable network.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::Configuration("profile name was empty".into()));
        }
        if let WayRules::Truck { limits, max_speed } = &self.rules {
            if *max_speed == 0 {
                return Err(Error::Configuration(
                    "truck top speed must be at least 1 km/h".into(),
                ));
            }
            if let Some(dimension) = limits.invalid_dimension() {
                return Err(Error::Configuration(format!(
                    "truck {dimension} must be a positive number"
                )));
            }
        }
        Ok(())
    }
}

/// Result of running a profile over every way of a map.
///
/// Every id in `allowed_way_ids` has a speed of at least 1 km/h in `way_speeds`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProfile {
    pub name: String,
    pub transport_mode: TransportMode,
    pub prevent_left_turns: bool,
    pub prevent_u_turns: bool,
    pub allowed_way_ids: FxHashSet<i64>,
    pub way_speeds: FxHashMap<i64, u32>,
}

impl CompiledProfile {
    /// Empty compiled profile carrying the flags of `profile`
    pub fn empty(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            transport_mode: profile.transport_mode,
            prevent_left_turns: profile.prevent_left_turns,
            prevent_u_turns: profile.prevent_u_turns,
            allowed_way_ids: FxHashSet::default(),
            way_speeds: FxHashMap::default(),
        }
    }

    pub fn is_allowed(&self, way_id: i64) -> bool {
        self.allowed_way_ids.contains(&way_id)
    }

    /// Speed of an allowed way in km/h
    pub fn speed(&self, way_id: i64) -> Option<u32> {
        if !self.is_allowed(way_id) {
            return None;
        }
        self.way_speeds.get(&way_id).copied()
    }
}
