//! Vehicle-aware OSM routing
//!
//! Profiles decide which ways a travel mode may use and how fast. A
//! [`RoutingClient`] compiles a profile against a map, builds or reuses a
//! contraction hierarchy for it and answers concurrent queries with a bounded
//! number of engine slots.

pub mod cache_key;
pub mod cli;
pub mod client;
pub mod compile;
pub mod engine;
pub mod formats;
pub mod geo;
pub mod ingest;
pub mod logging;
pub mod measure;
pub mod profile;
pub mod profiles;
pub mod slots;

pub use client::{ClientOptions, RoutingClient};
pub use engine::{Coord, Engine, EngineBuilder, MAX_DISTANCE};
pub use profile::{CompiledProfile, Metric, Profile, TransportMode};
pub use profiles::TruckLimits;
