//! Routing engine
//!
//! [`Engine`] is the narrow query surface the client needs. [`ContractionEngine`]
//! implements it over a contraction hierarchy that is built from a map source
//! or loaded from a `.ch` file.

pub mod contraction;
pub mod graph;
pub mod query;
pub mod spatial;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::formats::{hierarchy, FormatError};
use crate::ingest::{OsmSource, SourceError};
use crate::profile::{CompiledProfile, Metric};
use contraction::{contract, Hierarchy};
use graph::build_road_graph;
use query::Scratch;
use spatial::SpatialIndex;

/// Distance reported for unroutable queries
pub const MAX_DISTANCE: u32 = i32::MAX as u32;

/// A WGS84 position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lon: f32,
    pub lat: f32,
}

impl Coord {
    pub fn new(lon: f32, lat: f32) -> Self {
        Self { lon, lat }
    }

    fn from_node(position: [f64; 2]) -> Self {
        Self::new(position[0] as f32, position[1] as f32)
    }
}

/// Result of a point-to-point query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    /// Meters or milliseconds; [`Engine::max_distance`] if unroutable
    pub distance: u32,
    /// Node positions along the route, empty unless requested
    pub waypoints: Vec<Coord>,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("hierarchy file {}: {source}", path.display())]
    Hierarchy { path: PathBuf, source: FormatError },

    #[error("hierarchy file {} holds {found} weights, expected {expected}", path.display())]
    MetricMismatch {
        path: PathBuf,
        found: &'static str,
        expected: &'static str,
    },

    #[error("could not write hierarchy file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("concurrency must be at least 1")]
    NoSlots,
}

impl From<EngineError> for routekit_common::Error {
    fn from(err: EngineError) -> Self {
        routekit_common::Error::EngineConstruction(Box::new(err))
    }
}

/// Query surface of a loaded routing engine.
///
/// `slot` selects the scratch state a call may use. Callers must never use the
/// same slot from two threads at once.
pub trait Engine: Send + Sync {
    /// Sentinel distance for unroutable queries
    fn max_distance(&self) -> u32;

    /// Number of scratch slots
    fn slot_count(&self) -> usize;

    fn query(
        &self,
        slot: usize,
        snap_radius: f32,
        from: Coord,
        to: Coord,
        want_waypoints: bool,
    ) -> QueryResponse;

    fn distances(&self, slot: usize, snap_radius: f32, source: Coord, targets: &[Coord])
        -> Vec<u32>;

    fn nearest(&self, slot: usize, snap_radius: f32, point: Coord) -> Option<Coord>;
}

/// Builds an engine for a compiled profile, reusing `hierarchy_file` if present.
pub trait EngineBuilder {
    type Engine: Engine;

    fn build_or_load(
        &self,
        concurrency: usize,
        source: &dyn OsmSource,
        hierarchy_file: &Path,
        profile: &CompiledProfile,
        metric: Metric,
    ) -> Result<Self::Engine, EngineError>;
}

/// Contraction hierarchy engine with one scratch state per slot
pub struct ContractionEngine {
    hierarchy: Hierarchy,
    index: SpatialIndex,
    scratch: Vec<Mutex<Scratch>>,
}

impl ContractionEngine {
    pub fn new(hierarchy: Hierarchy, concurrency: usize) -> Result<Self, EngineError> {
        if concurrency == 0 {
            return Err(EngineError::NoSlots);
        }
        let index = SpatialIndex::new(&hierarchy.coords);
        let scratch = (0..concurrency)
            .map(|_| Mutex::new(Scratch::new(hierarchy.node_count())))
            .collect();
        Ok(Self {
            hierarchy,
            index,
            scratch,
        })
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    fn snap(&self, point: Coord, snap_radius: f32) -> Option<u32> {
        self.index.nearest(
            f64::from(point.lon),
            f64::from(point.lat),
            f64::from(snap_radius),
        )
    }

    fn position(&self, node: u32) -> Coord {
        Coord::from_node(self.hierarchy.coords[node as usize])
    }
}

impl Engine for ContractionEngine {
    fn max_distance(&self) -> u32 {
        MAX_DISTANCE
    }

    fn slot_count(&self) -> usize {
        self.scratch.len()
    }

    fn query(
        &self,
        slot: usize,
        snap_radius: f32,
        from: Coord,
        to: Coord,
        want_waypoints: bool,
    ) -> QueryResponse {
        let unroutable = QueryResponse {
            distance: MAX_DISTANCE,
            waypoints: Vec::new(),
        };
        let (Some(source), Some(target)) = (self.snap(from, snap_radius), self.snap(to, snap_radius))
        else {
            return unroutable;
        };

        let mut scratch = self.scratch[slot].lock();
        match self
            .hierarchy
            .shortest_path(&mut scratch, source, target, want_waypoints)
        {
            Some(path) => QueryResponse {
                distance: path.distance,
                waypoints: path.nodes.iter().map(|&n| self.position(n)).collect(),
            },
            None => unroutable,
        }
    }

    fn distances(
        &self,
        slot: usize,
        snap_radius: f32,
        source: Coord,
        targets: &[Coord],
    ) -> Vec<u32> {
        let Some(source) = self.snap(source, snap_radius) else {
            return vec![MAX_DISTANCE; targets.len()];
        };
        let targets: Vec<Option<u32>> = targets
            .iter()
            .map(|&t| self.snap(t, snap_radius))
            .collect();

        let mut scratch = self.scratch[slot].lock();
        self.hierarchy
            .one_to_many(&mut scratch, source, &targets)
            .into_iter()
            .map(|d| d.unwrap_or(MAX_DISTANCE))
            .collect()
    }

    fn nearest(&self, _slot: usize, snap_radius: f32, point: Coord) -> Option<Coord> {
        self.snap(point, snap_radius).map(|node| self.position(node))
    }
}

/// Builds [`ContractionEngine`]s, persisting hierarchies as `.ch` files
#[derive(Debug, Clone, Copy, Default)]
pub struct ContractionBuilder;

impl ContractionBuilder {
    fn load(&self, path: &Path, metric: Metric) -> Result<Hierarchy, EngineError> {
        let loaded = hierarchy::read(path).map_err(|source| EngineError::Hierarchy {
            path: path.to_path_buf(),
            source,
        })?;
        if loaded.metric != metric {
            return Err(EngineError::MetricMismatch {
                path: path.to_path_buf(),
                found: loaded.metric.as_str(),
                expected: metric.as_str(),
            });
        }
        info!(path = %path.display(), nodes = loaded.node_count(), "loaded hierarchy");
        Ok(loaded)
    }

    fn build(
        &self,
        source: &dyn OsmSource,
        path: &Path,
        profile: &CompiledProfile,
        metric: Metric,
    ) -> Result<Hierarchy, EngineError> {
        let graph = build_road_graph(source, profile, metric)?;
        let built = contract(graph, metric);

        // Write next to the target and rename so a crash never leaves a partial file.
        let mut partial = path.as_os_str().to_os_string();
        partial.push(".partial");
        let partial = PathBuf::from(partial);
        let write_err = |source| EngineError::Write {
            path: path.to_path_buf(),
            source,
        };
        hierarchy::write(&partial, &built).map_err(write_err)?;
        std::fs::rename(&partial, path).map_err(write_err)?;

        info!(path = %path.display(), nodes = built.node_count(), "wrote hierarchy");
        Ok(built)
    }
}

impl EngineBuilder for ContractionBuilder {
    type Engine = ContractionEngine;

    fn build_or_load(
        &self,
        concurrency: usize,
        source: &dyn OsmSource,
        hierarchy_file: &Path,
        profile: &CompiledProfile,
        metric: Metric,
    ) -> Result<ContractionEngine, EngineError> {
        let hierarchy = if hierarchy_file.exists() {
            debug!(path = %hierarchy_file.display(), "reusing cached hierarchy");
            self.load(hierarchy_file, metric)?
        } else {
            debug!(path = %hierarchy_file.display(), "no cached hierarchy, building");
            self.build(source, hierarchy_file, profile, metric)?
        };
        ContractionEngine::new(hierarchy, concurrency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile_profile;
    use crate::ingest::MemorySource;
    use crate::profile::Profile;

    fn square() -> MemorySource {
        let mut source = MemorySource::new("square");
        source
            .add_node(1, 0.0, 0.0)
            .add_node(2, 0.001, 0.0)
            .add_node(3, 0.001, 0.001)
            .add_node(4, 0.0, 0.001)
            .add_way(1, &[1, 2, 3], &[("highway", "residential")])
            .add_way(2, &[3, 4, 1], &[("highway", "residential"), ("oneway", "yes")]);
        source
    }

    fn engine(dir: &Path, profile: Profile) -> ContractionEngine {
        let source = square();
        let compiled = compile_profile(&source, &profile).unwrap();
        ContractionBuilder
            .build_or_load(2, &source, &dir.join("square.ch"), &compiled, Metric::Distance)
            .unwrap()
    }

    #[test]
    fn test_oneway_detour() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path(), Profile::car());

        // 1 -> 4 must go around: 1-2-3-4
        let response = engine.query(0, 10.0, Coord::new(0.0, 0.0), Coord::new(0.0, 0.001), true);
        assert_eq!(response.distance, 333);
        assert_eq!(response.waypoints.len(), 4);
        // 4 -> 1 follows the oneway
        let back = engine.query(1, 10.0, Coord::new(0.0, 0.001), Coord::new(0.0, 0.0), false);
        assert_eq!(back.distance, 111);
        assert!(back.waypoints.is_empty());
    }

    #[test]
    fn test_unsnappable_is_max_distance() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path(), Profile::car());
        let far = Coord::new(1.0, 1.0);

        assert_eq!(engine.query(0, 10.0, far, Coord::new(0.0, 0.0), true).distance, MAX_DISTANCE);
        assert_eq!(
            engine.distances(0, 10.0, Coord::new(0.0, 0.0), &[far, Coord::new(0.001, 0.0)]),
            vec![MAX_DISTANCE, 111]
        );
        assert_eq!(engine.nearest(0, 10.0, far), None);
    }

    #[test]
    fn test_hierarchy_file_reused() {
        let dir = tempfile::tempdir().unwrap();
        let first = engine(dir.path(), Profile::car());
        let path = dir.path().join("square.ch");
        assert!(path.exists());

        // An empty source proves the second engine never looked at the map.
        let compiled = compile_profile(&square(), &Profile::car()).unwrap();
        let second = ContractionBuilder
            .build_or_load(1, &MemorySource::new("empty"), &path, &compiled, Metric::Distance)
            .unwrap();
        assert_eq!(second.hierarchy(), first.hierarchy());
        assert_eq!(second.slot_count(), 1);
    }

    #[test]
    fn test_metric_mismatch_and_corruption() {
        let dir = tempfile::tempdir().unwrap();
        engine(dir.path(), Profile::car());
        let path = dir.path().join("square.ch");
        let compiled = compile_profile(&square(), &Profile::car()).unwrap();

        let err = ContractionBuilder
            .build_or_load(1, &square(), &path, &compiled, Metric::Duration)
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::MetricMismatch { .. }));

        std::fs::write(&path, b"garbage garbage garbage garbage").unwrap();
        let err = ContractionBuilder
            .build_or_load(1, &square(), &path, &compiled, Metric::Distance)
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::Hierarchy { .. }));
    }

    #[test]
    fn test_zero_slots_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = square();
        let compiled = compile_profile(&source, &Profile::car()).unwrap();
        let result =
            ContractionBuilder.build_or_load(0, &source, &dir.path().join("x.ch"), &compiled, Metric::Distance);
        assert!(matches!(result, Err(EngineError::NoSlots)));
    }
}
