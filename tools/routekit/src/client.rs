//! Routing client - concurrent queries against one engine
//!
//! Every query holds a slot from the [`QuerySlotPool`] for the duration of the
//! engine call. The compiled profile is only needed while the engine is built.

use routekit_common::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use crate::cache_key::hierarchy_file_name;
use crate::compile::compile_profile;
use crate::engine::{ContractionBuilder, ContractionEngine, Coord, Engine, EngineBuilder};
use crate::ingest::{OsmSource, PbfSource};
use crate::profile::{Metric, Profile};
use crate::slots::QuerySlotPool;

/// Snap radius used until [`RoutingClient::set_snap_radius`] is called, in meters
pub const DEFAULT_SNAP_RADIUS: f32 = 1000.0;

/// Client construction settings
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    pub metric: Metric,
    /// Concurrent engine queries (slots)
    pub concurrency: usize,
    /// Meters
    pub snap_radius: f32,
    /// Threads computing matrix rows
    pub matrix_workers: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        let cpus = num_cpus::get();
        Self {
            metric: Metric::Distance,
            concurrency: cpus,
            snap_radius: DEFAULT_SNAP_RADIUS,
            matrix_workers: cpus,
        }
    }
}

impl ClientOptions {
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_snap_radius(mut self, meters: f32) -> Self {
        self.snap_radius = meters;
        self
    }

    pub fn with_matrix_workers(mut self, workers: usize) -> Self {
        self.matrix_workers = workers;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Configuration("concurrency must be at least 1".into()));
        }
        if self.matrix_workers == 0 {
            return Err(Error::Configuration(
                "matrix workers must be at least 1".into(),
            ));
        }
        validate_snap_radius(self.snap_radius)
    }
}

fn validate_snap_radius(meters: f32) -> Result<()> {
    if !meters.is_finite() || meters < 0.0 {
        return Err(Error::Configuration(format!(
            "snap radius must be a non-negative number of meters, got {meters}"
        )));
    }
    Ok(())
}

/// One source's distances to all targets of a matrix
#[derive(Debug)]
struct DistanceMatrixRow {
    row_index: usize,
    distances: Vec<u32>,
}

/// Thread-safe routing facade over an [`Engine`].
///
/// All operations may be called concurrently from any number of threads. At
/// most `concurrency` of them run inside the engine at a time.
pub struct RoutingClient<E: Engine = ContractionEngine> {
    engine: E,
    slots: QuerySlotPool,
    /// `f32` bits, meters
    snap_radius: AtomicU32,
    max_distance: u32,
    matrix_pool: rayon::ThreadPool,
    hierarchy_file: Option<PathBuf>,
}

impl RoutingClient<ContractionEngine> {
    /// Open a `.osm.pbf` map, building `<map>_<profile>_<metric>_<hash>.ch` next
    /// to it unless it already exists.
    pub fn open(map_file: impl AsRef<Path>, profile: &Profile, options: ClientOptions) -> Result<Self> {
        let map_file = map_file.as_ref();
        if !map_file.exists() {
            return Err(Error::MapNotFound(map_file.to_path_buf()));
        }
        Self::from_source(&PbfSource::new(map_file), profile, options)
    }

    /// Like [`RoutingClient::open`] for any map source.
    pub fn from_source(
        source: &dyn OsmSource,
        profile: &Profile,
        options: ClientOptions,
    ) -> Result<Self> {
        Self::build(source, profile, options, &ContractionBuilder)
    }
}

impl<E: Engine> RoutingClient<E> {
    /// Compile `profile` against `source` and let `builder` build or load the engine.
    pub fn build<B>(
        source: &dyn OsmSource,
        profile: &Profile,
        options: ClientOptions,
        builder: &B,
    ) -> Result<Self>
    where
        B: EngineBuilder<Engine = E>,
    {
        profile.validate()?;
        options.validate()?;

        let compiled = compile_profile(source, profile)?;
        let hierarchy_file = hierarchy_file_name(source.path(), &compiled, options.metric);
        let engine = builder.build_or_load(
            options.concurrency,
            source,
            &hierarchy_file,
            &compiled,
            options.metric,
        )?;
        drop(compiled);

        info!(
            profile = %profile.name,
            metric = options.metric.as_str(),
            hierarchy = %hierarchy_file.display(),
            concurrency = options.concurrency,
            "routing client ready"
        );

        let mut client = Self::with_engine(engine, options)?;
        client.hierarchy_file = Some(hierarchy_file);
        Ok(client)
    }

    /// Wrap an already constructed engine.
    ///
    /// The slot count is the smaller of `options.concurrency` and the engine's slots.
    pub fn with_engine(engine: E, options: ClientOptions) -> Result<Self> {
        options.validate()?;
        let slots = options.concurrency.min(engine.slot_count());
        if slots == 0 {
            return Err(Error::Configuration("engine has no query slots".into()));
        }

        let matrix_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.matrix_workers)
            .thread_name(|i| format!("routekit-matrix-{i}"))
            .build()
            .map_err(|err| Error::Configuration(format!("matrix worker pool: {err}")))?;

        Ok(Self {
            max_distance: engine.max_distance(),
            engine,
            slots: QuerySlotPool::new(slots),
            snap_radius: AtomicU32::new(options.snap_radius.to_bits()),
            matrix_pool,
            hierarchy_file: None,
        })
    }

    /// Distance reported when no route exists
    pub fn max_distance(&self) -> u32 {
        self.max_distance
    }

    /// The `.ch` file backing this client, if it was built from a map
    pub fn hierarchy_file(&self) -> Option<&Path> {
        self.hierarchy_file.as_deref()
    }

    pub fn concurrency(&self) -> usize {
        self.slots.capacity()
    }

    pub fn snap_radius(&self) -> f32 {
        f32::from_bits(self.snap_radius.load(Ordering::Relaxed))
    }

    /// Change the snap radius for all subsequent queries on this client.
    pub fn set_snap_radius(&self, meters: f32) -> Result<()> {
        validate_snap_radius(meters)?;
        self.snap_radius.store(meters.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    /// Shortest route; `(max_distance, [])` if either end does not snap or no path exists.
    pub fn route(&self, from: Coord, to: Coord) -> (u32, Vec<Coord>) {
        let slot = self.slots.acquire();
        let response = self
            .engine
            .query(slot.slot(), self.snap_radius(), from, to, true);
        (response.distance, response.waypoints)
    }

    /// Length of the shortest route, or `max_distance`.
    pub fn distance(&self, from: Coord, to: Coord) -> u32 {
        let slot = self.slots.acquire();
        self.engine
            .query(slot.slot(), self.snap_radius(), from, to, false)
            .distance
    }

    /// [`RoutingClient::distance`] giving up if no slot frees within `timeout`.
    ///
    /// Once a slot is held the query runs to completion.
    pub fn distance_within(&self, from: Coord, to: Coord, timeout: Duration) -> Option<u32> {
        let slot = self.slots.acquire_timeout(timeout)?;
        let response = self
            .engine
            .query(slot.slot(), self.snap_radius(), from, to, false);
        Some(response.distance)
    }

    /// Distances from `source` to every target, `max_distance` per unreachable target.
    pub fn distances(&self, source: Coord, targets: &[Coord]) -> Vec<u32> {
        let slot = self.slots.acquire();
        self.engine
            .distances(slot.slot(), self.snap_radius(), source, targets)
    }

    /// `matrix[i][j]` is the distance from `sources[i]` to `targets[j]`.
    ///
    /// Rows are computed in parallel on the matrix workers.
    pub fn matrix(&self, sources: &[Coord], targets: &[Coord]) -> Vec<Vec<u32>> {
        let (tx, rx) = crossbeam_channel::unbounded();

        self.matrix_pool.scope(|scope| {
            for (row_index, &source) in sources.iter().enumerate() {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let distances = self.distances(source, targets);
                    if tx.send(DistanceMatrixRow { row_index, distances }).is_err() {
                        debug!(row_index, "matrix receiver gone");
                    }
                });
            }
        });
        drop(tx);

        let mut matrix = vec![Vec::new(); sources.len()];
        for row in rx {
            matrix[row.row_index] = row.distances;
        }
        debug!(rows = sources.len(), cols = targets.len(), "matrix done");
        matrix
    }

    /// Closest network position within the snap radius.
    pub fn nearest(&self, point: Coord) -> Option<Coord> {
        let slot = self.slots.acquire();
        self.engine.nearest(slot.slot(), self.snap_radius(), point)
    }
}

impl<E: Engine> Drop for RoutingClient<E> {
    fn drop(&mut self) {
        debug_assert_eq!(
            self.slots.available(),
            self.slots.capacity(),
            "client dropped with queries in flight"
        );
        debug!("releasing routing engine");
    }
}
