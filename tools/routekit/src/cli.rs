//! Command line batch driver
//!
//! Reads a JSON request (point pairs or a point list), answers it with one
//! [`RoutingClient`] and writes the JSON response.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use tracing::info;

use crate::client::{ClientOptions, RoutingClient, DEFAULT_SNAP_RADIUS};
use crate::engine::{Coord, Engine};
use crate::logging::{init_logging, LogFormat};
use crate::profile::{Metric, Profile, DEFAULT_TRUCK_SPEED};
use crate::profiles::TruckLimits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Measure {
    /// Meters
    Distance,
    /// Milliseconds
    Traveltime,
}

impl From<Measure> for Metric {
    fn from(measure: Measure) -> Self {
        match measure {
            Measure::Distance => Metric::Distance,
            Measure::Traveltime => Metric::Duration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// `{"tuples":[{"from":..,"to":..}]}` to `{"trips":[{"cost":..,"waypoints":[..]}]}`
    Tuples,
    /// `{"points":[..]}` to `{"matrix":[[..]]}`
    Matrix,
}

#[derive(Debug, Parser)]
#[command(name = "routekit")]
#[command(about = "Batch shortest-path queries on OpenStreetMap data", long_about = None)]
pub struct Cli {
    /// Input OSM PBF file; the hierarchy cache is written next to it
    #[arg(long, default_value = "data/map.osm.pbf")]
    pub map: PathBuf,

    /// car, bike, pedestrian or truck
    #[arg(long, default_value = "car")]
    pub profile: String,

    #[arg(long, value_enum, default_value_t = Measure::Distance)]
    pub measure: Measure,

    #[arg(long, value_enum, default_value_t = Mode::Tuples)]
    pub mode: Mode,

    /// Request file (default: stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Response file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Truck height in meters
    #[arg(long)]
    pub height: Option<f64>,

    /// Truck width in meters
    #[arg(long)]
    pub width: Option<f64>,

    /// Truck length in meters
    #[arg(long)]
    pub length: Option<f64>,

    /// Truck weight in tonnes
    #[arg(long)]
    pub weight: Option<f64>,

    /// Truck top speed in km/h
    #[arg(long)]
    pub speed: Option<u32>,

    /// Maximum distance in meters between a query point and the road network
    #[arg(long, default_value_t = DEFAULT_SNAP_RADIUS)]
    pub snap_radius: f32,

    /// Concurrent queries (default: number of CPUs)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Log as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

#[derive(Debug, Deserialize)]
struct TuplesRequest {
    tuples: Vec<PointTuple>,
}

#[derive(Debug, Deserialize)]
struct PointTuple {
    from: Coord,
    to: Coord,
}

#[derive(Debug, Serialize)]
struct TuplesResponse {
    trips: Vec<Trip>,
}

#[derive(Debug, Serialize)]
struct Trip {
    waypoints: Vec<Coord>,
    cost: u32,
}

#[derive(Debug, Deserialize)]
struct MatrixRequest {
    points: Vec<Coord>,
}

#[derive(Debug, Serialize)]
struct MatrixResponse {
    matrix: Vec<Vec<u32>>,
}

impl Cli {
    /// The profile named by `--profile`, with truck flags applied
    pub fn profile(&self) -> Result<Profile> {
        let profile = Profile::from_name(&self.profile)?;
        if profile.name != "truck" {
            return Ok(profile);
        }
        let defaults = TruckLimits::default();
        let limits = TruckLimits {
            height: self.height.unwrap_or(defaults.height),
            width: self.width.unwrap_or(defaults.width),
            length: self.length.unwrap_or(defaults.length),
            weight: self.weight.unwrap_or(defaults.weight),
        };
        Ok(Profile::truck(limits, self.speed.unwrap_or(DEFAULT_TRUCK_SPEED)))
    }

    pub fn options(&self) -> ClientOptions {
        let mut options = ClientOptions::default()
            .with_metric(self.measure.into())
            .with_snap_radius(self.snap_radius);
        if let Some(concurrency) = self.concurrency {
            options = options.with_concurrency(concurrency);
        }
        options
    }

    pub fn run(self) -> Result<()> {
        init_logging(LogFormat::from_json_flag(self.log_json));

        let profile = self.profile()?;
        let client = RoutingClient::open(&self.map, &profile, self.options())
            .with_context(|| format!("creating {} client for {}", profile.name, self.map.display()))?;

        let input: Box<dyn Read> = match &self.input {
            Some(path) => Box::new(BufReader::new(
                File::open(path).with_context(|| format!("opening input {}", path.display()))?,
            )),
            None => Box::new(io::stdin().lock()),
        };
        let output: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(BufWriter::new(
                File::create(path).with_context(|| format!("creating output {}", path.display()))?,
            )),
            None => Box::new(io::stdout().lock()),
        };

        match self.mode {
            Mode::Tuples => answer_tuples(&client, input, output),
            Mode::Matrix => answer_matrix(&client, input, output),
        }
    }
}

/// Route every tuple of the request concurrently.
pub fn answer_tuples<E: Engine>(
    client: &RoutingClient<E>,
    input: impl Read,
    mut output: impl Write,
) -> Result<()> {
    let request: TuplesRequest = serde_json::from_reader(input).context("reading tuples request")?;

    let trips: Vec<Trip> = request
        .tuples
        .par_iter()
        .map(|tuple| {
            let (cost, waypoints) = client.route(tuple.from, tuple.to);
            Trip { waypoints, cost }
        })
        .collect();
    info!(trips = trips.len(), "answered tuples");

    serde_json::to_writer(&mut output, &TuplesResponse { trips }).context("writing trips")?;
    output.flush().context("writing trips")
}

/// Distances between every pair of request points.
pub fn answer_matrix<E: Engine>(
    client: &RoutingClient<E>,
    input: impl Read,
    mut output: impl Write,
) -> Result<()> {
    let request: MatrixRequest = serde_json::from_reader(input).context("reading matrix request")?;

    let matrix = client.matrix(&request.points, &request.points);
    info!(points = request.points.len(), "answered matrix");

    serde_json::to_writer(&mut output, &MatrixResponse { matrix }).context("writing matrix")?;
    output.flush().context("writing matrix")
}
