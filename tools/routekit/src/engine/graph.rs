//! Road graph extraction
//!
//! Routing nodes are the OSM nodes referenced by allowed ways. Consecutive way
//! nodes are joined by arcs weighted in meters or milliseconds.

use rustc_hash::FxHashMap;
use std::ops::Range;
use tracing::{debug, info};

use crate::geo::haversine_distance;
use crate::ingest::{OsmSource, SourceError, Way};
use crate::profile::{CompiledProfile, Metric, TransportMode};

/// Marks an arc that is not a shortcut
pub const NO_MIDDLE: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arc {
    pub tail: u32,
    pub head: u32,
    pub weight: u32,
    /// Contracted node a shortcut skips, or [`NO_MIDDLE`]
    pub middle: u32,
}

/// Compressed adjacency arrays
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Csr {
    pub first_out: Vec<u32>,
    pub head: Vec<u32>,
    pub weight: Vec<u32>,
    pub middle: Vec<u32>,
}

impl Csr {
    /// Build from arcs; each arc is stored at its `tail`.
    pub fn from_arcs(node_count: usize, mut arcs: Vec<Arc>) -> Self {
        arcs.sort_unstable_by_key(|a| (a.tail, a.head));

        let mut first_out = vec![0u32; node_count + 1];
        for arc in &arcs {
            first_out[arc.tail as usize + 1] += 1;
        }
        for i in 0..node_count {
            first_out[i + 1] += first_out[i];
        }

        Self {
            first_out,
            head: arcs.iter().map(|a| a.head).collect(),
            weight: arcs.iter().map(|a| a.weight).collect(),
            middle: arcs.iter().map(|a| a.middle).collect(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.first_out.len().saturating_sub(1)
    }

    pub fn arc_count(&self) -> usize {
        self.head.len()
    }

    pub fn arcs(&self, node: u32) -> Range<usize> {
        let node = node as usize;
        self.first_out[node] as usize..self.first_out[node + 1] as usize
    }

    /// Index of the arc from `node` to `head`
    pub fn find(&self, node: u32, head: u32) -> Option<usize> {
        self.arcs(node).find(|&arc| self.head[arc] == head)
    }
}

/// Directed road network for one profile and metric
#[derive(Debug, Clone, Default)]
pub struct RoadGraph {
    /// `[lon, lat]` per node
    pub coords: Vec<[f64; 2]>,
    /// At most one arc per `(tail, head)`, the cheapest
    pub arcs: Vec<Arc>,
}

impl RoadGraph {
    pub fn node_count(&self) -> usize {
        self.coords.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Both,
    Forward,
    Backward,
}

fn direction(way: &Way, mode: TransportMode) -> Direction {
    if !mode.honours_oneway() {
        return Direction::Both;
    }
    match way.tag("oneway") {
        Some("yes" | "1" | "true") => Direction::Forward,
        Some("-1" | "reverse") => Direction::Backward,
        Some("no" | "0" | "false") => Direction::Both,
        _ if way.tag("junction") == Some("roundabout") => Direction::Forward,
        _ => Direction::Both,
    }
}

/// Arc weight for a segment of `meters` at `speed` km/h
fn weight(meters: f64, speed: u32, metric: Metric) -> u32 {
    let value = match metric {
        Metric::Distance => meters,
        Metric::Duration => meters * 3600.0 / f64::from(speed.max(1)),
    };
    value.round() as u32
}

struct RoutableWay {
    refs: Vec<u32>,
    speed: u32,
    direction: Direction,
}

/// Extract the routable network of `profile` from `source`.
///
/// Two passes: ways first to learn which nodes matter, then node positions.
/// Segments touching a node without a position are skipped.
pub fn build_road_graph(
    source: &dyn OsmSource,
    profile: &CompiledProfile,
    metric: Metric,
) -> Result<RoadGraph, SourceError> {
    let mut index: FxHashMap<i64, u32> = FxHashMap::default();
    let mut ways = Vec::new();

    source.for_each_way(&mut |way| {
        let Some(speed) = profile.speed(way.id) else {
            return;
        };
        if way.refs.len() < 2 {
            return;
        }
        let refs = way
            .refs
            .iter()
            .map(|&id| {
                let next = index.len() as u32;
                *index.entry(id).or_insert(next)
            })
            .collect();
        ways.push(RoutableWay {
            refs,
            speed,
            direction: direction(way, profile.transport_mode),
        });
    })?;

    let mut positions: Vec<Option<[f64; 2]>> = vec![None; index.len()];
    source.for_each_node(&mut |node| {
        if let Some(&i) = index.get(&node.id) {
            positions[i as usize] = Some([node.lon, node.lat]);
        }
    })?;

    let mut arcs = Vec::new();
    let mut skipped = 0usize;
    for way in &ways {
        for pair in way.refs.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let (Some(pa), Some(pb)) = (positions[a as usize], positions[b as usize]) else {
                skipped += 1;
                continue;
            };
            if a == b {
                continue;
            }
            let w = weight(haversine_distance(pa[0], pa[1], pb[0], pb[1]), way.speed, metric);
            if way.direction != Direction::Backward {
                arcs.push(Arc { tail: a, head: b, weight: w, middle: NO_MIDDLE });
            }
            if way.direction != Direction::Forward {
                arcs.push(Arc { tail: b, head: a, weight: w, middle: NO_MIDDLE });
            }
        }
    }
    if skipped > 0 {
        debug!(skipped, "segments without node positions");
    }

    // Renumber so that only nodes on some arc remain.
    let mut renumber = vec![u32::MAX; positions.len()];
    let mut coords = Vec::new();
    for arc in &mut arcs {
        for node in [&mut arc.tail, &mut arc.head] {
            let old = *node as usize;
            if renumber[old] == u32::MAX {
                renumber[old] = coords.len() as u32;
                if let Some(p) = positions[old] {
                    coords.push(p);
                }
            }
            *node = renumber[old];
        }
    }

    arcs.sort_unstable_by_key(|a| (a.tail, a.head, a.weight));
    arcs.dedup_by_key(|a| (a.tail, a.head));

    info!(
        nodes = coords.len(),
        arcs = arcs.len(),
        metric = metric.as_str(),
        "extracted road graph"
    );

    Ok(RoadGraph { coords, arcs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile_profile;
    use crate::ingest::MemorySource;
    use crate::profile::Profile;

    fn source() -> MemorySource {
        let mut source = MemorySource::new("graph-fixture");
        source
            .add_node(1, 0.0, 0.0)
            .add_node(2, 0.001, 0.0)
            .add_node(3, 0.002, 0.0)
            .add_node(4, 0.003, 0.0)
            .add_way(10, &[1, 2, 3], &[("highway", "residential")])
            .add_way(11, &[3, 4], &[("highway", "residential"), ("oneway", "yes")])
            .add_way(12, &[1, 99], &[("highway", "residential")])
            .add_way(13, &[2, 4], &[("highway", "footway")]);
        source
    }

    fn graph(profile: Profile, metric: Metric) -> RoadGraph {
        let source = source();
        let compiled = compile_profile(&source, &profile).unwrap();
        build_road_graph(&source, &compiled, metric).unwrap()
    }

    #[test]
    fn test_car_graph_honours_oneway() {
        let g = graph(Profile::car(), Metric::Distance);

        assert_eq!(g.node_count(), 4);
        // 1<->2, 2<->3, 3->4
        assert_eq!(g.arcs.len(), 5);
        assert!(g.arcs.iter().all(|a| a.weight == 111));
    }

    #[test]
    fn test_pedestrian_graph_ignores_oneway() {
        let g = graph(Profile::pedestrian(), Metric::Distance);
        // 1<->2, 2<->3, 3<->4 and the footway 2<->4
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.arcs.len(), 8);
        assert_eq!(g.arcs.iter().filter(|a| a.weight == 222).count(), 2);
    }

    #[test]
    fn test_duration_weights() {
        let g = graph(Profile::car(), Metric::Duration);
        // 111.195 m at 25 km/h
        assert!(g.arcs.iter().all(|a| a.weight == 16012));
    }

    #[test]
    fn test_csr_lookup() {
        let arcs = vec![
            Arc { tail: 1, head: 0, weight: 5, middle: NO_MIDDLE },
            Arc { tail: 0, head: 2, weight: 7, middle: 1 },
            Arc { tail: 0, head: 1, weight: 3, middle: NO_MIDDLE },
        ];
        let csr = Csr::from_arcs(3, arcs);

        assert_eq!(csr.first_out, vec![0, 2, 3, 3]);
        assert_eq!(csr.arcs(0).len(), 2);
        assert_eq!(csr.find(0, 2).map(|a| csr.middle[a]), Some(1));
        assert_eq!(csr.find(2, 0), None);
    }
}
