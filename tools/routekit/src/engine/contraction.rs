//! Contraction hierarchy construction
//!
//! Nodes are contracted one at a time in order of a lazily updated edge
//! difference. A shortcut `u -> x` replaces `u -> v -> x` unless a bounded
//! witness search finds a path at most as long that avoids `v`.

use priority_queue::PriorityQueue;
use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use std::time::Instant;
use tracing::info;

use super::graph::{Arc, Csr, RoadGraph, NO_MIDDLE};
use crate::profile::Metric;

/// Nodes a witness search may settle before giving up (and keeping the shortcut)
const WITNESS_SETTLE_LIMIT: usize = 500;

/// A contracted road graph
#[derive(Debug, Clone, PartialEq)]
pub struct Hierarchy {
    pub metric: Metric,
    /// `[lon, lat]` per node
    pub coords: Vec<[f64; 2]>,
    /// Contraction order, higher is more important
    pub rank: Vec<u32>,
    /// Arcs `u -> v` with `rank[v] > rank[u]`, stored at `u`
    pub up: Csr,
    /// Arcs `v -> u` with `rank[v] > rank[u]`, stored at `u` with head `v`
    pub down: Csr,
}

impl Hierarchy {
    pub fn node_count(&self) -> usize {
        self.coords.len()
    }

    /// Append the nodes of arc `from -> to` after `from`, expanding shortcuts.
    pub fn unpack_arc(&self, from: u32, to: u32, middle: u32, path: &mut Vec<u32>) {
        let mut stack = vec![(from, to, middle)];
        while let Some((a, b, m)) = stack.pop() {
            if m == NO_MIDDLE {
                path.push(b);
                continue;
            }
            let first = self.down.find(m, a).map_or(NO_MIDDLE, |i| self.down.middle[i]);
            let second = self.up.find(m, b).map_or(NO_MIDDLE, |i| self.up.middle[i]);
            stack.push((m, b, second));
            stack.push((a, m, first));
        }
    }
}

type Neighbours = FxHashMap<u32, (u32, u32)>;

struct Contractor {
    /// head -> (weight, middle)
    out: Vec<Neighbours>,
    /// tail -> (weight, middle)
    inc: Vec<Neighbours>,
    deleted_neighbours: Vec<u32>,
}

impl Contractor {
    fn new(graph: &RoadGraph) -> Self {
        let n = graph.node_count();
        let mut contractor = Self {
            out: vec![Neighbours::default(); n],
            inc: vec![Neighbours::default(); n],
            deleted_neighbours: vec![0; n],
        };
        for arc in &graph.arcs {
            contractor.add_arc(arc.tail, arc.head, arc.weight, arc.middle);
        }
        contractor
    }

    fn add_arc(&mut self, tail: u32, head: u32, weight: u32, middle: u32) {
        let better = self.out[tail as usize]
            .get(&head)
            .map_or(true, |&(w, _)| weight < w);
        if better {
            self.out[tail as usize].insert(head, (weight, middle));
            self.inc[head as usize].insert(tail, (weight, middle));
        }
    }

    /// Tentative distances from `source` not passing `avoid`, up to `limit`
    fn witness_search(&self, source: u32, avoid: u32, limit: u32) -> FxHashMap<u32, u32> {
        let mut dist = FxHashMap::default();
        let mut queue = PriorityQueue::new();
        dist.insert(source, 0u32);
        queue.push(source, Reverse(0u32));

        let mut settled = 0;
        while let Some((node, Reverse(d))) = queue.pop() {
            if d > limit || settled >= WITNESS_SETTLE_LIMIT {
                break;
            }
            settled += 1;
            for (&next, &(w, _)) in &self.out[node as usize] {
                if next == avoid {
                    continue;
                }
                let nd = d.saturating_add(w);
                if nd <= limit && dist.get(&next).map_or(true, |&old| nd < old) {
                    dist.insert(next, nd);
                    queue.push_increase(next, Reverse(nd));
                }
            }
        }
        dist
    }

    /// Shortcuts `(tail, head, weight)` needed to contract `v`
    fn shortcuts(&self, v: u32) -> Vec<(u32, u32, u32)> {
        let out = &self.out[v as usize];
        let Some(max_out) = out.values().map(|&(w, _)| w).max() else {
            return Vec::new();
        };

        let mut shortcuts = Vec::new();
        for (&u, &(w1, _)) in &self.inc[v as usize] {
            let dist = self.witness_search(u, v, w1.saturating_add(max_out));
            for (&x, &(w2, _)) in out {
                if x == u {
                    continue;
                }
                let via = w1.saturating_add(w2);
                if dist.get(&x).map_or(true, |&d| d > via) {
                    shortcuts.push((u, x, via));
                }
            }
        }
        shortcuts
    }

    fn priority(&self, v: u32) -> i64 {
        let added = self.shortcuts(v).len() as i64;
        let removed = (self.out[v as usize].len() + self.inc[v as usize].len()) as i64;
        added - removed + i64::from(self.deleted_neighbours[v as usize])
    }

    /// Remove `v`, returning its remaining arcs as (up, down) hierarchy arcs.
    fn contract(&mut self, v: u32, up: &mut Vec<Arc>, down: &mut Vec<Arc>) -> Vec<u32> {
        let shortcuts = self.shortcuts(v);
        let out = std::mem::take(&mut self.out[v as usize]);
        let inc = std::mem::take(&mut self.inc[v as usize]);

        let mut neighbours = Vec::with_capacity(out.len() + inc.len());
        for (&head, &(weight, middle)) in &out {
            up.push(Arc { tail: v, head, weight, middle });
            self.inc[head as usize].remove(&v);
            neighbours.push(head);
        }
        for (&tail, &(weight, middle)) in &inc {
            down.push(Arc { tail: v, head: tail, weight, middle });
            self.out[tail as usize].remove(&v);
            neighbours.push(tail);
        }
        neighbours.sort_unstable();
        neighbours.dedup();

        for (tail, head, weight) in shortcuts {
            self.add_arc(tail, head, weight, v);
        }
        for &n in &neighbours {
            self.deleted_neighbours[n as usize] += 1;
        }
        neighbours
    }
}

/// Contract `graph` into a hierarchy.
pub fn contract(graph: RoadGraph, metric: Metric) -> Hierarchy {
    let start = Instant::now();
    let n = graph.node_count();
    let original_arcs = graph.arcs.len();
    let mut contractor = Contractor::new(&graph);

    let mut queue = PriorityQueue::with_capacity(n);
    for v in 0..n as u32 {
        queue.push(v, Reverse(contractor.priority(v)));
    }

    let mut rank = vec![0u32; n];
    let mut up = Vec::new();
    let mut down = Vec::new();
    let mut next_rank = 0u32;

    while let Some((v, Reverse(_))) = queue.pop() {
        let current = contractor.priority(v);
        if let Some((_, Reverse(best))) = queue.peek() {
            if current > *best {
                queue.push(v, Reverse(current));
                continue;
            }
        }

        rank[v as usize] = next_rank;
        next_rank += 1;
        for neighbour in contractor.contract(v, &mut up, &mut down) {
            if queue.get(&neighbour).is_some() {
                queue.change_priority(&neighbour, Reverse(contractor.priority(neighbour)));
            }
        }
    }

    let shortcuts = up
        .iter()
        .chain(down.iter())
        .filter(|a| a.middle != NO_MIDDLE)
        .count();
    info!(
        nodes = n,
        arcs = original_arcs,
        shortcuts,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "contracted hierarchy"
    );

    Hierarchy {
        metric,
        coords: graph.coords,
        rank,
        up: Csr::from_arcs(n, up),
        down: Csr::from_arcs(n, down),
    }
}
