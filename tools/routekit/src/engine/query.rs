//! Upward searches on a contraction hierarchy
//!
//! A query runs a complete upward search from the source and a pruned upward
//! search on the reversed graph from the target. One-to-many queries reuse the
//! source search for every target.

use priority_queue::PriorityQueue;
use rustc_hash::FxBuildHasher;
use std::cmp::Reverse;

use super::contraction::Hierarchy;
use super::graph::Csr;

const UNREACHED: u32 = u32::MAX;
const NO_PARENT: (u32, u32) = (u32::MAX, u32::MAX);

/// Dijkstra state for one direction, reset between queries
pub struct SearchSpace {
    dist: Vec<u32>,
    /// (previous node, arc index)
    parent: Vec<(u32, u32)>,
    touched: Vec<u32>,
    queue: PriorityQueue<u32, Reverse<u32>, FxBuildHasher>,
}

impl SearchSpace {
    pub fn new(node_count: usize) -> Self {
        Self {
            dist: vec![UNREACHED; node_count],
            parent: vec![NO_PARENT; node_count],
            touched: Vec::new(),
            queue: PriorityQueue::with_default_hasher(),
        }
    }

    fn reset(&mut self) {
        for &v in &self.touched {
            self.dist[v as usize] = UNREACHED;
            self.parent[v as usize] = NO_PARENT;
        }
        self.touched.clear();
        self.queue.clear();
    }

    fn start(&mut self, source: u32) {
        self.reset();
        self.dist[source as usize] = 0;
        self.touched.push(source);
        self.queue.push(source, Reverse(0));
    }

    fn relax(&mut self, csr: &Csr, node: u32, d: u32) {
        for arc in csr.arcs(node) {
            let head = csr.head[arc];
            let nd = d.saturating_add(csr.weight[arc]);
            if nd < self.dist[head as usize] {
                if self.dist[head as usize] == UNREACHED {
                    self.touched.push(head);
                }
                self.dist[head as usize] = nd;
                self.parent[head as usize] = (node, arc as u32);
                self.queue.push_increase(head, Reverse(nd));
            }
        }
    }

    /// Settle the entire upward search space of `source`.
    fn exhaust(&mut self, csr: &Csr, source: u32) {
        self.start(source);
        while let Some((node, Reverse(d))) = self.queue.pop() {
            self.relax(csr, node, d);
        }
    }

    pub fn distance(&self, node: u32) -> Option<u32> {
        Some(self.dist[node as usize]).filter(|&d| d != UNREACHED)
    }
}

/// Per-slot scratch state
pub struct Scratch {
    forward: SearchSpace,
    backward: SearchSpace,
}

impl Scratch {
    pub fn new(node_count: usize) -> Self {
        Self {
            forward: SearchSpace::new(node_count),
            backward: SearchSpace::new(node_count),
        }
    }
}

/// Shortest path distance and, if asked for, its node sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub distance: u32,
    pub nodes: Vec<u32>,
}

impl Hierarchy {
    /// Backward search from `target` against a finished forward search.
    ///
    /// Returns the distance and the meeting node.
    fn meet(
        &self,
        forward: &SearchSpace,
        backward: &mut SearchSpace,
        target: u32,
    ) -> Option<(u32, u32)> {
        let mut best: Option<(u32, u32)> = None;
        backward.start(target);
        while let Some((node, Reverse(d))) = backward.queue.pop() {
            if best.is_some_and(|(b, _)| d >= b) {
                break;
            }
            if let Some(f) = forward.distance(node) {
                let total = f.saturating_add(d);
                if best.map_or(true, |(b, _)| total < b) {
                    best = Some((total, node));
                }
            }
            backward.relax(&self.down, node, d);
        }
        best
    }

    fn path_nodes(&self, scratch: &Scratch, source: u32, target: u32, meet: u32) -> Vec<u32> {
        // source .. meet along up arcs
        let mut up_arcs = Vec::new();
        let mut node = meet;
        while node != source {
            let (prev, arc) = scratch.forward.parent[node as usize];
            if prev == u32::MAX {
                break;
            }
            up_arcs.push((prev, node, self.up.middle[arc as usize]));
            node = prev;
        }

        let mut nodes = vec![source];
        for &(from, to, middle) in up_arcs.iter().rev() {
            self.unpack_arc(from, to, middle, &mut nodes);
        }

        // meet .. target along down arcs, which are stored reversed
        let mut node = meet;
        while node != target {
            let (next, arc) = scratch.backward.parent[node as usize];
            if next == u32::MAX {
                break;
            }
            self.unpack_arc(node, next, self.down.middle[arc as usize], &mut nodes);
            node = next;
        }
        nodes
    }

    /// Shortest path from `source` to `target`.
    pub fn shortest_path(
        &self,
        scratch: &mut Scratch,
        source: u32,
        target: u32,
        want_nodes: bool,
    ) -> Option<Path> {
        scratch.forward.exhaust(&self.up, source);
        let (distance, meet) = self.meet(&scratch.forward, &mut scratch.backward, target)?;
        let nodes = if want_nodes {
            self.path_nodes(scratch, source, target, meet)
        } else {
            Vec::new()
        };
        Some(Path { distance, nodes })
    }

    /// Distances from `source` to each target; `None` where unreachable.
    pub fn one_to_many(
        &self,
        scratch: &mut Scratch,
        source: u32,
        targets: &[Option<u32>],
    ) -> Vec<Option<u32>> {
        scratch.forward.exhaust(&self.up, source);
        targets
            .iter()
            .map(|target| {
                let target = (*target)?;
                self.meet(&scratch.forward, &mut scratch.backward, target)
                    .map(|(d, _)| d)
            })
            .collect()
    }
}
