//! Corridor graph planning
//!
//! Candidate connections come from a k-nearest-neighbour graph over room
//! centroids. A minimum spanning tree over the candidates guarantees that
//! every room is joined; extra loop edges are then drawn from the same
//! candidate set so no pair outside it is ever invented.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::GeneratorConfig;
use crate::rng::GameRng;

use super::{Room, RoomId};

/// Tracks room connectivity using equivalence classes
#[derive(Debug, Clone)]
pub struct ConnectivityTracker {
    /// Each room's equivalence class (rooms in same class are connected)
    smeq: Vec<usize>,
}

impl ConnectivityTracker {
    /// Create a new tracker for the given number of rooms
    pub fn new(num_rooms: usize) -> Self {
        Self {
            smeq: (0..num_rooms).collect(),
        }
    }

    /// Check if two rooms are connected (in same equivalence class)
    pub fn are_connected(&self, a: usize, b: usize) -> bool {
        if a >= self.smeq.len() || b >= self.smeq.len() {
            return false;
        }
        self.smeq[a] == self.smeq[b]
    }

    /// Merge equivalence classes; returns false when already connected
    pub fn merge(&mut self, a: usize, b: usize) -> bool {
        if a >= self.smeq.len() || b >= self.smeq.len() || self.are_connected(a, b) {
            return false;
        }

        let old_class = self.smeq[b];
        let new_class = self.smeq[a];
        for eq in &mut self.smeq {
            if *eq == old_class {
                *eq = new_class;
            }
        }
        true
    }

    /// Check if all rooms are connected
    pub fn all_connected(&self) -> bool {
        match self.smeq.first() {
            None => true,
            Some(&first) => self.smeq.iter().all(|&c| c == first),
        }
    }
}

/// A candidate corridor between two rooms (`a < b`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub a: RoomId,
    pub b: RoomId,
    /// Euclidean centroid distance
    pub distance: f64,
}

/// Edge list ready for carving
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorridorGraph {
    /// Spanning tree edges, in acceptance order
    pub tree: Vec<GraphEdge>,
    /// Extra edges closing loops
    pub loops: Vec<GraphEdge>,
    /// Size of the deduplicated k-NN candidate set
    pub candidates: usize,
}

impl CorridorGraph {
    /// All edges in carving order: tree first, then loops
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.tree.iter().chain(self.loops.iter())
    }
}

/// Sort key for a pair: squared distance, then ids
type Candidate = (u64, usize, usize);

fn candidate(rooms: &[Room], i: usize, j: usize) -> Candidate {
    let (a, b) = (i.min(j), i.max(j));
    (rooms[a].distance2(&rooms[b]), a, b)
}

fn edge((d2, a, b): Candidate) -> GraphEdge {
    GraphEdge {
        a: RoomId(a),
        b: RoomId(b),
        distance: (d2 as f64).sqrt(),
    }
}

/// Deduplicated k-nearest-neighbour pairs, sorted by `(distance², a, b)`
fn knn_candidates(rooms: &[Room], k: usize) -> Vec<Candidate> {
    let mut out = Vec::with_capacity(rooms.len() * k);
    for i in 0..rooms.len() {
        let mut near: Vec<(u64, usize)> = (0..rooms.len())
            .filter(|&j| j != i)
            .map(|j| (rooms[i].distance2(&rooms[j]), j))
            .collect();
        near.sort_unstable();
        out.extend(near.into_iter().take(k).map(|(_, j)| candidate(rooms, i, j)));
    }
    out.sort_unstable();
    out.dedup();
    out
}

/// Build the corridor graph for a set of rooms
///
/// Randomness is drawn once per non-tree candidate, in sorted order.
pub fn build_graph(rooms: &[Room], config: &GeneratorConfig, rng: &mut GameRng) -> CorridorGraph {
    let candidates = knn_candidates(rooms, config.knn_k);
    let mut tracker = ConnectivityTracker::new(rooms.len());
    let mut in_tree = vec![false; candidates.len()];
    let mut graph = CorridorGraph {
        candidates: candidates.len(),
        ..Default::default()
    };

    for (i, &cand) in candidates.iter().enumerate() {
        if tracker.merge(cand.1, cand.2) {
            in_tree[i] = true;
            graph.tree.push(edge(cand));
        }
    }

    if !tracker.all_connected() {
        // k-NN left islands: bridge them with the shortest remaining pairs
        let mut all: Vec<Candidate> = (0..rooms.len())
            .flat_map(|i| (i + 1..rooms.len()).map(move |j| (i, j)))
            .map(|(i, j)| candidate(rooms, i, j))
            .collect();
        all.sort_unstable();
        for cand in all {
            if tracker.merge(cand.1, cand.2) {
                trace!(a = cand.1, b = cand.2, "bridging disconnected k-NN components");
                graph.tree.push(edge(cand));
            }
        }
    }

    for (i, &cand) in candidates.iter().enumerate() {
        if !in_tree[i] && rng.percent(config.loop_edge_percent) {
            graph.loops.push(edge(cand));
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::Rect;

    fn room_at(id: usize, x: usize, y: usize) -> Room {
        Room::new(RoomId(id), Rect::new(x, y, x + 2, y + 2))
    }

    #[test]
    fn test_connectivity_tracker() {
        let mut tracker = ConnectivityTracker::new(5);

        assert!(!tracker.are_connected(0, 1));
        assert!(tracker.merge(0, 1));
        assert!(tracker.are_connected(0, 1));
        assert!(!tracker.merge(1, 0));

        tracker.merge(1, 2);
        assert!(tracker.are_connected(0, 2));
        assert!(!tracker.all_connected());

        tracker.merge(2, 3);
        tracker.merge(3, 4);
        assert!(tracker.all_connected());
        assert!(ConnectivityTracker::new(0).all_connected());
    }

    #[test]
    fn test_tree_spans_all_rooms() {
        let rooms: Vec<Room> = (0..9)
            .map(|i| room_at(i, 2 + (i % 3) * 12, 2 + (i / 3) * 12))
            .collect();
        let config = GeneratorConfig::default();
        let graph = build_graph(&rooms, &config, &mut GameRng::new(3));

        assert_eq!(graph.tree.len(), rooms.len() - 1);
        let mut tracker = ConnectivityTracker::new(rooms.len());
        for e in &graph.tree {
            assert!(e.a < e.b);
            tracker.merge(e.a.0, e.b.0);
        }
        assert!(tracker.all_connected());
    }

    #[test]
    fn test_disconnected_knn_is_bridged() {
        // Two tight clusters far apart: k=1 links only within a cluster
        let rooms = vec![
            room_at(0, 2, 2),
            room_at(1, 8, 2),
            room_at(2, 80, 2),
            room_at(3, 86, 2),
        ];
        let config = GeneratorConfig {
            knn_k: 1,
            loop_edge_percent: 0,
            ..Default::default()
        };
        let graph = build_graph(&rooms, &config, &mut GameRng::new(1));
        assert_eq!(graph.tree.len(), 3);
        assert!(graph.tree.iter().any(|e| e.a == RoomId(1) && e.b == RoomId(2)));
        assert!(graph.loops.is_empty());
    }

    #[test]
    fn test_loops_come_from_candidates() {
        let rooms: Vec<Room> = (0..12)
            .map(|i| room_at(i, 2 + (i % 4) * 10, 2 + (i / 4) * 10))
            .collect();
        let config = GeneratorConfig {
            loop_edge_percent: 100,
            ..Default::default()
        };
        let graph = build_graph(&rooms, &config, &mut GameRng::new(8));
        assert_eq!(graph.tree.len() + graph.loops.len(), graph.candidates);
        let candidates = knn_candidates(&rooms, config.knn_k);
        for e in &graph.loops {
            assert!(candidates.iter().any(|c| c.1 == e.a.0 && c.2 == e.b.0));
        }
    }

    #[test]
    fn test_single_room_has_no_edges() {
        let rooms = vec![room_at(0, 2, 2)];
        let graph = build_graph(&rooms, &GeneratorConfig::default(), &mut GameRng::new(1));
        assert_eq!(graph.edges().count(), 0);
    }
}
