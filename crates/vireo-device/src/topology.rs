//! Coupling graph over physical qubits.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// The undirected connectivity graph of a device.
///
/// On construction a full all-pairs distance and predecessor matrix is
/// precomputed with one BFS per source, giving O(1) distance lookups and
/// O(path) shortest-path reconstruction during routing. Neighbors are
/// visited in ascending index order, which makes the reconstructed shortest
/// path the lexicographically least among all shortest paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "TopologyWire", into = "TopologyWire")]
pub struct Topology {
    num_qubits: u32,
    edges: Vec<(u32, u32)>,
    adjacency: Vec<Vec<u32>>,
    dist: Vec<Vec<u32>>,
    pred: Vec<Vec<u32>>,
}

/// Serialized form matching the external device contract: the size and the
/// unordered pair list.
#[derive(Serialize, Deserialize)]
struct TopologyWire {
    num_qubits: u32,
    #[serde(rename = "coupling_map", alias = "edges")]
    edges: Vec<(u32, u32)>,
}

impl From<TopologyWire> for Topology {
    fn from(wire: TopologyWire) -> Self {
        Topology::new(wire.num_qubits, wire.edges)
    }
}

impl From<Topology> for TopologyWire {
    fn from(topology: Topology) -> Self {
        TopologyWire {
            num_qubits: topology.num_qubits,
            edges: topology.edges,
        }
    }
}

/// Marker for "no path" in the distance matrix.
const UNREACHABLE: u32 = u32::MAX;

impl Topology {
    /// Build a topology from an unordered pair list. Duplicate and reversed
    /// pairs collapse to a single undirected edge; self-loops are dropped.
    pub fn new(num_qubits: u32, pairs: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let n = num_qubits as usize;
        let mut adjacency = vec![vec![]; n];
        let mut edges: Vec<(u32, u32)> = vec![];

        for (a, b) in pairs {
            if a == b || a >= num_qubits || b >= num_qubits {
                continue;
            }
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            if edges.contains(&(lo, hi)) {
                continue;
            }
            edges.push((lo, hi));
            adjacency[lo as usize].push(hi);
            adjacency[hi as usize].push(lo);
        }

        edges.sort_unstable();
        for neighbors in &mut adjacency {
            neighbors.sort_unstable();
        }

        let (dist, pred) = precompute_paths(&adjacency);

        Self {
            num_qubits,
            edges,
            adjacency,
            dist,
            pred,
        }
    }

    /// Number of physical qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// The undirected edges, each stored as `(low, high)`, sorted.
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Whether two physical qubits share a coupling edge.
    #[inline]
    pub fn coupled(&self, a: u32, b: u32) -> bool {
        self.adjacency
            .get(a as usize)
            .is_some_and(|n| n.binary_search(&b).is_ok())
    }

    /// Neighbors of a physical qubit, ascending.
    pub fn neighbors(&self, qubit: u32) -> &[u32] {
        self.adjacency
            .get(qubit as usize)
            .map_or(&[], Vec::as_slice)
    }

    /// Unweighted shortest-path distance, `None` when disconnected.
    #[inline]
    pub fn distance(&self, from: u32, to: u32) -> Option<u32> {
        let d = *self.dist.get(from as usize)?.get(to as usize)?;
        (d != UNREACHABLE).then_some(d)
    }

    /// The lexicographically least shortest path from `from` to `to`,
    /// inclusive of both endpoints. `None` when disconnected.
    pub fn shortest_path(&self, from: u32, to: u32) -> Option<Vec<u32>> {
        if from == to {
            return Some(vec![from]);
        }
        self.distance(from, to)?;

        let mut path = vec![to];
        let mut current = to;
        while current != from {
            let p = self.pred[from as usize][current as usize];
            if p == UNREACHABLE {
                return None;
            }
            path.push(p);
            current = p;
        }
        path.reverse();
        Some(path)
    }

    /// Whether every qubit in the slice lies in one connected component.
    pub fn all_connected(&self, qubits: &[u32]) -> bool {
        match qubits.split_first() {
            None => true,
            Some((&first, rest)) => rest
                .iter()
                .all(|&q| self.distance(first, q).is_some()),
        }
    }

    /// A linear chain 0-1-2-…-(n-1).
    pub fn linear(n: u32) -> Self {
        Self::new(n, (0..n.saturating_sub(1)).map(|i| (i, i + 1)))
    }

    /// A ring 0-1-…-(n-1)-0.
    pub fn ring(n: u32) -> Self {
        let mut pairs: Vec<(u32, u32)> = (0..n.saturating_sub(1)).map(|i| (i, i + 1)).collect();
        if n > 2 {
            pairs.push((n - 1, 0));
        }
        Self::new(n, pairs)
    }

    /// A rectangular grid, row-major.
    pub fn grid(width: u32, height: u32) -> Self {
        let mut pairs = vec![];
        for row in 0..height {
            for col in 0..width {
                let idx = row * width + col;
                if col + 1 < width {
                    pairs.push((idx, idx + 1));
                }
                if row + 1 < height {
                    pairs.push((idx, idx + width));
                }
            }
        }
        Self::new(width * height, pairs)
    }

    /// All-to-all connectivity.
    pub fn full(n: u32) -> Self {
        let mut pairs = vec![];
        for i in 0..n {
            for j in (i + 1)..n {
                pairs.push((i, j));
            }
        }
        Self::new(n, pairs)
    }
}

/// One BFS per source; neighbors expand in ascending order so the
/// predecessor chain reconstructs the lexicographically least shortest path.
fn precompute_paths(adjacency: &[Vec<u32>]) -> (Vec<Vec<u32>>, Vec<Vec<u32>>) {
    let n = adjacency.len();
    let mut dist = vec![vec![UNREACHABLE; n]; n];
    let mut pred = vec![vec![UNREACHABLE; n]; n];

    for src in 0..n {
        dist[src][src] = 0;
        let mut queue = VecDeque::new();
        queue.push_back(src as u32);

        while let Some(current) = queue.pop_front() {
            let cur = current as usize;
            for &nb in &adjacency[cur] {
                let nbu = nb as usize;
                if dist[src][nbu] == UNREACHABLE {
                    dist[src][nbu] = dist[src][cur] + 1;
                    pred[src][nbu] = current;
                    queue.push_back(nb);
                }
            }
        }
    }

    (dist, pred)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear() {
        let topo = Topology::linear(5);
        assert!(topo.coupled(0, 1));
        assert!(topo.coupled(1, 0));
        assert!(!topo.coupled(0, 2));
        assert_eq!(topo.distance(0, 4), Some(4));
        assert_eq!(topo.shortest_path(0, 3), Some(vec![0, 1, 2, 3]));
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let topo = Topology::new(3, [(0, 1), (1, 0), (0, 1), (2, 2)]);
        assert_eq!(topo.edges(), &[(0, 1)]);
    }

    #[test]
    fn test_disconnected() {
        let topo = Topology::new(4, [(0, 1), (2, 3)]);
        assert_eq!(topo.distance(0, 3), None);
        assert_eq!(topo.shortest_path(1, 2), None);
        assert!(!topo.all_connected(&[0, 2]));
        assert!(topo.all_connected(&[0, 1]));
    }

    #[test]
    fn test_lexicographic_tie_break() {
        // Two shortest paths 0→3: 0-1-3 and 0-2-3; BFS in ascending order
        // must pick 0-1-3.
        let topo = Topology::new(4, [(0, 1), (0, 2), (1, 3), (2, 3)]);
        assert_eq!(topo.shortest_path(0, 3), Some(vec![0, 1, 3]));
    }

    #[test]
    fn test_grid() {
        let topo = Topology::grid(3, 3);
        assert_eq!(topo.num_qubits(), 9);
        assert!(topo.coupled(0, 1));
        assert!(topo.coupled(0, 3));
        assert!(!topo.coupled(0, 4));
        assert_eq!(topo.distance(0, 8), Some(4));
    }

    #[test]
    fn test_ring() {
        let topo = Topology::ring(5);
        assert!(topo.coupled(4, 0));
        assert_eq!(topo.distance(0, 3), Some(2));
    }

    #[test]
    fn test_serde_roundtrip() {
        let topo = Topology::linear(4);
        let json = serde_json::to_string(&topo).unwrap();
        let back: Topology = serde_json::from_str(&json).unwrap();
        // Matrices are rebuilt on deserialization.
        assert_eq!(back.distance(0, 3), Some(3));
        assert_eq!(back.edges(), topo.edges());
    }
}
