use std::ops::RangeInclusive;

/// Presentation data carried alongside a node. Never read by the solvers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Edge {
    pub to: u32,
    pub weight: u64,
}

/// Directed graph in CSR form over dense node ids `1..=node_count`.
///
/// Slots `0` and `node_count + 1` exist but never carry edges, so every
/// per-node array used by the solvers has `node_count + 2` entries and can be
/// indexed by node id directly. Out-edges keep their insertion order.
#[derive(Clone, Debug)]
pub struct Graph {
    node_count: usize,
    offsets: Vec<usize>,
    to: Vec<u32>,
    weight: Vec<u64>,
    coordinates: Vec<Option<Coordinate>>,
}

impl Graph {
    /// Builds a graph from `(from, to, weight)` triples. Edges touching an id
    /// outside `1..=node_count` are dropped.
    pub fn from_edges(node_count: usize, edges: &[(u32, u32, u64)]) -> Self {
        let mut builder = GraphBuilder::new(node_count);
        for &(from, to, weight) in edges {
            builder.add_edge(from, to, weight);
        }
        builder.build()
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Length of every per-node array: `node_count + 2`.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.node_count + 2
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.to.len()
    }

    #[inline]
    pub fn contains(&self, v: usize) -> bool {
        (1..=self.node_count).contains(&v)
    }

    pub fn nodes(&self) -> RangeInclusive<usize> {
        1..=self.node_count
    }

    #[inline]
    pub fn out_degree(&self, v: usize) -> usize {
        self.offsets[v + 1] - self.offsets[v]
    }

    #[inline]
    pub fn out_edges(&self, v: usize) -> OutEdges<'_> {
        let (to, weight) = self.out_edge_slices(v);
        OutEdges { to, weight, idx: 0 }
    }

    #[inline]
    pub fn out_edge_slices(&self, v: usize) -> (&[u32], &[u64]) {
        let start = self.offsets[v];
        let end = self.offsets[v + 1];
        (&self.to[start..end], &self.weight[start..end])
    }

    pub fn coordinate(&self, v: usize) -> Option<Coordinate> {
        self.coordinates.get(v).copied().flatten()
    }

    pub fn edges_vec(&self) -> Vec<(u32, u32, u64)> {
        let mut edges = Vec::with_capacity(self.edge_count());
        for u in self.nodes() {
            for edge in self.out_edges(u) {
                edges.push((u as u32, edge.to, edge.weight));
            }
        }
        edges
    }
}

/// Collects nodes and edges before freezing them into a [`Graph`].
#[derive(Clone, Debug)]
pub struct GraphBuilder {
    node_count: usize,
    edges: Vec<(u32, u32, u64)>,
    coordinates: Vec<Option<Coordinate>>,
    dropped_edges: usize,
}

impl GraphBuilder {
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            edges: Vec::new(),
            coordinates: Vec::new(),
            dropped_edges: 0,
        }
    }

    /// Number of edges rejected so far because an endpoint was unknown.
    pub fn dropped_edges(&self) -> usize {
        self.dropped_edges
    }

    fn contains(&self, v: u32) -> bool {
        v >= 1 && (v as usize) <= self.node_count
    }

    /// Returns `false` (and stores nothing) when `v` is not a node.
    pub fn set_coordinate(&mut self, v: u32, coordinate: Coordinate) -> bool {
        if !self.contains(v) {
            return false;
        }
        if self.coordinates.is_empty() {
            self.coordinates = vec![None; self.node_count + 2];
        }
        self.coordinates[v as usize] = Some(coordinate);
        true
    }

    /// Returns `false` when either endpoint is not a node; the edge is dropped.
    pub fn add_edge(&mut self, from: u32, to: u32, weight: u64) -> bool {
        if !self.contains(from) || !self.contains(to) {
            self.dropped_edges += 1;
            tracing::trace!(from, to, weight, "dropping edge with unknown endpoint");
            return false;
        }
        self.edges.push((from, to, weight));
        true
    }

    pub fn build(self) -> Graph {
        let slots = self.node_count + 2;
        let mut out_deg = vec![0_usize; slots];
        for &(from, _, _) in &self.edges {
            out_deg[from as usize] += 1;
        }

        let mut offsets = vec![0_usize; slots + 1];
        for v in 0..slots {
            offsets[v + 1] = offsets[v] + out_deg[v];
        }

        let mut to = vec![0_u32; self.edges.len()];
        let mut weight = vec![0_u64; self.edges.len()];
        let mut cursor = offsets[..slots].to_vec();

        for &(from, dst, w) in &self.edges {
            let idx = cursor[from as usize];
            cursor[from as usize] += 1;
            to[idx] = dst;
            weight[idx] = w;
        }

        if self.dropped_edges > 0 {
            tracing::debug!(
                dropped = self.dropped_edges,
                kept = self.edges.len(),
                "graph built with dropped edges"
            );
        }

        Graph {
            node_count: self.node_count,
            offsets,
            to,
            weight,
            coordinates: self.coordinates,
        }
    }
}

pub struct OutEdges<'a> {
    to: &'a [u32],
    weight: &'a [u64],
    idx: usize,
}

impl Iterator for OutEdges<'_> {
    type Item = Edge;

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.to.len() {
            return None;
        }
        let edge = Edge {
            to: self.to[self.idx],
            weight: self.weight[self.idx],
        };
        self.idx += 1;
        Some(edge)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remain = self.to.len() - self.idx;
        (remain, Some(remain))
    }
}

impl ExactSizeIterator for OutEdges<'_> {}

#[cfg(test)]
mod tests {
    use super::Coordinate;
    use super::Graph;
    use super::GraphBuilder;

    #[test]
    fn out_edges_keep_insertion_order() {
        let g = Graph::from_edges(3, &[(1, 3, 5), (2, 1, 1), (1, 2, 7), (1, 3, 2)]);
        let targets: Vec<_> = g.out_edges(1).map(|e| (e.to, e.weight)).collect();
        assert_eq!(targets, vec![(3, 5), (2, 7), (3, 2)]);
        assert_eq!(g.out_degree(2), 1);
        assert_eq!(g.out_degree(3), 0);
        assert_eq!(g.edge_count(), 4);
        assert_eq!(g.slot_count(), 5);
    }

    #[test]
    fn edges_with_unknown_endpoints_are_dropped() {
        let mut builder = GraphBuilder::new(2);
        assert!(builder.add_edge(1, 2, 4));
        assert!(!builder.add_edge(0, 1, 1));
        assert!(!builder.add_edge(2, 3, 1));
        assert_eq!(builder.dropped_edges(), 2);

        let g = builder.build();
        assert_eq!(g.edges_vec(), vec![(1, 2, 4)]);
        assert_eq!(g.out_degree(0), 0);
        assert_eq!(g.out_degree(3), 0);
    }

    #[test]
    fn coordinates_are_optional() {
        let mut builder = GraphBuilder::new(2);
        let at = Coordinate {
            lat: 40.7,
            lon: -74.0,
        };
        assert!(builder.set_coordinate(2, at));
        assert!(!builder.set_coordinate(5, at));
        let g = builder.build();
        assert_eq!(g.coordinate(1), None);
        assert_eq!(g.coordinate(2), Some(at));
        assert_eq!(g.coordinate(9), None);
    }
}
