use std::ops::Range;

use crate::INF;
use crate::error::Error;
use crate::error::Result;
use crate::graph::Graph;
use crate::paths::ShortestPaths;
use crate::solver;

/// Where a cross edge enters the destination's cycle.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Attachment {
    /// One extra cycle slot per incoming edge; in- and out-degree stay at most 2.
    #[default]
    Distributed,
    /// Every incoming edge enters the first virtual; only out-degree is bounded.
    FirstVirtual,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TransformOptions {
    pub attachment: Attachment,
}

/// A graph whose nodes are replaced by zero-weight cycles of virtual nodes.
///
/// For an original node `u`, the i-th virtual is the tail of `u`'s i-th
/// outgoing edge. With [`Attachment::Distributed`] the cycle also has one
/// entry slot per incoming edge. Virtual ids are dense and 1-based, and every
/// original node owns a contiguous range of them.
#[derive(Debug)]
pub struct DegreeBoundGraph {
    graph: Graph,
    virtuals: Vec<Range<u32>>,
    owner: Vec<u32>,
    attachment: Attachment,
}

pub fn transform(graph: &Graph) -> DegreeBoundGraph {
    transform_with(graph, TransformOptions::default())
}

pub fn transform_with(graph: &Graph, options: TransformOptions) -> DegreeBoundGraph {
    let slots = graph.slot_count();
    let mut in_deg = vec![0_usize; slots];
    for u in graph.nodes() {
        let (to, _) = graph.out_edge_slices(u);
        for &v in to {
            in_deg[v as usize] += 1;
        }
    }

    let mut virtuals = vec![0..0; slots];
    let mut next_id = 1_u32;
    for v in graph.nodes() {
        let width = match options.attachment {
            Attachment::Distributed => graph.out_degree(v) + in_deg[v],
            Attachment::FirstVirtual => graph.out_degree(v),
        }
        .max(1) as u32;
        virtuals[v] = next_id..next_id + width;
        next_id += width;
    }

    let virtual_count = (next_id - 1) as usize;
    let mut owner = vec![0_u32; virtual_count + 2];
    let mut edges = Vec::with_capacity(virtual_count + graph.edge_count());

    for v in graph.nodes() {
        let range = virtuals[v].clone();
        for id in range.clone() {
            owner[id as usize] = v as u32;
        }
        let len = range.end - range.start;
        if len <= 1 {
            continue;
        }
        for i in 0..len {
            edges.push((range.start + i, range.start + (i + 1) % len, 0_u64));
        }
    }

    let mut in_seen = vec![0_u32; slots];
    for u in graph.nodes() {
        let (to, weight) = graph.out_edge_slices(u);
        for i in 0..to.len() {
            let v = to[i] as usize;
            let tail = virtuals[u].start + i as u32;
            let head = match options.attachment {
                Attachment::Distributed => {
                    let slot = graph.out_degree(v) as u32 + in_seen[v];
                    in_seen[v] += 1;
                    virtuals[v].start + slot
                }
                Attachment::FirstVirtual => virtuals[v].start,
            };
            edges.push((tail, head, weight[i]));
        }
    }

    let transformed = Graph::from_edges(virtual_count, &edges);
    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        virtual_nodes = virtual_count,
        virtual_edges = transformed.edge_count(),
        attachment = ?options.attachment,
        "degree-bound transform"
    );

    DegreeBoundGraph {
        graph: transformed,
        virtuals,
        owner,
        attachment: options.attachment,
    }
}

impl DegreeBoundGraph {
    #[inline]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn attachment(&self) -> Attachment {
        self.attachment
    }

    pub fn original_node_count(&self) -> usize {
        self.virtuals.len() - 2
    }

    fn check_original(&self, v: usize) -> Result<()> {
        if (1..=self.original_node_count()).contains(&v) {
            Ok(())
        } else {
            Err(Error::UnknownNode {
                node: v,
                node_count: self.original_node_count(),
            })
        }
    }

    /// First virtual of `original`; where queries from it start.
    pub fn entry(&self, original: usize) -> Result<usize> {
        self.check_original(original)?;
        Ok(self.virtuals[original].start as usize)
    }

    pub fn virtual_ids(&self, original: usize) -> Result<impl Iterator<Item = usize> + '_> {
        self.check_original(original)?;
        Ok(self.virtuals[original].clone().map(|id| id as usize))
    }

    /// Original node owning `virtual_id`, if it is one.
    pub fn original_of(&self, virtual_id: usize) -> Option<usize> {
        if self.graph.contains(virtual_id) {
            Some(self.owner[virtual_id] as usize)
        } else {
            None
        }
    }

    /// Per original node, the smallest distance over its virtuals.
    pub fn project_distances(&self, transformed_dist: &[u64]) -> Vec<u64> {
        let mut dist = vec![INF; self.virtuals.len()];
        for (v, range) in self.virtuals.iter().enumerate() {
            for id in range.clone() {
                let d = transformed_dist.get(id as usize).copied().unwrap_or(INF);
                dist[v] = dist[v].min(d);
            }
        }
        dist
    }

    /// Maps a virtual path to original ids, collapsing walks around a cycle.
    pub fn translate_path(&self, path: &[usize]) -> Vec<usize> {
        let mut out: Vec<usize> = Vec::with_capacity(path.len());
        for &id in path {
            let Some(v) = self.original_of(id) else {
                continue;
            };
            if out.last() != Some(&v) {
                out.push(v);
            }
        }
        out
    }

    /// Runs the solver from `source` (an original id) over the transformed graph.
    pub fn solve(&self, source: usize) -> Result<Routes<'_>> {
        self.solve_with(source, &solver::SolverOptions::default())
    }

    pub fn solve_with(&self, source: usize, options: &solver::SolverOptions) -> Result<Routes<'_>> {
        let entry = self.entry(source)?;
        let paths = solver::solve_with::<solver::block_queue::BlockQueue>(&self.graph, entry, options)?;
        let distances = self.project_distances(paths.distances());
        Ok(Routes {
            graph: self,
            source,
            paths,
            distances,
        })
    }
}

/// A route between original nodes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Route {
    pub nodes: Vec<usize>,
    pub distance: u64,
    pub truncated: bool,
}

/// Solver output expressed in original ids.
#[derive(Debug)]
pub struct Routes<'a> {
    graph: &'a DegreeBoundGraph,
    source: usize,
    paths: ShortestPaths,
    distances: Vec<u64>,
}

impl Routes<'_> {
    pub fn source(&self) -> usize {
        self.source
    }

    /// Indexed by original id, `node_count + 2` long.
    pub fn distances(&self) -> &[u64] {
        &self.distances
    }

    pub fn distance(&self, target: usize) -> u64 {
        self.distances.get(target).copied().unwrap_or(INF)
    }

    /// The underlying run over virtual ids.
    pub fn virtual_paths(&self) -> &ShortestPaths {
        &self.paths
    }

    pub fn route(&self, target: usize) -> Result<Route> {
        let mut best: Option<(u64, usize)> = None;
        for id in self.graph.virtual_ids(target)? {
            let d = self.paths.distance(id);
            if best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, id));
            }
        }

        let distance = self.distance(target);
        let Some((_, exit)) = best.filter(|&(d, _)| d < INF) else {
            return Ok(Route {
                nodes: vec![target],
                distance,
                truncated: false,
            });
        };

        let path = self.paths.path_to(exit)?;
        Ok(Route {
            nodes: self.graph.translate_path(&path.nodes),
            distance,
            truncated: path.truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Attachment;
    use super::TransformOptions;
    use super::transform;
    use super::transform_with;
    use crate::baseline::dijkstra;
    use crate::graph::Graph;

    fn max_degrees(g: &Graph) -> (usize, usize) {
        let mut max_out = 0_usize;
        let mut in_deg = vec![0_usize; g.slot_count()];
        for u in g.nodes() {
            let (to, _) = g.out_edge_slices(u);
            max_out = max_out.max(to.len());
            for &v in to {
                in_deg[v as usize] += 1;
            }
        }
        (max_out, in_deg.into_iter().max().unwrap_or(0))
    }

    fn dense_graph(n: u32) -> Graph {
        let mut edges = Vec::new();
        for u in 1..=n {
            for v in 1..=n {
                if u != v && (u + v) % 7 == 0 {
                    edges.push((u, v, ((u * 7 + v) % 19) as u64));
                }
            }
        }
        Graph::from_edges(n as usize, &edges)
    }

    #[test]
    fn distributed_attachment_bounds_both_degrees() {
        let g = dense_graph(60);
        let t = transform(&g);
        let (max_out, max_in) = max_degrees(t.graph());
        assert!(max_out <= 2, "max_out={max_out}");
        assert!(max_in <= 2, "max_in={max_in}");
    }

    #[test]
    fn first_virtual_attachment_bounds_out_degree() {
        let g = dense_graph(60);
        let t = transform_with(
            &g,
            TransformOptions {
                attachment: Attachment::FirstVirtual,
            },
        );
        let (max_out, _) = max_degrees(t.graph());
        assert!(max_out <= 2, "max_out={max_out}");
        let expected: usize = g.nodes().map(|v| g.out_degree(v).max(1)).sum();
        assert_eq!(t.graph().node_count(), expected);
    }

    #[test]
    fn transform_preserves_distances() {
        let g = Graph::from_edges(
            6,
            &[(1, 2, 3), (1, 3, 2), (3, 2, 1), (2, 4, 7), (3, 4, 4), (4, 5, 5), (5, 1, 0)],
        );
        let original = dijkstra(&g, 1);
        for attachment in [Attachment::Distributed, Attachment::FirstVirtual] {
            let t = transform_with(&g, TransformOptions { attachment });
            let entry = t.entry(1).unwrap();
            let projected = t.project_distances(&dijkstra(t.graph(), entry));
            assert_eq!(projected, original, "{attachment:?}");
        }
    }

    #[test]
    fn virtual_ids_follow_edge_order() {
        let g = Graph::from_edges(3, &[(1, 2, 5), (1, 3, 6), (2, 3, 1)]);
        let t = transform(&g);
        // 1: two out-slots; 2: one out, one in; 3: two in-slots.
        assert_eq!(t.virtual_ids(1).unwrap().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(t.virtual_ids(2).unwrap().collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(t.virtual_ids(3).unwrap().collect::<Vec<_>>(), vec![5, 6]);
        assert_eq!(t.original_of(4), Some(2));
        assert_eq!(t.original_of(7), None);

        let tails: Vec<_> = t.graph().out_edges(1).map(|e| (e.to, e.weight)).collect();
        assert_eq!(tails, vec![(2, 0), (4, 5)]);
        let tails: Vec<_> = t.graph().out_edges(2).map(|e| (e.to, e.weight)).collect();
        assert_eq!(tails, vec![(1, 0), (5, 6)]);

        assert_eq!(t.translate_path(&[1, 2, 5, 6]), vec![1, 3]);
        assert!(t.entry(4).is_err());
    }

    #[test]
    fn isolated_nodes_get_one_virtual_without_self_loop() {
        let g = Graph::from_edges(2, &[]);
        let t = transform(&g);
        assert_eq!(t.graph().node_count(), 2);
        assert_eq!(t.graph().edge_count(), 0);
    }

    #[test]
    fn routes_are_reported_in_original_ids() {
        let g = Graph::from_edges(
            5,
            &[(1, 2, 4), (1, 3, 1), (3, 2, 1), (2, 4, 1), (3, 4, 5)],
        );
        let t = transform(&g);
        let routes = t.solve(1).unwrap();
        assert_eq!(routes.distance(4), 3);

        let route = routes.route(4).unwrap();
        assert_eq!(route.nodes, vec![1, 3, 2, 4]);
        assert_eq!(route.distance, 3);
        assert!(!route.truncated);

        let lonely = routes.route(5).unwrap();
        assert_eq!(lonely.nodes, vec![5]);
        assert_eq!(lonely.distance, crate::INF);
        assert!(routes.route(6).is_err());
    }
}
