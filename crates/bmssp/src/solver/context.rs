use std::cmp::Ordering;
use std::time::Duration;

use crate::INF;
use crate::graph::Graph;

pub(crate) const NO_PARENT: u32 = u32::MAX;

/// Total order on tentative distances: `(dist, hops, vertex)`.
///
/// `hops` is the edge count of the vertex's current tentative path. Comparing
/// whole keys instead of bare distances makes every tentative value distinct,
/// which is what bounds, pulls and block splits rely on.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Key {
    pub dist: u64,
    pub hops: u32,
    pub vertex: u32,
}

impl Key {
    /// Above every reachable key; the bound of the top-level call.
    pub const MAX: Key = Key {
        dist: u64::MAX,
        hops: u32::MAX,
        vertex: u32::MAX,
    };

    pub const fn new(dist: u64, hops: u32, vertex: u32) -> Self {
        Self { dist, hops, vertex }
    }
}

/// Recursion parameters derived from the vertex count.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Params {
    pub k: usize,
    pub t: usize,
    pub max_level: usize,
}

impl Params {
    pub fn for_node_count(n: usize) -> Self {
        let lg = (n.max(2) as f64).log2();
        let k = (lg.cbrt().round() as usize).max(2);
        let t = (lg.powf(2.0 / 3.0).round() as usize).max(2);
        let max_level = (lg / t as f64).ceil() as usize + 1;
        Self { k, t, max_level }
    }

    /// Pull size `M = 2^((level-1)·t)` of the queue used at `level >= 1`.
    pub fn block_size(&self, level: usize) -> usize {
        pow2_saturating(level.saturating_sub(1).saturating_mul(self.t))
    }

    /// `k·2^(level·t) + 1`: how many vertices one call at `level` may settle.
    pub fn settle_limit(&self, level: usize) -> usize {
        self.k
            .saturating_mul(pow2_saturating(level.saturating_mul(self.t)))
            .saturating_add(1)
    }
}

#[inline]
pub(crate) fn pow2_saturating(exp: usize) -> usize {
    if exp >= usize::BITS as usize {
        usize::MAX
    } else {
        1_usize << exp
    }
}

/// Counters and timings of a single run.
#[derive(Clone, Debug, Default)]
pub struct RunStats {
    pub recursive_calls: u64,
    pub base_cases: u64,
    pub pivot_searches: u64,
    pub pivot_fallbacks: u64,
    pub pulls: u64,
    pub relaxations: u64,
    pub batch_prepends: u64,
    pub frontier_reinserts: u64,
    pub stall_breaks: u64,
    pub repaired: u64,
    pub pivot_time: Duration,
    pub pull_time: Duration,
    pub relax_time: Duration,
    pub total_time: Duration,
}

/// State shared by every call of one top-level computation.
pub(crate) struct RunContext<'g> {
    pub(crate) graph: &'g Graph,
    pub(crate) dist: Vec<u64>,
    pub(crate) hops: Vec<u32>,
    pub(crate) parent: Vec<u32>,
    pub(crate) params: Params,
    pub(crate) stats: RunStats,
}

impl<'g> RunContext<'g> {
    pub(crate) fn new(graph: &'g Graph, source: usize) -> Self {
        let slots = graph.slot_count();
        let mut dist = vec![INF; slots];
        let mut hops = vec![u32::MAX; slots];
        if graph.contains(source) {
            dist[source] = 0;
            hops[source] = 0;
        }
        Self {
            graph,
            dist,
            hops,
            parent: vec![NO_PARENT; slots],
            params: Params::for_node_count(graph.node_count()),
            stats: RunStats::default(),
        }
    }

    #[inline]
    pub(crate) fn key(&self, v: usize) -> Key {
        Key::new(self.dist[v], self.hops[v], v as u32)
    }

    /// Relaxes `u -> v` with the label rule shared by every component.
    ///
    /// The candidate label `(dist[u] + w, hops[u] + 1, u)` is accepted when it
    /// is not above `v`'s current `(dist, hops, parent)`. A smaller label
    /// replaces the current one; an equal one leaves it untouched. Returns
    /// `v`'s key on acceptance.
    #[inline]
    pub(crate) fn relax(&mut self, u: usize, v: usize, weight: u64) -> Option<Key> {
        self.stats.relaxations += 1;
        let base = self.dist[u];
        if base >= INF {
            return None;
        }
        let dist = base.saturating_add(weight);
        if dist >= INF {
            return None;
        }
        let hops = self.hops[u].saturating_add(1);
        let candidate = (dist, hops, u as u32);
        let current = (self.dist[v], self.hops[v], self.parent[v]);
        match candidate.cmp(&current) {
            Ordering::Less => {
                self.dist[v] = dist;
                self.hops[v] = hops;
                self.parent[v] = u as u32;
                Some(Key::new(dist, hops, v as u32))
            }
            Ordering::Equal => Some(Key::new(dist, hops, v as u32)),
            Ordering::Greater => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Key;
    use super::NO_PARENT;
    use super::Params;
    use super::RunContext;
    use crate::INF;
    use crate::graph::Graph;

    #[test]
    fn params_floor_at_two() {
        for n in [0, 1, 2, 3, 16] {
            let p = Params::for_node_count(n);
            assert!(p.k >= 2 && p.t >= 2, "n={n} {p:?}");
            assert!(p.max_level >= 2, "n={n} {p:?}");
        }
        assert_eq!(
            Params::for_node_count(1_024),
            Params {
                k: 2,
                t: 5,
                max_level: 3
            }
        );
        assert_eq!(
            Params::for_node_count(1 << 20),
            Params {
                k: 3,
                t: 7,
                max_level: 4
            }
        );
    }

    #[test]
    fn limits_saturate() {
        let p = Params::for_node_count(1 << 20);
        assert_eq!(p.block_size(1), 1);
        assert_eq!(p.block_size(2), 1 << 7);
        assert_eq!(p.settle_limit(1), 3 * (1 << 7) + 1);
        assert_eq!(p.block_size(100), usize::MAX);
        assert_eq!(p.settle_limit(100), usize::MAX);
    }

    #[test]
    fn keys_order_by_distance_then_hops_then_vertex() {
        assert!(Key::new(1, 9, 9) < Key::new(2, 0, 0));
        assert!(Key::new(1, 1, 9) < Key::new(1, 2, 0));
        assert!(Key::new(1, 1, 1) < Key::new(1, 1, 2));
        assert!(Key::new(INF, u32::MAX, 7) < Key::MAX);
    }

    #[test]
    fn relax_accepts_equal_labels_without_changes() {
        let g = Graph::from_edges(3, &[(1, 2, 0), (2, 1, 0), (1, 3, 4)]);
        let mut ctx = RunContext::new(&g, 1);

        assert_eq!(ctx.relax(1, 2, 0), Some(Key::new(0, 1, 2)));
        assert_eq!(ctx.parent[2], 1);
        assert_eq!(ctx.relax(1, 2, 0), Some(Key::new(0, 1, 2)));
        // The zero-weight edge back to the source never wins.
        assert_eq!(ctx.relax(2, 1, 0), None);
        assert_eq!(ctx.parent[1], NO_PARENT);

        assert_eq!(ctx.relax(3, 2, 0), None);
        assert_eq!(ctx.relax(1, 3, 4), Some(Key::new(4, 1, 3)));
        assert_eq!(ctx.relax(2, 3, 4), None);
        assert_eq!(ctx.relax(2, 3, 3), Some(Key::new(3, 2, 3)));
        assert_eq!(ctx.parent[3], 2);
    }
}
