mod base_case;
pub(crate) mod block_queue;
pub(crate) mod context;
mod find_pivots;
pub(crate) mod queue;

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Instant;

use rustc_hash::FxHashSet;

use crate::INF;
use crate::error::Error;
use crate::error::Result;
use crate::graph::Graph;
use crate::paths::ShortestPaths;

use base_case::base_case;
use block_queue::BlockQueue;
use context::Key;
use context::RunContext;
use find_pivots::Pivots;
use find_pivots::find_pivots;
use queue::FrontierQueue;
use queue::Pulled;

/// What one recursive call hands back to its caller.
#[derive(Debug)]
pub(crate) struct Outcome {
    pub(crate) bound: Key,
    pub(crate) settled: Vec<usize>,
    /// Touched but not settled; the caller may queue these again.
    pub(crate) frontier: Vec<usize>,
}

#[derive(Clone, Debug)]
pub struct SolverOptions {
    /// Extra steps allowed when walking parents beyond the node count.
    pub path_slack: usize,
    /// Check every edge after the recursion and repair what is still relaxable.
    ///
    /// A level that breaks out on its stall guard leaves its queued vertices
    /// in the returned frontier. At the top level nothing picks them up again,
    /// so with `audit` off their labels stay as the recursion left them;
    /// `RunStats::stall_breaks` counts how often that happened.
    pub audit: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            path_slack: 1_000,
            audit: true,
        }
    }
}

/// Shortest paths from `source` with the block queue and default options.
pub fn solve(graph: &Graph, source: usize) -> Result<ShortestPaths> {
    solve_with::<BlockQueue>(graph, source, &SolverOptions::default())
}

pub fn solve_with<Q>(graph: &Graph, source: usize, options: &SolverOptions) -> Result<ShortestPaths>
where
    Q: FrontierQueue + Default,
{
    if !graph.contains(source) {
        return Err(Error::UnknownNode {
            node: source,
            node_count: graph.node_count(),
        });
    }

    let started = Instant::now();
    let mut engine = Engine::<Q>::new(graph, source);
    let params = engine.ctx.params;
    engine.bmssp(params.max_level, Key::MAX, &[source]);

    let mut ctx = engine.ctx;
    if options.audit {
        let repaired = repair_fixpoint(&mut ctx);
        if repaired > 0 {
            tracing::warn!(repaired, "relaxable edges left after recursion; repaired");
        }
    }
    ctx.stats.total_time = started.elapsed();

    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        k = params.k,
        t = params.t,
        max_level = params.max_level,
        calls = ctx.stats.recursive_calls,
        base_cases = ctx.stats.base_cases,
        pulls = ctx.stats.pulls,
        relaxations = ctx.stats.relaxations,
        elapsed_ms = ctx.stats.total_time.as_secs_f64() * 1e3,
        "bmssp finished"
    );

    Ok(ShortestPaths::new(
        source,
        ctx.dist,
        ctx.parent,
        params,
        ctx.stats,
        options.path_slack,
    ))
}

struct Engine<'g, Q> {
    ctx: RunContext<'g>,
    queues: Vec<Option<Q>>,
}

impl<'g, Q> Engine<'g, Q>
where
    Q: FrontierQueue + Default,
{
    fn new(graph: &'g Graph, source: usize) -> Self {
        let ctx = RunContext::new(graph, source);
        let queues = (0..=ctx.params.max_level).map(|_| None).collect();
        Self { ctx, queues }
    }

    fn bmssp(&mut self, level: usize, bound: Key, frontier: &[usize]) -> Outcome {
        self.ctx.stats.recursive_calls += 1;
        tracing::trace!(level, frontier = frontier.len(), bound = bound.dist, "bmssp call");

        if frontier.is_empty() {
            return Outcome {
                bound,
                settled: Vec::new(),
                frontier: Vec::new(),
            };
        }
        if level == 0 {
            return base_case(&mut self.ctx, bound, frontier);
        }

        let Pivots { pivots, reached } = find_pivots(&mut self.ctx, bound, frontier);

        let mut queue = self.queues[level].take().unwrap_or_default();
        queue.initialize(self.ctx.params.block_size(level), bound);
        for &p in &pivots {
            let key = self.ctx.key(p);
            if key < bound {
                queue.insert(p, key);
            }
        }

        let limit = self.ctx.params.settle_limit(level);
        let stall_limit = self.ctx.graph.node_count();
        let mut settled = Vec::new();
        let mut in_settled = FxHashSet::default();
        let mut last_bound = bound;
        let mut idle_rounds = 0_usize;
        let mut batch_keys = Vec::new();

        while !queue.is_empty() && settled.len() < limit {
            let pull_started = Instant::now();
            let Pulled {
                vertices,
                bound: sub_bound,
            } = queue.pull();
            self.ctx.stats.pulls += 1;
            self.ctx.stats.pull_time += pull_started.elapsed();

            if vertices.is_empty() {
                last_bound = last_bound.min(sub_bound);
                break;
            }
            let batch: Vec<usize> = vertices
                .into_iter()
                .filter(|v| !in_settled.contains(v))
                .collect();
            if batch.is_empty() {
                continue;
            }

            let child = self.bmssp(level - 1, sub_bound, &batch);

            let mut fresh = Vec::with_capacity(child.settled.len());
            for &u in &child.settled {
                if in_settled.insert(u) {
                    settled.push(u);
                    fresh.push(u);
                }
            }
            if fresh.is_empty() {
                idle_rounds += 1;
            } else {
                idle_rounds = 0;
            }

            let relax_started = Instant::now();
            batch_keys.clear();
            for &v in &child.frontier {
                if in_settled.contains(&v) {
                    continue;
                }
                let key = self.ctx.key(v);
                if key < sub_bound {
                    batch_keys.push((v, key));
                } else if key < bound {
                    queue.insert(v, key);
                }
                self.ctx.stats.frontier_reinserts += 1;
            }

            let graph = self.ctx.graph;
            for &u in &fresh {
                let (to, weight) = graph.out_edge_slices(u);
                for i in 0..to.len() {
                    let v = to[i] as usize;
                    let Some(key) = self.ctx.relax(u, v, weight[i]) else {
                        continue;
                    };
                    if in_settled.contains(&v) {
                        continue;
                    }
                    if key < sub_bound {
                        batch_keys.push((v, key));
                    } else if key < bound {
                        queue.insert(v, key);
                    }
                }
            }

            for &x in &batch {
                if in_settled.contains(&x) {
                    continue;
                }
                let key = self.ctx.key(x);
                if key < sub_bound {
                    batch_keys.push((x, key));
                }
            }

            if !batch_keys.is_empty() {
                self.ctx.stats.batch_prepends += 1;
                queue.batch_prepend(&batch_keys);
            }
            self.ctx.stats.relax_time += relax_started.elapsed();
            last_bound = child.bound;

            if idle_rounds > stall_limit {
                self.ctx.stats.stall_breaks += 1;
                tracing::warn!(level, idle_rounds, "no progress at this level; returning the rest as frontier");
                break;
            }
        }

        let final_bound = if queue.is_empty() && settled.len() < limit {
            bound
        } else {
            last_bound.min(bound)
        };

        for &w in &reached {
            if !in_settled.contains(&w) && self.ctx.key(w) < final_bound {
                in_settled.insert(w);
                settled.push(w);
            }
        }

        let mut seen = FxHashSet::default();
        let mut frontier = Vec::new();
        for v in queue.drain().into_iter().chain(reached) {
            if !in_settled.contains(&v) && seen.insert(v) {
                frontier.push(v);
            }
        }

        self.queues[level] = Some(queue);
        Outcome {
            bound: final_bound,
            settled,
            frontier,
        }
    }
}

/// Label-correcting pass from every vertex with a still-relaxable out-edge.
///
/// Returns how many distance labels it lowered.
fn repair_fixpoint(ctx: &mut RunContext<'_>) -> u64 {
    let graph = ctx.graph;
    let mut heap = BinaryHeap::new();
    for u in graph.nodes() {
        let d = ctx.dist[u];
        if d >= INF {
            continue;
        }
        let violated = graph
            .out_edges(u)
            .any(|e| d.saturating_add(e.weight) < ctx.dist[e.to as usize]);
        if violated {
            heap.push(Reverse((d, u)));
        }
    }

    let mut repaired = 0_u64;
    while let Some(Reverse((d, u))) = heap.pop() {
        if d != ctx.dist[u] {
            continue;
        }
        for edge in graph.out_edges(u) {
            let v = edge.to as usize;
            let cand = d.saturating_add(edge.weight);
            if cand < ctx.dist[v] && cand < INF {
                ctx.dist[v] = cand;
                ctx.hops[v] = ctx.hops[u].saturating_add(1);
                ctx.parent[v] = u as u32;
                repaired += 1;
                heap.push(Reverse((cand, v)));
            }
        }
    }

    ctx.stats.repaired = repaired;
    repaired
}

#[cfg(test)]
mod tests {
    use super::Engine;
    use super::SolverOptions;
    use super::block_queue::BlockQueue;
    use super::context::Key;
    use super::queue::ReferenceQueue;
    use super::repair_fixpoint;
    use super::solve_with;
    use crate::INF;
    use crate::baseline::dijkstra;
    use crate::error::Error;
    use crate::graph::Graph;

    fn no_audit() -> SolverOptions {
        SolverOptions {
            audit: false,
            ..SolverOptions::default()
        }
    }

    #[test]
    fn recursion_alone_settles_small_graphs() {
        let g = Graph::from_edges(
            5,
            &[(1, 2, 4), (1, 3, 1), (3, 2, 1), (2, 4, 1), (3, 4, 5)],
        );
        let got = solve_with::<BlockQueue>(&g, 1, &no_audit()).unwrap();
        assert_eq!(got.distances(), dijkstra(&g, 1).as_slice());
        assert_eq!(got.stats().repaired, 0);
    }

    #[test]
    fn top_call_settles_every_reachable_vertex() {
        let g = Graph::from_edges(
            6,
            &[(1, 2, 0), (2, 3, 0), (3, 1, 0), (3, 4, 2), (4, 5, 0), (5, 4, 0)],
        );
        let mut engine = Engine::<ReferenceQueue>::new(&g, 1);
        let level = engine.ctx.params.max_level;
        let out = engine.bmssp(level, Key::MAX, &[1]);

        let mut settled = out.settled.clone();
        settled.sort_unstable();
        assert_eq!(settled, vec![1, 2, 3, 4, 5]);
        assert_eq!(out.bound, Key::MAX);
        assert!(out.frontier.is_empty());
        assert_eq!(engine.ctx.dist[6], INF);
    }

    #[test]
    fn repair_lowers_stale_labels() {
        let g = Graph::from_edges(3, &[(1, 2, 5), (2, 3, 1)]);
        let mut engine = Engine::<BlockQueue>::new(&g, 1);
        engine.ctx.dist[2] = 9;
        engine.ctx.hops[2] = 1;
        engine.ctx.parent[2] = 1;
        engine.ctx.dist[3] = 10;
        engine.ctx.hops[3] = 2;
        engine.ctx.parent[3] = 2;

        assert_eq!(repair_fixpoint(&mut engine.ctx), 2);
        assert_eq!(&engine.ctx.dist[1..4], &[0, 5, 6]);
        assert_eq!(engine.ctx.stats.repaired, 2);
        assert_eq!(repair_fixpoint(&mut engine.ctx), 0);
    }

    #[test]
    fn unknown_source_is_an_error() {
        let g = Graph::from_edges(2, &[(1, 2, 1)]);
        let err = solve_with::<BlockQueue>(&g, 3, &SolverOptions::default()).unwrap_err();
        assert_eq!(
            err,
            Error::UnknownNode {
                node: 3,
                node_count: 2
            }
        );
        assert!(solve_with::<BlockQueue>(&g, 0, &SolverOptions::default()).is_err());
    }
}
