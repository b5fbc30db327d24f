use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;

use super::Outcome;
use super::context::Key;
use super::context::RunContext;

/// Bounded multi-source Dijkstra that settles at most `k + 1` vertices.
///
/// When the cap is hit, the last settled vertex defines the returned bound
/// and is handed back in the frontier together with whatever is still queued.
pub(crate) fn base_case(ctx: &mut RunContext<'_>, bound: Key, frontier: &[usize]) -> Outcome {
    ctx.stats.base_cases += 1;
    let k = ctx.params.k;
    let graph = ctx.graph;

    let mut heap = BinaryHeap::with_capacity(frontier.len().saturating_add(4));
    for &x in frontier {
        let key = ctx.key(x);
        if key < bound {
            heap.push(Reverse(key));
        }
    }

    let mut in_settled = FxHashSet::default();
    let mut settled: Vec<usize> = Vec::with_capacity(k + 1);

    while let Some(&Reverse(key)) = heap.peek() {
        if key >= bound {
            break;
        }
        heap.pop();
        let u = key.vertex as usize;
        if key != ctx.key(u) || !in_settled.insert(u) {
            continue;
        }
        settled.push(u);

        let (to, weight) = graph.out_edge_slices(u);
        for i in 0..to.len() {
            let v = to[i] as usize;
            let Some(next) = ctx.relax(u, v, weight[i]) else {
                continue;
            };
            if next < bound && !in_settled.contains(&v) {
                heap.push(Reverse(next));
            }
        }

        if settled.len() > k {
            break;
        }
    }

    let mut leftover = FxHashSet::default();
    let mut frontier = Vec::new();
    for Reverse(key) in heap.into_sorted_vec().into_iter().rev() {
        let v = key.vertex as usize;
        if key == ctx.key(v) && !in_settled.contains(&v) && leftover.insert(v) {
            frontier.push(v);
        }
    }

    if settled.len() <= k {
        return Outcome {
            bound,
            settled,
            frontier,
        };
    }

    // Settled in increasing key order, so the last one carries the maximum.
    let Some(last) = settled.pop() else {
        return Outcome {
            bound,
            settled,
            frontier,
        };
    };
    frontier.insert(0, last);
    Outcome {
        bound: ctx.key(last),
        settled,
        frontier,
    }
}

#[cfg(test)]
mod tests {
    use super::base_case;
    use crate::INF;
    use crate::graph::Graph;
    use crate::solver::context::Key;
    use crate::solver::context::RunContext;

    #[test]
    fn exhausted_region_keeps_bound() {
        let g = Graph::from_edges(3, &[(1, 2, 3), (2, 3, 100)]);
        let mut ctx = RunContext::new(&g, 1);
        let bound = Key::new(10, 0, 0);

        let out = base_case(&mut ctx, bound, &[1]);
        assert_eq!(out.bound, bound);
        assert_eq!(out.settled, vec![1, 2]);
        assert!(out.frontier.is_empty());
        // 2→3 is above the bound: relaxed but never queued.
        assert_eq!(ctx.dist[3], 103);
    }

    #[test]
    fn cap_splits_off_the_largest_settled_vertex() {
        let g = Graph::from_edges(5, &[(1, 2, 1), (1, 3, 2), (1, 4, 3), (1, 5, 4)]);
        let mut ctx = RunContext::new(&g, 1);
        assert_eq!(ctx.params.k, 2);

        let out = base_case(&mut ctx, Key::MAX, &[1]);
        assert_eq!(out.settled, vec![1, 2]);
        assert_eq!(out.bound, Key::new(2, 1, 3));
        assert_eq!(out.frontier, vec![3, 4, 5]);
        assert_eq!(ctx.dist[5], 4);
    }

    #[test]
    fn zero_weight_cycle_settles_each_vertex_once() {
        let g = Graph::from_edges(3, &[(1, 2, 0), (2, 1, 0), (2, 3, 0), (3, 2, 0)]);
        let mut ctx = RunContext::new(&g, 1);

        let out = base_case(&mut ctx, Key::MAX, &[1]);
        // Equal distances still get distinct keys through the hop count.
        assert_eq!(out.settled, vec![1, 2]);
        assert_eq!(out.bound, Key::new(0, 2, 3));
        assert_eq!(out.frontier, vec![3]);
        assert_eq!(&ctx.dist[1..4], &[0, 0, 0]);
        assert_eq!(ctx.dist[4], INF);
    }
}
