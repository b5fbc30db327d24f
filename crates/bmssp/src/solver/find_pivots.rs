use std::time::Instant;

use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;

use super::context::Key;
use super::context::RunContext;

#[derive(Debug)]
pub(crate) struct Pivots {
    /// Frontier members rooting at least `k` reached vertices.
    pub(crate) pivots: Vec<usize>,
    /// Every vertex reached below the bound, frontier included.
    pub(crate) reached: Vec<usize>,
}

/// Runs up to `k` layered relaxation rounds from `frontier` and picks pivots.
///
/// Gives up early and returns the whole frontier as pivots once more than
/// `k·|frontier|` vertices are reached. The same fallback applies when no
/// frontier member roots a large enough local tree.
pub(crate) fn find_pivots(ctx: &mut RunContext<'_>, bound: Key, frontier: &[usize]) -> Pivots {
    let started = Instant::now();
    ctx.stats.pivot_searches += 1;
    let k = ctx.params.k;
    let graph = ctx.graph;

    let mut sources = FxHashSet::default();
    let mut roots = Vec::with_capacity(frontier.len());
    for &x in frontier {
        if sources.insert(x) {
            roots.push(x);
        }
    }

    let mut in_reached = sources.clone();
    let mut reached = roots.clone();
    let mut local_pred: FxHashMap<usize, usize> = FxHashMap::default();
    let limit = k.saturating_mul(roots.len());

    let mut layer = roots.clone();
    let mut next = Vec::new();
    let mut in_next = FxHashSet::default();
    let mut overflow = false;

    for _ in 0..k {
        next.clear();
        in_next.clear();

        for &u in &layer {
            let (to, weight) = graph.out_edge_slices(u);
            for i in 0..to.len() {
                let v = to[i] as usize;
                let Some(key) = ctx.relax(u, v, weight[i]) else {
                    continue;
                };
                local_pred.insert(v, u);
                if key < bound {
                    if in_next.insert(v) {
                        next.push(v);
                    }
                    if in_reached.insert(v) {
                        reached.push(v);
                    }
                }
            }
        }

        if reached.len() > limit {
            overflow = true;
            break;
        }
        if next.is_empty() {
            break;
        }
        std::mem::swap(&mut layer, &mut next);
    }

    let pivots = if overflow {
        roots.clone()
    } else {
        let mut subtree: FxHashMap<usize, usize> = FxHashMap::default();
        for &w in &reached {
            let mut cur = w;
            for _ in 0..=k + 1 {
                if sources.contains(&cur) {
                    *subtree.entry(cur).or_default() += 1;
                    break;
                }
                match local_pred.get(&cur) {
                    Some(&p) => cur = p,
                    None => break,
                }
            }
        }

        let chosen: Vec<usize> = roots
            .iter()
            .copied()
            .filter(|s| subtree.get(s).copied().unwrap_or(0) >= k)
            .collect();
        if chosen.is_empty() {
            ctx.stats.pivot_fallbacks += 1;
            roots.clone()
        } else {
            chosen
        }
    };

    ctx.stats.pivot_time += started.elapsed();
    Pivots { pivots, reached }
}
