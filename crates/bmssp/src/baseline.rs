//! Plain binary-heap Dijkstra, used as the correctness oracle.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::INF;
use crate::graph::Graph;

/// Distances from `source` to every node, indexed by node id (`INF` when unreached).
pub fn dijkstra(graph: &Graph, source: usize) -> Vec<u64> {
    let mut dist = vec![INF; graph.slot_count()];
    if !graph.contains(source) {
        return dist;
    }

    let mut heap = BinaryHeap::new();
    dist[source] = 0;
    heap.push(Reverse((0_u64, source)));

    while let Some(Reverse((d, u))) = heap.pop() {
        if d != dist[u] {
            continue;
        }

        for edge in graph.out_edges(u) {
            let v = edge.to as usize;
            let cand = d.saturating_add(edge.weight).min(INF);
            if cand < dist[v] {
                dist[v] = cand;
                heap.push(Reverse((cand, v)));
            }
        }
    }

    dist
}

/// Distance from `source` to `target`, stopping as soon as `target` is settled.
pub fn dijkstra_to(graph: &Graph, source: usize, target: usize) -> u64 {
    if !graph.contains(source) || !graph.contains(target) {
        return INF;
    }

    let mut dist = vec![INF; graph.slot_count()];
    let mut heap = BinaryHeap::new();
    dist[source] = 0;
    heap.push(Reverse((0_u64, source)));

    while let Some(Reverse((d, u))) = heap.pop() {
        if d != dist[u] {
            continue;
        }
        if u == target {
            return d;
        }

        for edge in graph.out_edges(u) {
            let v = edge.to as usize;
            let cand = d.saturating_add(edge.weight).min(INF);
            if cand < dist[v] {
                dist[v] = cand;
                heap.push(Reverse((cand, v)));
            }
        }
    }

    INF
}
