//! Seeded synthetic workloads for tests and benchmarks.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rustc_hash::FxHashSet;

use crate::graph::Graph;

const C_MAX: u64 = 1_000_000_000;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum GraphCase {
    SparseRandom,
    DenseRandom,
    DenseZero,
    AlmostLine,
    GridRandom,
    /// Small weights in `0..=3`, so equal distances are everywhere.
    TieHeavy,
}

impl GraphCase {
    pub const ALL: [GraphCase; 6] = [
        GraphCase::SparseRandom,
        GraphCase::DenseRandom,
        GraphCase::DenseZero,
        GraphCase::AlmostLine,
        GraphCase::GridRandom,
        GraphCase::TieHeavy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::SparseRandom => "sparse_random",
            Self::DenseRandom => "dense_random",
            Self::DenseZero => "dense_zero",
            Self::AlmostLine => "almost_line",
            Self::GridRandom => "grid_random",
            Self::TieHeavy => "tie_heavy",
        }
    }
}

#[derive(Clone, Debug)]
pub struct GeneratedGraph {
    pub graph: Graph,
    pub source: usize,
    pub target: usize,
}

/// Builds roughly `size` nodes of the given shape. Node ids are 1-based.
pub fn generate_case(case: GraphCase, size: usize, seed: u64) -> GeneratedGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    match case {
        GraphCase::SparseRandom => random_case(&mut rng, size.max(32), 4, 0..=C_MAX),
        GraphCase::TieHeavy => random_case(&mut rng, size.max(32), 3, 0..=3),
        GraphCase::DenseRandom => dense_case(&mut rng, floor_sqrt(size).max(8), false),
        GraphCase::DenseZero => dense_case(&mut rng, floor_sqrt(size).max(8), true),
        GraphCase::AlmostLine => almost_line_case(&mut rng, size.max(64)),
        GraphCase::GridRandom => grid_case(&mut rng, size.max(64)),
    }
}

/// `m` distinct edges without self-loops over nodes `1..=n`.
pub fn random_graph(n: usize, m: usize, seed: u64) -> Graph {
    let mut rng = StdRng::seed_from_u64(seed);
    let m = m.min(complete_edges(n));
    let mut edges = Vec::with_capacity(m);
    let mut used = FxHashSet::default();
    while edges.len() < m {
        let u = rng.random_range(1..=n);
        let v = rng.random_range(1..=n);
        push_unique_edge(&mut edges, &mut used, u, v, rng.random_range(0..=1_000_000));
    }
    Graph::from_edges(n, &edges)
}

fn random_case(
    rng: &mut StdRng,
    n: usize,
    edge_factor: usize,
    weights: std::ops::RangeInclusive<u64>,
) -> GeneratedGraph {
    let m = n.saturating_mul(edge_factor).min(complete_edges(n));
    let mut edges = Vec::with_capacity(m);
    let mut used = FxHashSet::default();
    while edges.len() < m {
        let u = rng.random_range(1..=n);
        let v = rng.random_range(1..=n);
        push_unique_edge(&mut edges, &mut used, u, v, rng.random_range(weights.clone()));
    }
    finish(rng, n, edges)
}

fn dense_case(rng: &mut StdRng, n: usize, zero: bool) -> GeneratedGraph {
    let mut edges = Vec::with_capacity(complete_edges(n));
    for u in 1..=n {
        for v in 1..=n {
            if u != v {
                let w = if zero { 0 } else { rng.random_range(0..=C_MAX) };
                edges.push((u as u32, v as u32, w));
            }
        }
    }
    finish(rng, n, edges)
}

fn almost_line_case(rng: &mut StdRng, n: usize) -> GeneratedGraph {
    let mut edges = Vec::with_capacity(n * 2);
    let mut used = FxHashSet::default();
    for i in 1..n {
        push_unique_edge(&mut edges, &mut used, i, i + 1, rng.random_range(0..=C_MAX));
    }
    while edges.len() < 2 * n {
        let a = rng.random_range(1..=n - 2);
        let b = (a + rng.random_range(2..=3)).min(n);
        let (u, v) = if rng.random_bool(0.5) { (b, a) } else { (a, b) };
        push_unique_edge(&mut edges, &mut used, u, v, rng.random_range(0..=C_MAX));
    }

    let mut perm: Vec<usize> = (0..=n).collect();
    perm[1..].shuffle(rng);
    for edge in &mut edges {
        edge.0 = perm[edge.0 as usize] as u32;
        edge.1 = perm[edge.1 as usize] as u32;
    }
    edges.shuffle(rng);

    GeneratedGraph {
        graph: Graph::from_edges(n, &edges),
        source: perm[1],
        target: perm[n],
    }
}

fn grid_case(rng: &mut StdRng, size: usize) -> GeneratedGraph {
    let side = floor_sqrt(size).max(4);
    let n = side * side;
    let id = |row: usize, col: usize| (row * side + col + 1) as u32;
    let mut edges = Vec::with_capacity(n * 4);
    for row in 0..side {
        for col in 0..side {
            let here = id(row, col);
            let mut neighbours = Vec::with_capacity(4);
            if col + 1 < side {
                neighbours.push(id(row, col + 1));
            }
            if row + 1 < side {
                neighbours.push(id(row + 1, col));
            }
            if col > 0 {
                neighbours.push(id(row, col - 1));
            }
            if row > 0 {
                neighbours.push(id(row - 1, col));
            }
            for there in neighbours {
                edges.push((here, there, rng.random_range(0..=C_MAX)));
            }
        }
    }
    edges.shuffle(rng);
    finish(rng, n, edges)
}

fn finish(rng: &mut StdRng, n: usize, edges: Vec<(u32, u32, u64)>) -> GeneratedGraph {
    let source = rng.random_range(1..=n);
    let mut target = rng.random_range(1..=n);
    if source == target {
        target = target % n + 1;
    }
    GeneratedGraph {
        graph: Graph::from_edges(n, &edges),
        source,
        target,
    }
}

#[inline]
fn complete_edges(n: usize) -> usize {
    n.saturating_mul(n.saturating_sub(1))
}

#[inline]
fn floor_sqrt(value: usize) -> usize {
    (value as f64).sqrt().floor() as usize
}

#[inline]
fn push_unique_edge(
    edges: &mut Vec<(u32, u32, u64)>,
    used: &mut FxHashSet<(usize, usize)>,
    u: usize,
    v: usize,
    weight: u64,
) {
    if u != v && used.insert((u, v)) {
        edges.push((u as u32, v as u32, weight));
    }
}
