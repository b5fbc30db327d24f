pub mod baseline;
pub mod degree_bound;
pub mod dimacs;
mod error;
pub mod generator;
pub mod graph;
mod paths;
mod solver;

pub use degree_bound::Attachment;
pub use degree_bound::DegreeBoundGraph;
pub use degree_bound::Route;
pub use degree_bound::Routes;
pub use degree_bound::TransformOptions;
pub use error::Error;
pub use error::Result;
pub use graph::Coordinate;
pub use graph::Edge;
pub use graph::Graph;
pub use graph::GraphBuilder;
pub use paths::Path;
pub use paths::ShortestPaths;
pub use solver::SolverOptions;
pub use solver::block_queue::BlockQueue;
pub use solver::context::Key;
pub use solver::context::Params;
pub use solver::context::RunStats;
pub use solver::queue::FrontierQueue;
pub use solver::queue::Pulled;
pub use solver::queue::ReferenceQueue;
pub use solver::solve;
pub use solver::solve_with;

pub const INF: u64 = u64::MAX / 4;
