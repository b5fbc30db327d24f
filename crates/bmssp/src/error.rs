use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// A query named an id outside `1..=node_count`.
    #[error("node {node} is not in the graph (valid ids are 1..={node_count})")]
    UnknownNode { node: usize, node_count: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
