use crate::INF;
use crate::error::Error;
use crate::error::Result;
use crate::solver::context::NO_PARENT;
use crate::solver::context::Params;
use crate::solver::context::RunStats;

/// Node ids from the source to a target.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Path {
    pub nodes: Vec<usize>,
    /// Set when the parent walk hit its step cap or a dangling parent.
    pub truncated: bool,
}

/// Distances and parent links from one run.
#[derive(Clone, Debug)]
pub struct ShortestPaths {
    source: usize,
    dist: Vec<u64>,
    parent: Vec<u32>,
    params: Params,
    stats: RunStats,
    path_slack: usize,
}

impl ShortestPaths {
    pub(crate) fn new(
        source: usize,
        dist: Vec<u64>,
        parent: Vec<u32>,
        params: Params,
        stats: RunStats,
        path_slack: usize,
    ) -> Self {
        Self {
            source,
            dist,
            parent,
            params,
            stats,
            path_slack,
        }
    }

    pub fn source(&self) -> usize {
        self.source
    }

    fn node_count(&self) -> usize {
        self.dist.len().saturating_sub(2)
    }

    /// Indexed by node id, `node_count + 2` long; `INF` marks unreached nodes.
    pub fn distances(&self) -> &[u64] {
        &self.dist
    }

    pub fn into_distances(self) -> Vec<u64> {
        self.dist
    }

    pub fn distance(&self, target: usize) -> u64 {
        self.dist.get(target).copied().unwrap_or(INF)
    }

    pub fn is_reachable(&self, target: usize) -> bool {
        self.distance(target) < INF
    }

    pub fn parent(&self, v: usize) -> Option<usize> {
        match self.parent.get(v) {
            Some(&p) if p != NO_PARENT => Some(p as usize),
            _ => None,
        }
    }

    pub fn params(&self) -> Params {
        self.params
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Walks parents back from `target`.
    ///
    /// An unreachable target, like the source itself, yields `[target]`.
    pub fn path_to(&self, target: usize) -> Result<Path> {
        let node_count = self.node_count();
        if !(1..=node_count).contains(&target) {
            return Err(Error::UnknownNode {
                node: target,
                node_count,
            });
        }
        if !self.is_reachable(target) {
            return Ok(Path {
                nodes: vec![target],
                truncated: false,
            });
        }

        let max_steps = node_count.saturating_add(self.path_slack);
        let mut nodes = vec![target];
        let mut cur = target;
        let mut truncated = false;
        while cur != self.source {
            let Some(p) = self.parent(cur) else {
                truncated = true;
                break;
            };
            if nodes.len() > max_steps {
                truncated = true;
                break;
            }
            nodes.push(p);
            cur = p;
        }

        if truncated {
            tracing::warn!(target, steps = nodes.len(), "path reconstruction stopped early");
        }
        nodes.reverse();
        Ok(Path { nodes, truncated })
    }
}

#[cfg(test)]
mod tests {
    use super::Path;
    use super::ShortestPaths;
    use crate::INF;
    use crate::solver::context::NO_PARENT;
    use crate::solver::context::Params;
    use crate::solver::context::RunStats;

    fn paths(dist: Vec<u64>, parent: Vec<u32>, slack: usize) -> ShortestPaths {
        let n = dist.len() - 2;
        ShortestPaths::new(
            1,
            dist,
            parent,
            Params::for_node_count(n),
            RunStats::default(),
            slack,
        )
    }

    #[test]
    fn walks_parents_to_the_source() {
        let p = paths(
            vec![INF, 0, 2, 1, 3, INF, INF],
            vec![NO_PARENT, NO_PARENT, 3, 1, 2, NO_PARENT, NO_PARENT],
            1_000,
        );
        assert_eq!(
            p.path_to(4).unwrap(),
            Path {
                nodes: vec![1, 3, 2, 4],
                truncated: false
            }
        );
        assert_eq!(p.path_to(1).unwrap().nodes, vec![1]);
        assert_eq!(p.path_to(5).unwrap().nodes, vec![5]);
        assert!(p.path_to(6).is_err());
        assert!(p.path_to(0).is_err());
    }

    #[test]
    fn parent_cycle_is_cut_off() {
        // 2 and 3 point at each other and never reach the source.
        let p = paths(
            vec![INF, 0, 1, 1, INF],
            vec![NO_PARENT, NO_PARENT, 3, 2, NO_PARENT],
            4,
        );
        let path = p.path_to(3).unwrap();
        assert!(path.truncated);
        assert_eq!(path.nodes.len(), 3 + 4 + 1);
    }
}
