use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use super::context::Key;

/// Result of [`FrontierQueue::pull`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Pulled {
    /// Up to `M` vertices, smallest keys first.
    pub vertices: Vec<usize>,
    /// Strict upper bound on the pulled keys and lower bound on what remains.
    pub bound: Key,
}

/// Priority structure used by one recursion level.
///
/// Each vertex has at most one live entry: its best key so far. Inserting a
/// key that is not below the recorded best does nothing. Pulled vertices lose
/// their record and may be inserted again.
pub trait FrontierQueue {
    /// Resets to an empty structure with pull size `block_size` and global `bound`.
    fn initialize(&mut self, block_size: usize, bound: Key);

    fn insert(&mut self, vertex: usize, key: Key);

    /// Inserts items whose keys are all below everything currently held.
    fn batch_prepend(&mut self, items: &[(usize, Key)]);

    /// Removes up to `M` smallest vertices.
    ///
    /// If everything left fits, the returned bound is the global one; otherwise
    /// it is the smallest key left behind.
    fn pull(&mut self) -> Pulled;

    /// Empties the structure, returning every vertex still held.
    fn drain(&mut self) -> Vec<usize>;

    fn is_empty(&self) -> bool;
}

/// Ordered-set implementation of [`FrontierQueue`]; the reference for [`BlockQueue`].
///
/// [`BlockQueue`]: super::block_queue::BlockQueue
#[derive(Debug)]
pub struct ReferenceQueue {
    block_size: usize,
    bound: Key,
    entries: BTreeSet<(Key, usize)>,
    best: FxHashMap<usize, Key>,
}

impl Default for ReferenceQueue {
    fn default() -> Self {
        Self {
            block_size: 1,
            bound: Key::MAX,
            entries: BTreeSet::new(),
            best: FxHashMap::default(),
        }
    }
}

impl FrontierQueue for ReferenceQueue {
    fn initialize(&mut self, block_size: usize, bound: Key) {
        self.block_size = block_size.max(1);
        self.bound = bound;
        self.entries.clear();
        self.best.clear();
    }

    fn insert(&mut self, vertex: usize, key: Key) {
        if let Some(&old) = self.best.get(&vertex) {
            if key >= old {
                return;
            }
            self.entries.remove(&(old, vertex));
        }
        self.best.insert(vertex, key);
        self.entries.insert((key, vertex));
    }

    fn batch_prepend(&mut self, items: &[(usize, Key)]) {
        for &(vertex, key) in items {
            self.insert(vertex, key);
        }
    }

    fn pull(&mut self) -> Pulled {
        if self.entries.len() <= self.block_size {
            self.best.clear();
            let vertices = std::mem::take(&mut self.entries)
                .into_iter()
                .map(|(_, v)| v)
                .collect();
            return Pulled {
                vertices,
                bound: self.bound,
            };
        }

        let mut vertices = Vec::new();
        while vertices.len() < self.block_size {
            let Some((_, v)) = self.entries.pop_first() else {
                break;
            };
            self.best.remove(&v);
            vertices.push(v);
        }
        let bound = self
            .entries
            .first()
            .map_or(self.bound, |&(key, _)| key);
        Pulled { vertices, bound }
    }

    fn drain(&mut self) -> Vec<usize> {
        self.best.clear();
        std::mem::take(&mut self.entries)
            .into_iter()
            .map(|(_, v)| v)
            .collect()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
