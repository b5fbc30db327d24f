use std::collections::BTreeMap;
use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use super::context::Key;
use super::queue::FrontierQueue;
use super::queue::Pulled;

#[derive(Debug, Default)]
struct Block {
    entries: Vec<(usize, Key)>,
}

/// Block-based partial-order queue with amortized batch prepends.
///
/// Keyed blocks live in a map ordered by tag. Every entry of a keyed block is
/// above the previous block's tag and at most its own tag, so walking blocks
/// in tag order visits entries in coarse sorted order. Prepended blocks are
/// unsorted and always gathered first.
///
/// Entries are never removed on decrease-key. An entry is live only while it
/// matches the vertex's recorded best key; anything else is skipped when met.
#[derive(Debug)]
pub struct BlockQueue {
    block_size: usize,
    bound: Key,
    prepended: VecDeque<Block>,
    keyed: BTreeMap<Key, Block>,
    best: FxHashMap<usize, Key>,
}

impl Default for BlockQueue {
    fn default() -> Self {
        Self {
            block_size: 1,
            bound: Key::MAX,
            prepended: VecDeque::new(),
            keyed: BTreeMap::new(),
            best: FxHashMap::default(),
        }
    }
}

impl BlockQueue {
    #[inline]
    fn improves(&self, vertex: usize, key: Key) -> bool {
        self.best.get(&vertex).is_none_or(|&old| key < old)
    }

    /// The empty block tagged with the global bound catches every key below it.
    fn ensure_sentinel(&mut self) {
        self.keyed.entry(self.bound).or_default();
    }

    /// Appends to the block with the smallest tag not below `key`.
    fn place(&mut self, vertex: usize, key: Key) {
        let overfull = match self.keyed.range_mut(key..).next() {
            Some((&tag, block)) => {
                block.entries.push((vertex, key));
                (block.entries.len() > self.block_size).then_some(tag)
            }
            None => {
                self.keyed.insert(
                    key,
                    Block {
                        entries: vec![(vertex, key)],
                    },
                );
                None
            }
        };
        if let Some(tag) = overfull {
            self.split(tag);
        }
    }

    /// Sorts an overfull block and bisects it, tagging each half by its own maximum.
    fn split(&mut self, tag: Key) {
        let Some(mut block) = self.keyed.remove(&tag) else {
            return;
        };
        let best = &self.best;
        block
            .entries
            .retain(|&(v, key)| best.get(&v) == Some(&key));

        if block.entries.len() <= self.block_size {
            if !block.entries.is_empty() {
                self.keyed.insert(tag, block);
            }
            self.ensure_sentinel();
            return;
        }

        block.entries.sort_unstable_by_key(|&(_, key)| key);
        let upper = block.entries.split_off(block.entries.len() / 2);
        self.attach(block.entries);
        self.attach(upper);
        self.ensure_sentinel();
    }

    /// Keys a sorted run by its last entry, merging into an existing block on a tag clash.
    fn attach(&mut self, entries: Vec<(usize, Key)>) {
        let Some(&(_, tag)) = entries.last() else {
            return;
        };
        self.keyed.entry(tag).or_default().entries.extend(entries);
    }

    /// Moves the live entries of `block` into `out`, returning how many moved.
    ///
    /// Each moved vertex loses its record, so a duplicate met later is stale.
    fn collect_live(&mut self, block: Block, out: &mut Vec<(usize, Key)>) -> usize {
        let mut moved = 0;
        for (v, key) in block.entries {
            if self.best.get(&v) == Some(&key) {
                self.best.remove(&v);
                out.push((v, key));
                moved += 1;
            }
        }
        moved
    }

    fn clear_blocks(&mut self) {
        self.prepended.clear();
        self.keyed.clear();
        self.ensure_sentinel();
    }
}

impl FrontierQueue for BlockQueue {
    fn initialize(&mut self, block_size: usize, bound: Key) {
        self.block_size = block_size.max(1);
        self.bound = bound;
        self.best.clear();
        self.clear_blocks();
    }

    fn insert(&mut self, vertex: usize, key: Key) {
        if !self.improves(vertex, key) {
            return;
        }
        self.best.insert(vertex, key);
        self.place(vertex, key);
    }

    fn batch_prepend(&mut self, items: &[(usize, Key)]) {
        let mut fresh = Vec::with_capacity(items.len());
        for &(vertex, key) in items {
            if self.improves(vertex, key) {
                self.best.insert(vertex, key);
                fresh.push((vertex, key));
            }
        }
        for chunk in fresh.chunks(self.block_size).rev() {
            self.prepended.push_front(Block {
                entries: chunk.to_vec(),
            });
        }
    }

    fn pull(&mut self) -> Pulled {
        if self.best.is_empty() {
            self.clear_blocks();
            return Pulled {
                vertices: Vec::new(),
                bound: self.bound,
            };
        }

        let m = self.block_size;
        let mut gathered = Vec::new();
        for block in std::mem::take(&mut self.prepended) {
            self.collect_live(block, &mut gathered);
        }
        let mut keyed_live = 0_usize;
        while keyed_live <= m {
            let Some((_, block)) = self.keyed.pop_first() else {
                break;
            };
            keyed_live += self.collect_live(block, &mut gathered);
        }

        gathered.sort_unstable_by_key(|&(_, key)| key);
        if gathered.len() <= m {
            self.clear_blocks();
            return Pulled {
                vertices: gathered.into_iter().map(|(v, _)| v).collect(),
                bound: self.bound,
            };
        }

        let rest = gathered.split_off(m);
        let bound = rest[0].1;
        self.ensure_sentinel();
        for (v, key) in rest {
            self.best.insert(v, key);
            self.place(v, key);
        }

        Pulled {
            vertices: gathered.into_iter().map(|(v, _)| v).collect(),
            bound,
        }
    }

    fn drain(&mut self) -> Vec<usize> {
        let mut live = Vec::with_capacity(self.best.len());
        for block in std::mem::take(&mut self.prepended) {
            self.collect_live(block, &mut live);
        }
        for (_, block) in std::mem::take(&mut self.keyed) {
            self.collect_live(block, &mut live);
        }
        self.best.clear();
        self.clear_blocks();
        live.sort_unstable_by_key(|&(_, key)| key);
        live.into_iter().map(|(v, _)| v).collect()
    }

    fn is_empty(&self) -> bool {
        self.best.is_empty()
    }
}
