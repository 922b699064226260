//! `GraphCache` (§4.8): a pinned hot-node cache layered over an
//! [`OnDiskView`]. The pinning BFS walks exactly the teacher's
//! `bfs_traverse` shape (visited set, FIFO queue, depth/result bounds) but
//! over plain neighbor adjacency instead of typed edges, since the on-disk
//! graph has no edge-type dimension.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::codec::ByteSource;
use crate::error::AnnResult;
use crate::view::OnDiskView;

/// An immutable, eagerly-decoded snapshot of one pinned node: its neighbor
/// ordinals and (if present) its INLINE_VECTORS vector.
#[derive(Debug, Clone)]
pub struct PinnedNode {
    pub neighbors: Vec<i32>,
    pub vector: Option<Vec<f32>>,
}

/// Wraps a [`OnDiskView`] with a set of eagerly-pinned hot nodes. Misses
/// fall through to the wrapped view; pinned entries are immutable snapshots
/// that are never evicted (§4.8 — eviction policy beyond "never evict
/// pinned" is out of scope for correctness).
pub struct GraphCache<S: ByteSource + ?Sized> {
    view: OnDiskView<S>,
    pinned: HashMap<u32, PinnedNode>,
}

impl<S: ByteSource + ?Sized> GraphCache<S> {
    /// Wrap `view` with no pinned nodes yet.
    pub fn new(view: OnDiskView<S>) -> Self {
        Self {
            view,
            pinned: HashMap::new(),
        }
    }

    /// BFS from `start` up to `max_nodes` nodes, pinning each visited node's
    /// neighbor list and (if available) its vector.
    pub fn pin_bfs(&mut self, start: u32, max_nodes: usize) -> AnnResult<()> {
        if max_nodes == 0 {
            return Ok(());
        }
        let has_vectors = self.view.dimension() > 0
            && self
                .view
                .vector(start)
                .map(|_| true)
                .unwrap_or(false);

        let mut visited: HashSet<u32> = HashSet::new();
        let mut queue: VecDeque<u32> = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            if self.pinned.len() >= max_nodes {
                break;
            }

            let neighbors: Vec<i32> = self.view.neighbors(current)?.collect();
            let vector = if has_vectors {
                self.view.vector(current).ok()
            } else {
                None
            };
            self.pinned.insert(current, PinnedNode { neighbors: neighbors.clone(), vector });

            for &n in &neighbors {
                if n < 0 {
                    continue;
                }
                let n = n as u32;
                if visited.insert(n) {
                    if self.pinned.len() + queue.len() >= max_nodes {
                        continue;
                    }
                    queue.push_back(n);
                }
            }
        }

        log::debug!("pinned {} nodes starting from {start}", self.pinned.len());
        Ok(())
    }

    /// Number of currently pinned nodes.
    pub fn pinned_count(&self) -> usize {
        self.pinned.len()
    }

    /// Whether `k` is pinned.
    pub fn is_pinned(&self, k: u32) -> bool {
        self.pinned.contains_key(&k)
    }

    /// Neighbor ordinals of node `k`, served from the pin if present,
    /// otherwise falling through to the wrapped view.
    pub fn neighbors(&mut self, k: u32) -> AnnResult<Vec<i32>> {
        if let Some(pinned) = self.pinned.get(&k) {
            return Ok(pinned.neighbors.clone());
        }
        Ok(self.view.neighbors(k)?.collect())
    }

    /// INLINE_VECTORS vector of node `k`, served from the pin if present,
    /// otherwise falling through to the wrapped view.
    pub fn vector(&mut self, k: u32) -> AnnResult<Vec<f32>> {
        if let Some(pinned) = self.pinned.get(&k) {
            if let Some(vector) = &pinned.vector {
                return Ok(vector.clone());
            }
        }
        self.view.vector(k)
    }

    /// Borrow the wrapped view directly, e.g. to build a reranker or
    /// approximate scorer.
    pub fn view_mut(&mut self) -> &mut OnDiskView<S> {
        &mut self.view
    }
}
