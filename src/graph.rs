//! `SourceGraph`: the in-memory, write-side input to the [`crate::writer::Writer`]
//! (§3 "SourceGraph (expansion)"). It is the external collaborator's output —
//! a builder or search-engine-side graph construction routine hands one of
//! these to the writer — not part of the persisted artifact itself.

use std::collections::HashSet;

use crate::error::{AnnError, AnnResult};

/// One node in the in-memory proximity graph: a vector, a neighbor list (in
/// the *source* id space, not yet renumbered), and a tombstone flag.
#[derive(Debug, Clone)]
struct SourceNode {
    vector: Vec<f32>,
    neighbors: Vec<u64>,
    tombstoned: bool,
}

/// The in-memory graph a builder assembles and hands to the [`crate::writer::Writer`].
/// Node ids are a dense `[0, next_id)` range assigned on insert, mirroring the
/// teacher's `MemoryGraph` (`nodes: Vec<_>`, sequential `next_id`, `from_parts`
/// reconstruction), generalized from cognitive events to ANN nodes.
pub struct SourceGraph {
    nodes: Vec<SourceNode>,
    dimension: usize,
}

impl SourceGraph {
    /// An empty graph over `dimension`-wide vectors.
    pub fn new(dimension: usize) -> Self {
        Self {
            nodes: Vec::new(),
            dimension,
        }
    }

    /// Reconstruct a graph directly from parts, e.g. for tests or a loader
    /// that already has dense ids. Mirrors the teacher's `from_parts`.
    pub fn from_parts(vectors: Vec<Vec<f32>>, neighbors: Vec<Vec<u64>>) -> AnnResult<Self> {
        if vectors.len() != neighbors.len() {
            return Err(AnnError::precondition(
                "vectors and neighbors must have the same length",
            ));
        }
        let dimension = vectors.first().map(|v| v.len()).unwrap_or(0);
        let nodes = vectors
            .into_iter()
            .zip(neighbors)
            .map(|(vector, neighbors)| SourceNode {
                vector,
                neighbors,
                tombstoned: false,
            })
            .collect();
        Ok(Self { nodes, dimension })
    }

    /// The vector dimension every node's vector must match.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Total number of nodes, live and tombstoned.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of live (non-tombstoned) nodes.
    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.tombstoned).count()
    }

    /// Add a node with the given vector and neighbor list, returning its id.
    pub fn add_node(&mut self, vector: Vec<f32>, neighbors: Vec<u64>) -> AnnResult<u64> {
        if vector.len() != self.dimension {
            return Err(AnnError::precondition(format!(
                "vector length {} does not match graph dimension {}",
                vector.len(),
                self.dimension
            )));
        }
        let id = self.nodes.len() as u64;
        self.nodes.push(SourceNode {
            vector,
            neighbors,
            tombstoned: false,
        });
        Ok(id)
    }

    /// Mark a node as deleted. It remains in the id space — and must be
    /// [`Self::cleanup`]'d before the graph can be written (§4.6).
    pub fn tombstone(&mut self, id: u64) -> AnnResult<()> {
        let node = self.node_mut(id)?;
        node.tombstoned = true;
        Ok(())
    }

    /// Whether a node is present but tombstoned.
    pub fn is_tombstoned(&self, id: u64) -> bool {
        self.nodes
            .get(id as usize)
            .map(|n| n.tombstoned)
            .unwrap_or(false)
    }

    /// Whether any node in the graph is tombstoned — the Writer's first
    /// precondition (§4.6: "Run cleanup before writing").
    pub fn has_tombstones(&self) -> bool {
        self.nodes.iter().any(|n| n.tombstoned)
    }

    /// Drop tombstoned nodes and scrub references to them from every
    /// remaining node's neighbor list, satisfying the "cleaned of tombstones"
    /// lifecycle step (§3) before a Writer ever sees the graph.
    pub fn cleanup(&mut self) {
        let dead: HashSet<u64> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.tombstoned)
            .map(|(i, _)| i as u64)
            .collect();
        if dead.is_empty() {
            return;
        }

        let mut id_remap = vec![None; self.nodes.len()];
        let mut next = 0u64;
        for (old_id, node) in self.nodes.iter().enumerate() {
            if !node.tombstoned {
                id_remap[old_id] = Some(next);
                next += 1;
            }
        }

        let mut remaining = Vec::with_capacity(next as usize);
        for (old_id, mut node) in std::mem::take(&mut self.nodes).into_iter().enumerate() {
            if dead.contains(&(old_id as u64)) {
                continue;
            }
            node.neighbors.retain(|n| !dead.contains(n));
            node.neighbors = node
                .neighbors
                .iter()
                .map(|&n| id_remap[n as usize].expect("neighbor survives cleanup"))
                .collect();
            remaining.push(node);
        }
        self.nodes = remaining;
    }

    /// Every live node id, in ascending order.
    pub fn live_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.tombstoned)
            .map(|(i, _)| i as u64)
    }

    /// The upper bound of the id space — every live id is `< id_upper_bound()`.
    pub fn id_upper_bound(&self) -> u64 {
        self.nodes.len() as u64
    }

    /// A node's vector, if it exists (tombstoned or not).
    pub fn vector(&self, id: u64) -> Option<&[f32]> {
        self.nodes.get(id as usize).map(|n| n.vector.as_slice())
    }

    /// A node's neighbor list in the source id space, if it exists.
    pub fn neighbors(&self, id: u64) -> Option<&[u64]> {
        self.nodes.get(id as usize).map(|n| n.neighbors.as_slice())
    }

    fn node_mut(&mut self, id: u64) -> AnnResult<&mut SourceNode> {
        self.nodes
            .get_mut(id as usize)
            .ok_or_else(|| AnnError::precondition(format!("no such node {id}")))
    }
}
