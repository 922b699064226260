//! `OrdinalMapper` (§4.5): the bijection from source-graph node ids to dense
//! `[0, N)` ordinals. Represented as a dense array when the source id space
//! is bounded (always true here, since [`crate::graph::SourceGraph`] assigns
//! dense ids itself), per the source-to-Rust design note in §9.

use crate::error::{AnnError, AnnResult};
use crate::graph::SourceGraph;

/// A total, injective mapping from source node ids to dense `[0, N)`
/// ordinals.
#[derive(Debug, Clone)]
pub struct OrdinalMapping {
    /// `old_to_new[old_id as usize]` is `old_id`'s ordinal, or `None` if
    /// `old_id` names a tombstoned/absent node not covered by this mapping.
    old_to_new: Vec<Option<u32>>,
    n: usize,
}

impl OrdinalMapping {
    /// Build a mapping directly from an old-id -> new-ordinal table, e.g. a
    /// user-supplied spatial reordering (§4.5). Every present entry must be
    /// injective and the table validated against graph size at
    /// [`crate::writer::WriterBuilder::build`] time, not here.
    pub fn from_table(old_to_new: Vec<Option<u32>>) -> Self {
        let n = old_to_new.iter().filter(|v| v.is_some()).count();
        Self { old_to_new, n }
    }

    /// Number of entries this mapping assigns an ordinal to.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// The ordinal `old_id` maps to, if any.
    pub fn get(&self, old_id: u64) -> Option<u32> {
        self.old_to_new.get(old_id as usize).copied().flatten()
    }

    /// The largest assigned ordinal, or `None` if the mapping is empty.
    pub fn max_ordinal(&self) -> Option<u32> {
        self.old_to_new.iter().flatten().max().copied()
    }

    /// Whether every assigned ordinal is distinct (injective). The Writer
    /// checks this — together with size and surjectivity onto `[0, N)` — as
    /// a precondition (§4.6).
    pub fn is_injective(&self) -> bool {
        let mut seen = vec![false; self.n];
        for ordinal in self.old_to_new.iter().flatten() {
            let idx = *ordinal as usize;
            if idx >= seen.len() || seen[idx] {
                return false;
            }
            seen[idx] = true;
        }
        true
    }

    /// Build the new-ordinal -> old-id inversion the Writer drives its
    /// record-emission loop from (§4.6 step 3). Ordinals must be a
    /// surjective `[0, N)` range for this to succeed.
    pub fn invert(&self) -> AnnResult<Vec<u64>> {
        let mut inverted = vec![None; self.n];
        for (old_id, ordinal) in self.old_to_new.iter().enumerate() {
            if let Some(ordinal) = ordinal {
                let slot = inverted.get_mut(*ordinal as usize).ok_or_else(|| {
                    AnnError::precondition(format!("ordinal {ordinal} out of range [0, {})", self.n))
                })?;
                if slot.replace(old_id as u64).is_some() {
                    return Err(AnnError::precondition(format!(
                        "ordinal {ordinal} assigned to more than one node"
                    )));
                }
            }
        }
        inverted
            .into_iter()
            .enumerate()
            .map(|(ordinal, old_id)| {
                old_id.ok_or_else(|| {
                    AnnError::precondition(format!(
                        "ordinal {ordinal} has no assigned node (mapping not surjective onto [0, N))"
                    ))
                })
            })
            .collect()
    }
}

/// `getSequentialRenumbering` (§4.5): scans live node ids in ascending order
/// and assigns the next dense ordinal to each, so the mapping is monotonic
/// (`i < j ⇒ map[i] < map[j]`) in addition to total and injective.
pub fn sequential(graph: &SourceGraph) -> OrdinalMapping {
    let mut table = vec![None; graph.id_upper_bound() as usize];
    let mut next = 0u32;
    for old_id in graph.live_ids() {
        table[old_id as usize] = Some(next);
        next += 1;
    }
    OrdinalMapping::from_table(table)
}
