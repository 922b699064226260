//! `INLINE_VECTORS`: the raw `f32 * D` payload (§4.3). The simplest feature —
//! no codebook, no per-node side channel, just the node's own vector.

use std::io::Write;

use crate::codec::{write_f32_array, write_i32, ByteSource, Cursor};
use crate::error::{AnnError, AnnResult};
use crate::feature::FeatureView;
use crate::graph::SourceGraph;

use super::{DecodedVector, FeaturePayload};

/// Write-side `INLINE_VECTORS`: holds the source graph's vectors by
/// reference so `write_inline` can look one up by original node id.
pub struct InlineVectorsWriter<'g> {
    graph: &'g SourceGraph,
    dimension: usize,
}

impl<'g> InlineVectorsWriter<'g> {
    pub fn new(graph: &'g SourceGraph, dimension: usize) -> Self {
        Self { graph, dimension }
    }
}

impl FeaturePayload for InlineVectorsWriter<'_> {
    fn header_size(&self) -> usize {
        // A redundant, feature-private declaration of D (§4.3) — the common
        // header already carries D, but each feature is self-describing.
        4
    }

    fn inline_size(&self) -> usize {
        4 * self.dimension
    }

    fn write_header(&self, out: &mut dyn Write) -> AnnResult<()> {
        write_i32(out, self.dimension as i32)
    }

    fn write_inline(
        &self,
        orig_id: u64,
        out: &mut dyn Write,
        _neighbor_orig_ids: &[u64],
    ) -> AnnResult<()> {
        let vector = self.graph.vector(orig_id).ok_or_else(|| {
            AnnError::precondition(format!("node {orig_id} has no vector for INLINE_VECTORS"))
        })?;
        write_f32_array(out, vector)
    }
}

/// Read-side `INLINE_VECTORS`: remembers the declared dimension, nothing
/// else — there is no per-file header block beyond that.
#[derive(Debug, Clone, Copy)]
pub struct InlineVectorsView {
    dimension: usize,
}

impl InlineVectorsView {
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Decode the raw vector at the feature's inline offset within a node's
    /// record. `cursor` must already be positioned at the start of this
    /// feature's slot.
    pub fn read_inline<S: ByteSource + ?Sized>(
        &self,
        cursor: &mut Cursor<S>,
    ) -> AnnResult<DecodedVector> {
        Ok(DecodedVector(cursor.read_f32_array(self.dimension)?))
    }
}

impl<S: ByteSource + ?Sized> FeatureView<S> for InlineVectorsView {
    fn load_header(cursor: &mut Cursor<S>, dimension: i32, _max_degree: i32) -> AnnResult<Self> {
        let declared = cursor.read_i32()?;
        if declared != dimension {
            return Err(AnnError::format(format!(
                "INLINE_VECTORS header declares D={declared}, common header says D={dimension}"
            )));
        }
        Ok(Self {
            dimension: dimension as usize,
        })
    }
}

impl InlineVectorsView {
    pub fn inline_size(&self) -> usize {
        4 * self.dimension
    }
}
