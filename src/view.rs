//! `OnDiskView` (§4.7): a random-access reader over a sealed artifact.
//! Grounded on the teacher's `MmapReader` (one `Mmap`, header parsed once,
//! every accessor computes a byte range and slices directly) plus the
//! `other_examples` DiskANN `MmapIndex`'s zero-copy `vector()` pattern.

use std::fs::File;
use std::sync::Arc;

use crate::codec::{ByteSource, Cursor, MmapSource, SliceSource};
use crate::error::{AnnError, AnnResult};
use crate::feature::DecodedVector;
use crate::header::Header;
use crate::similarity::Similarity;

/// A bounded iterator over one node's neighbor ordinals, backed by a
/// preallocated scratch buffer (§4.7: "All reads of variable-size data use
/// the preallocated neighbor buffer of length M").
pub struct NeighborIter<'a> {
    ids: std::slice::Iter<'a, i32>,
}

impl Iterator for NeighborIter<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        self.ids.next().copied()
    }
}

impl ExactSizeIterator for NeighborIter<'_> {
    fn len(&self) -> usize {
        self.ids.len()
    }
}

/// A random-access view over one sealed artifact (§4.7). Not thread-safe —
/// each concurrent caller must open its own view via [`OnDiskView::open`] or
/// duplicate a [`Cursor`] (§5). States: Open (every method below works)
/// until [`OnDiskView::close`], after which only `close` itself (a no-op) is
/// valid.
pub struct OnDiskView<S: ByteSource + ?Sized> {
    cursor: Option<Cursor<S>>,
    header: Header,
    base_offset: u64,
    neighbor_scratch: Vec<i32>,
}

impl OnDiskView<MmapSource> {
    /// Open a sealed artifact file, memory-mapping it for zero-copy reads —
    /// the default path, following the teacher's `MmapReader::open`.
    pub fn open(path: &std::path::Path) -> AnnResult<Self> {
        let file = File::open(path)?;
        let source = MmapSource::open(&file)?;
        Self::open_with(Arc::new(source), 0)
    }
}

impl OnDiskView<SliceSource> {
    /// Open an in-memory artifact, e.g. one just written in a test without
    /// touching disk.
    pub fn open_slice(bytes: impl Into<Box<[u8]>>) -> AnnResult<Self> {
        Self::open_with(Arc::new(SliceSource::new(bytes)), 0)
    }
}

impl<S: ByteSource + ?Sized> OnDiskView<S> {
    /// Open a view over any [`ByteSource`], starting the header at
    /// `base_offset` (normally 0). The non-mmap entry point the teacher
    /// mirrors with its `AmemReader` (plain `Read`) vs `MmapReader` split.
    pub fn open_with(source: Arc<S>, base_offset: u64) -> AnnResult<Self> {
        let mut cursor = Cursor::new(source);
        let header = Header::read_from(&mut cursor, base_offset)?;
        let max_degree = header.common.m as usize;
        log::debug!(
            "opened view: n={} d={} m={} entry_node={}",
            header.common.n,
            header.common.d,
            header.common.m,
            header.common.entry_node
        );
        Ok(Self {
            cursor: Some(cursor),
            header,
            base_offset,
            neighbor_scratch: Vec::with_capacity(max_degree),
        })
    }

    fn cursor_mut(&mut self) -> AnnResult<&mut Cursor<S>> {
        self.cursor
            .as_mut()
            .ok_or_else(|| AnnError::format("view is closed"))
    }

    /// Number of nodes, `N`.
    pub fn size(&self) -> usize {
        self.header.common.n as usize
    }

    /// The entry node's ordinal.
    pub fn entry_node(&self) -> u32 {
        self.header.common.entry_node as u32
    }

    /// `M`, the fixed upper bound on neighbors per node.
    pub fn max_degree(&self) -> usize {
        self.header.common.m as usize
    }

    /// `D`, the vector dimension (0 if neither INLINE_VECTORS nor LVQ is
    /// present).
    pub fn dimension(&self) -> usize {
        self.header.common.d as usize
    }

    /// The artifact's format version (0 for a version-0 artifact).
    pub fn version(&self) -> u32 {
        self.header.common.version
    }

    /// Whether FUSED_ADC is present in this artifact.
    pub fn has_fused_adc(&self) -> bool {
        self.header
            .features
            .iter()
            .any(|f| f.as_fused_adc().is_some())
    }

    fn record_offset(&self, k: u32) -> u64 {
        self.base_offset + self.header.header_size + k as u64 * self.header.record_size()
    }

    fn neighbors_offset(&self, k: u32) -> u64 {
        self.record_offset(k) + 4 + self.header.feature_inline_total() as u64
    }

    fn check_ordinal(&self, k: u32) -> AnnResult<()> {
        if k as i64 >= self.header.common.n as i64 {
            return Err(AnnError::format(format!(
                "ordinal {k} out of range [0, {})",
                self.header.common.n
            )));
        }
        Ok(())
    }

    /// `getNeighbors(k)` (§4.7): seek to the node's neighbor slot, read and
    /// validate the count, and return a bounded iterator over the stored
    /// ordinals. Every neighbor id is in `[0, N)`; `-1` padding past `count`
    /// is not yielded.
    pub fn neighbors(&mut self, k: u32) -> AnnResult<NeighborIter<'_>> {
        self.check_ordinal(k)?;
        self.check_sanity_ordinal(k)?;
        let offset = self.neighbors_offset(k);
        let max_degree = self.max_degree();
        let n = self.size();

        let cursor = self.cursor_mut()?;
        cursor.seek(offset);

        let count = cursor.read_i32()?;
        if !(0..=max_degree as i32).contains(&count) {
            return Err(AnnError::format(format!(
                "neighborCount {count} exceeds maxDegree {max_degree}"
            )));
        }
        let count = count as usize;

        self.neighbor_scratch.clear();
        cursor.read_i32_array(&mut self.neighbor_scratch, max_degree)?;
        for (i, &id) in self.neighbor_scratch.iter().enumerate() {
            let valid = id == -1 || (0..n as i32).contains(&id);
            if !valid {
                return Err(AnnError::format(format!(
                    "neighbor slot {i} of node {k} has out-of-range id {id}"
                )));
            }
            if i < count && id == -1 {
                return Err(AnnError::format(format!(
                    "neighbor slot {i} of node {k} is padding within the recorded count {count}"
                )));
            }
        }

        Ok(NeighborIter {
            ids: self.neighbor_scratch[..count].iter(),
        })
    }

    /// Read the leading sanity-check ordinal of node `k`'s record and assert
    /// it equals `k` (§9 open question: kept as a cheap corruption check,
    /// not relied on for correctness beyond that). Called from both
    /// `neighbors()` and `vector()` so any record-alignment corruption is
    /// caught on the primary read paths, not just `annidx check`.
    pub fn check_sanity_ordinal(&mut self, k: u32) -> AnnResult<()> {
        self.check_ordinal(k)?;
        let offset = self.record_offset(k);
        let cursor = self.cursor_mut()?;
        cursor.seek(offset);
        let sanity = cursor.read_i32()?;
        if sanity != k as i32 {
            return Err(AnnError::format(format!(
                "sanity ordinal mismatch: record {k} encodes {sanity}"
            )));
        }
        Ok(())
    }

    /// `getVector(k)` (§4.7): decode the raw `f32[D]` vector at node `k`'s
    /// INLINE_VECTORS slot. Fails with `Unsupported` if the artifact has no
    /// INLINE_VECTORS feature.
    pub fn vector(&mut self, k: u32) -> AnnResult<Vec<f32>> {
        self.check_ordinal(k)?;
        self.check_sanity_ordinal(k)?;
        let offset = self.feature_offset(crate::feature::FeatureKind::InlineVectors, k)?;
        let view = self
            .header
            .features
            .iter()
            .find_map(|f| f.as_inline_vectors())
            .ok_or_else(|| AnnError::unsupported("view has no INLINE_VECTORS feature"))?
            .clone();
        let cursor = self.cursor_mut()?;
        cursor.seek(offset);
        let DecodedVector(vector) = view.read_inline(cursor)?;
        Ok(vector)
    }

    /// Byte offset of the given feature kind's inline slot within node `k`'s
    /// record, or an `Unsupported` error if that feature isn't present.
    fn feature_offset(&self, kind: crate::feature::FeatureKind, k: u32) -> AnnResult<u64> {
        let mut offset = self.record_offset(k) + 4;
        for feature in &self.header.features {
            if feature.kind() == kind {
                return Ok(offset);
            }
            offset += feature.inline_size() as u64;
        }
        Err(AnnError::unsupported(format!(
            "view has no {:?} feature",
            kind
        )))
    }

    /// `rerankerFor(query, similarity)` (§4.7): an exact score function
    /// closing over an exact-source feature (INLINE_VECTORS, preferred; LVQ
    /// dequantized otherwise). Each call re-decodes the candidate's vector —
    /// rerankers run over a small candidate set, not the whole graph.
    pub fn reranker_for(
        &mut self,
        query: Vec<f32>,
        similarity: Similarity,
    ) -> AnnResult<impl FnMut(&mut Self, u32) -> AnnResult<f32> + 'static>
    where
        S: 'static,
    {
        let has_inline = self
            .header
            .features
            .iter()
            .any(|f| f.as_inline_vectors().is_some());
        let lvq = self
            .header
            .features
            .iter()
            .find_map(|f| f.as_lvq())
            .cloned();
        if !has_inline && lvq.is_none() {
            return Err(AnnError::unsupported(
                "view has no exact-score feature (INLINE_VECTORS or LVQ)",
            ));
        }

        Ok(move |view: &mut Self, k: u32| -> AnnResult<f32> {
            let candidate = if has_inline {
                view.vector(k)?
            } else {
                let lvq_view = lvq.as_ref().expect("checked above");
                let offset = view.feature_offset(crate::feature::FeatureKind::Lvq, k)?;
                let cursor = view.cursor_mut()?;
                cursor.seek(offset);
                let decoded = lvq_view.read_inline(cursor)?;
                lvq_view.dequantize(&decoded)
            };
            Ok(similarity.score(&query, &candidate))
        })
    }

    /// `approximateScoreFunctionFor(query, similarity)` (§4.7): returns a
    /// function that, given a node id, reads that node's transposed
    /// per-neighbor PQ code block once and scores every neighbor slot in
    /// bulk against a query-dependent `S * 32` lookup table. `similarity` is
    /// accepted for interface symmetry with `reranker_for`; FUSED_ADC scores
    /// are always squared-distance-based (smaller is closer), since that is
    /// what the product-quantization codebook was trained against.
    pub fn approximate_score_function_for(
        &mut self,
        query: Vec<f32>,
        _similarity: Similarity,
    ) -> AnnResult<impl FnMut(&mut Self, u32) -> AnnResult<Vec<f32>> + 'static>
    where
        S: 'static,
    {
        let adc = self
            .header
            .features
            .iter()
            .find_map(|f| f.as_fused_adc())
            .cloned()
            .ok_or_else(|| {
                AnnError::unsupported("approximateScoreFunctionFor called on a view lacking FUSED_ADC")
            })?;
        let table = adc.build_lookup_table(&query);

        Ok(move |view: &mut Self, k: u32| -> AnnResult<Vec<f32>> {
            let offset = view.feature_offset(crate::feature::FeatureKind::FusedAdc, k)?;
            let cursor = view.cursor_mut()?;
            cursor.seek(offset);
            let decoded = adc.read_inline(cursor)?;
            let max_degree = view.max_degree();
            Ok((0..max_degree)
                .map(|i| adc.score_slot(&decoded, &table, i))
                .collect())
        })
    }

    /// Close the view, releasing the reader. Closing an already-closed view
    /// is a no-op (§ State machine).
    pub fn close(&mut self) {
        self.cursor = None;
    }
}
