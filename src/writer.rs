//! The Writer (§4.6): a `WriterBuilder` that validates every precondition at
//! construction time, and a single-use `Writer` that streams the sealed
//! artifact in one pass. Grounded on the teacher's `AmemWriter::write_to`
//! (section-offset computation, sequential field writes) generalized to a
//! fixed-stride, streaming-only layout, with preconditions moved into a
//! fluent builder the way the teacher validates at construction
//! (`CognitiveEvent::validate`, `MemoryGraph::add_edge`).

use std::io::Write;

use crate::codec::write_i32;
use crate::error::{AnnError, AnnResult};
use crate::feature::fused_adc::FusedAdcWriter;
use crate::feature::inline_vectors::InlineVectorsWriter;
use crate::feature::lvq::LvqWriter;
use crate::feature::{FeatureKind, FeaturePayload, FeatureSet};
use crate::graph::SourceGraph;
use crate::header::{CommonHeader, Header};
use crate::ordinal::{self, OrdinalMapping};

/// A requested feature, as given to [`WriterBuilder::with_feature`]. Unlike
/// [`FeatureKind`], which is just the bitshift-ordering tag, this carries the
/// per-kind build-time parameters a feature needs (e.g. FUSED_ADC's
/// subspace count).
#[derive(Debug, Clone, Copy)]
pub enum FeatureSpec {
    InlineVectors,
    Lvq,
    FusedAdc { subspaces: usize },
}

impl FeatureSpec {
    fn kind(self) -> FeatureKind {
        match self {
            FeatureSpec::InlineVectors => FeatureKind::InlineVectors,
            FeatureSpec::Lvq => FeatureKind::Lvq,
            FeatureSpec::FusedAdc { .. } => FeatureKind::FusedAdc,
        }
    }
}

/// Accumulates feature requests and an optional ordinal mapping, then
/// validates every precondition in §4.6/§7 at `build()` — before a `Writer`
/// value (and therefore any output byte) exists.
pub struct WriterBuilder<'g> {
    graph: &'g SourceGraph,
    features: Vec<FeatureSpec>,
    mapping: Option<OrdinalMapping>,
    entry_node: Option<u64>,
}

impl<'g> WriterBuilder<'g> {
    pub fn new(graph: &'g SourceGraph) -> Self {
        Self {
            graph,
            features: Vec::new(),
            mapping: None,
            entry_node: None,
        }
    }

    /// Request a feature kind be included in the artifact. Order of calls
    /// does not matter — features are always emitted ascending-bitshift.
    pub fn with_feature(mut self, spec: FeatureSpec) -> Self {
        self.features.push(spec);
        self
    }

    /// Supply an arbitrary injective mapping (e.g. spatial reordering)
    /// instead of the default sequential renumbering.
    pub fn with_mapping(mut self, mapping: OrdinalMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Override the entry node (by *original*, pre-renumbering id). Defaults
    /// to the lowest live id's ordinal.
    pub fn with_entry_node(mut self, orig_id: u64) -> Self {
        self.entry_node = Some(orig_id);
        self
    }

    /// Validate every precondition and produce a `Writer`. Raises a
    /// `PreconditionViolation` before any byte is written if:
    /// - the source graph has tombstones ("Run cleanup before writing");
    /// - the mapping's size doesn't match the graph's live-node count;
    /// - the mapping isn't surjective onto `[0, N)`;
    /// - FUSED_ADC is requested without an exact-score feature (invariant 6).
    pub fn build(self) -> AnnResult<Writer<'g>> {
        if self.graph.has_tombstones() {
            return Err(AnnError::precondition(
                "source graph has tombstoned nodes. Run cleanup before writing",
            ));
        }

        let mapping = match self.mapping {
            Some(m) => m,
            None => ordinal::sequential(self.graph),
        };

        let n = self.graph.live_count();
        if mapping.len() != n {
            return Err(AnnError::precondition(format!(
                "mapping has {} entries but graph has {n} live nodes",
                mapping.len()
            )));
        }
        if n > 0 && mapping.max_ordinal() != Some(n as u32 - 1) {
            return Err(AnnError::precondition(format!(
                "mapping's max ordinal must be {} (N-1), not surjective onto [0, N)",
                n - 1
            )));
        }

        // Every live node's neighbor ids must resolve in `mapping` (§7:
        // "neighbor id out of range in source graph"). Checked here, before
        // any `Writer` exists, so this precondition can never surface
        // mid-stream after header bytes are already on the wire.
        for id in self.graph.live_ids() {
            for &neighbor in self.graph.neighbors(id).unwrap_or(&[]) {
                if mapping.get(neighbor).is_none() {
                    return Err(AnnError::precondition(format!(
                        "node {id} references neighbor {neighbor}, which has no ordinal (dangling or tombstoned)"
                    )));
                }
            }
        }

        let mut feature_set = FeatureSet::new();
        for spec in &self.features {
            feature_set.insert(spec.kind());
        }
        if feature_set.contains(FeatureKind::FusedAdc)
            && !feature_set.contains(FeatureKind::InlineVectors)
            && !feature_set.contains(FeatureKind::Lvq)
        {
            return Err(AnnError::precondition(
                "FUSED_ADC requires an exact-score feature (INLINE_VECTORS or LVQ) alongside it",
            ));
        }

        // D is taken from INLINE_VECTORS or LVQ, whichever is present; 0 if
        // neither (§4.6 step 1).
        let dimension = if feature_set.contains(FeatureKind::InlineVectors)
            || feature_set.contains(FeatureKind::Lvq)
        {
            self.graph.dimension()
        } else {
            0
        };

        let max_degree = self
            .graph
            .live_ids()
            .map(|id| self.graph.neighbors(id).map(<[u64]>::len).unwrap_or(0))
            .max()
            .unwrap_or(0);

        let entry_ordinal = match self.entry_node {
            Some(orig_id) => mapping.get(orig_id).ok_or_else(|| {
                AnnError::precondition(format!("entry node {orig_id} has no ordinal"))
            })?,
            None => self
                .graph
                .live_ids()
                .next()
                .and_then(|id| mapping.get(id))
                .unwrap_or(0),
        };

        // Validate injectivity/surjectivity onto [0, N) now, before any
        // `Writer` (and therefore any output byte) exists — `len()` and
        // `max_ordinal()` above don't catch a same-cardinality-and-max but
        // non-injective table (e.g. two old ids sharing an ordinal while
        // another ordinal is never assigned). `invert()` is the single
        // source of truth for that check, so run it here and keep the
        // result rather than re-deriving it inside `write()`.
        let inversion = mapping.invert()?;

        Ok(Writer {
            graph: self.graph,
            features: self.features,
            mapping,
            inversion,
            n,
            dimension,
            max_degree,
            entry_ordinal,
            written: false,
        })
    }
}

/// A validated, single-use writer (§ State machine: Configured → Written).
pub struct Writer<'g> {
    graph: &'g SourceGraph,
    features: Vec<FeatureSpec>,
    mapping: OrdinalMapping,
    /// `mapping`'s new-ordinal -> old-id inversion, validated (injective,
    /// surjective onto `[0, N)`) at `build()` time (§4.6 step 3).
    inversion: Vec<u64>,
    n: usize,
    dimension: usize,
    max_degree: usize,
    entry_ordinal: u32,
    written: bool,
}

impl<'g> Writer<'g> {
    /// Start building a writer for `graph`.
    pub fn builder(graph: &'g SourceGraph) -> WriterBuilder<'g> {
        WriterBuilder::new(graph)
    }

    /// Stream the sealed artifact to `out`. Single-pass, no seeking — `out`
    /// may be a pure streaming sink (§4.6). Fails if this writer has already
    /// been used ("idempotent double-write rejection", §8).
    pub fn write(&mut self, out: &mut impl Write) -> AnnResult<()> {
        if self.written {
            return Err(AnnError::precondition("writer has already been used"));
        }
        self.written = true;

        let inline_vectors = self.features.iter().any(|f| matches!(f, FeatureSpec::InlineVectors));
        let lvq_writer = if self.features.iter().any(|f| matches!(f, FeatureSpec::Lvq)) {
            Some(LvqWriter::new(self.graph, self.dimension)?)
        } else {
            None
        };
        let inline_writer = if inline_vectors {
            Some(InlineVectorsWriter::new(self.graph, self.dimension))
        } else {
            None
        };
        let adc_writer = match self
            .features
            .iter()
            .find_map(|f| match f {
                FeatureSpec::FusedAdc { subspaces } => Some(*subspaces),
                _ => None,
            }) {
            Some(subspaces) => Some(FusedAdcWriter::new(
                self.graph,
                self.dimension,
                subspaces,
                self.max_degree,
            )?),
            None => None,
        };

        // Ascending-bitshift order: INLINE_VECTORS(0), FUSED_ADC(1), LVQ(2).
        let mut ordered: Vec<&dyn FeaturePayload> = Vec::new();
        if let Some(w) = &inline_writer {
            ordered.push(w);
        }
        if let Some(w) = &adc_writer {
            ordered.push(w);
        }
        if let Some(w) = &lvq_writer {
            ordered.push(w);
        }

        let mut feature_set = FeatureSet::new();
        for spec in &self.features {
            feature_set.insert(spec.kind());
        }

        let common = CommonHeader {
            version: crate::header::CURRENT_VERSION,
            n: self.n as i32,
            d: self.dimension as i32,
            entry_node: self.entry_ordinal as i32,
            m: self.max_degree as i32,
            feature_bitmask: feature_set.serialize(),
        };

        log::info!(
            "writing artifact: n={} d={} m={} features={}",
            self.n,
            self.dimension,
            self.max_degree,
            feature_set.len()
        );

        Header::write_to(out, &common, &ordered)?;

        // new-ordinal -> old-id inversion (§4.6 step 3), already validated
        // and computed once in `WriterBuilder::build()` before any byte of
        // this artifact existed.
        for (k, &orig_id) in self.inversion.iter().enumerate() {
            write_i32(out, k as i32)?;

            let orig_neighbors = self.graph.neighbors(orig_id).unwrap_or(&[]);
            for feature in &ordered {
                feature.write_inline(orig_id, &mut *out, orig_neighbors)?;
            }

            let count = orig_neighbors.len().min(self.max_degree);
            write_i32(out, count as i32)?;
            for &neighbor_orig in &orig_neighbors[..count] {
                let new_id = self.mapping.get(neighbor_orig).ok_or_else(|| {
                    AnnError::precondition(format!(
                        "neighbor {neighbor_orig} of node {orig_id} has no ordinal"
                    ))
                })?;
                write_i32(out, new_id as i32)?;
            }
            for _ in count..self.max_degree {
                write_i32(out, -1)?;
            }
        }

        out.flush()?;
        Ok(())
    }
}
