//! `LVQ` (locally-adaptive scalar quantization): a per-file global mean plus
//! a per-node bias/scale/8-bit-code record (§4.3). Open-question encoding
//! decisions for this feature are recorded in DESIGN.md — no
//! `original_source/` material survived filtering for this pack.

use std::io::Write;

use crate::codec::{write_f32, write_f32_array, ByteSource, Cursor};
use crate::error::{AnnError, AnnResult};
use crate::feature::FeatureView;
use crate::graph::SourceGraph;

use super::{DecodedLvqCodes, FeaturePayload};

/// `ceil(d / 64) * 64` — the 64-byte code-block alignment §4.3 requires.
fn aligned_code_len(dimension: usize) -> usize {
    dimension.div_ceil(64) * 64
}

/// Write-side `LVQ`: computes the global per-dimension mean up front (the
/// header block), then quantizes each node's vector against it on demand.
pub struct LvqWriter<'g> {
    graph: &'g SourceGraph,
    dimension: usize,
    mean: Vec<f32>,
}

impl<'g> LvqWriter<'g> {
    /// Build the global mean over every live node's vector.
    pub fn new(graph: &'g SourceGraph, dimension: usize) -> AnnResult<Self> {
        let mut sum = vec![0.0f64; dimension];
        let mut count = 0u64;
        for id in graph.live_ids() {
            let vector = graph.vector(id).ok_or_else(|| {
                AnnError::precondition(format!("node {id} has no vector for LVQ"))
            })?;
            for (s, &v) in sum.iter_mut().zip(vector) {
                *s += v as f64;
            }
            count += 1;
        }
        let mean = if count == 0 {
            vec![0.0; dimension]
        } else {
            sum.iter().map(|&s| (s / count as f64) as f32).collect()
        };
        Ok(Self {
            graph,
            dimension,
            mean,
        })
    }

    /// Centers `vector` against the global per-dimension mean, then quantizes
    /// the residual around its own per-node mean (`bias`) into 8-bit codes
    /// scaled by the residual's max absolute deviation (DESIGN.md decision).
    fn quantize(&self, vector: &[f32]) -> (f32, f32, Vec<u8>) {
        let residual: Vec<f32> = vector
            .iter()
            .zip(&self.mean)
            .map(|(&v, &m)| v - m)
            .collect();
        let bias = if residual.is_empty() {
            0.0
        } else {
            residual.iter().sum::<f32>() / residual.len() as f32
        };
        let max_abs_deviation = residual
            .iter()
            .map(|&r| (r - bias).abs())
            .fold(0.0f32, f32::max);
        let scale = if max_abs_deviation == 0.0 {
            1.0
        } else {
            max_abs_deviation / 127.0
        };
        let codes: Vec<u8> = residual
            .iter()
            .map(|&r| (((r - bias) / scale).round().clamp(-127.0, 127.0)) as i8 as u8)
            .collect();
        (bias, scale, codes)
    }
}

impl FeaturePayload for LvqWriter<'_> {
    fn header_size(&self) -> usize {
        4 * self.dimension
    }

    fn inline_size(&self) -> usize {
        aligned_code_len(self.dimension) + 8
    }

    fn write_header(&self, out: &mut dyn Write) -> AnnResult<()> {
        write_f32_array(out, &self.mean)
    }

    fn write_inline(
        &self,
        orig_id: u64,
        out: &mut dyn Write,
        _neighbor_orig_ids: &[u64],
    ) -> AnnResult<()> {
        let vector = self.graph.vector(orig_id).ok_or_else(|| {
            AnnError::precondition(format!("node {orig_id} has no vector for LVQ"))
        })?;
        let (bias, scale, codes) = self.quantize(vector);
        write_f32(out, bias)?;
        write_f32(out, scale)?;
        out.write_all(&codes)?;
        let padding = aligned_code_len(self.dimension) - codes.len();
        out.write_all(&vec![0u8; padding])?;
        Ok(())
    }
}

/// Read-side `LVQ`: the global mean plus the dimension/alignment needed to
/// decode a node's inline record and dequantize it.
#[derive(Debug, Clone)]
pub struct LvqView {
    mean: Vec<f32>,
    dimension: usize,
}

impl LvqView {
    pub fn mean(&self) -> &[f32] {
        &self.mean
    }

    /// Decode one node's bias/scale/codes record. `cursor` must be
    /// positioned at the start of this feature's slot.
    pub fn read_inline<S: ByteSource + ?Sized>(
        &self,
        cursor: &mut Cursor<S>,
    ) -> AnnResult<DecodedLvqCodes> {
        let bias = cursor.read_f32()?;
        let scale = cursor.read_f32()?;
        let aligned = aligned_code_len(self.dimension);
        let mut raw = vec![0u8; aligned];
        cursor.read_exact(&mut raw)?;
        let codes: Vec<i8> = raw[..self.dimension].iter().map(|&b| b as i8).collect();
        Ok(DecodedLvqCodes { codes, bias, scale })
    }

    /// Dequantize a decoded record back to an approximate `f32` vector,
    /// for use by the reranker.
    pub fn dequantize(&self, decoded: &DecodedLvqCodes) -> Vec<f32> {
        decoded
            .codes
            .iter()
            .zip(&self.mean)
            .map(|(&code, &m)| m + decoded.bias + (code as f32) * decoded.scale)
            .collect()
    }
}

impl<S: ByteSource + ?Sized> FeatureView<S> for LvqView {
    fn load_header(cursor: &mut Cursor<S>, dimension: i32, _max_degree: i32) -> AnnResult<Self> {
        let dimension = dimension as usize;
        let mean = cursor.read_f32_array(dimension)?;
        Ok(Self { mean, dimension })
    }
}

impl LvqView {
    pub fn inline_size(&self) -> usize {
        aligned_code_len(self.dimension) + 8
    }
}
