//! `FUSED_ADC`: a product-quantization codebook in the header block, plus a
//! per-node record holding the PQ codes of that node's *neighbors*,
//! transposed subspace-major so scoring reduces to `S` contiguous
//! lookup-add passes (§4.3, §9).

use std::io::Write;

use crate::codec::{write_f32_array, write_i32, ByteSource, Cursor};
use crate::error::{AnnError, AnnResult};
use crate::feature::FeatureView;
use crate::graph::SourceGraph;

use super::{DecodedAdcCodes, FeaturePayload};

/// Fixed cluster count per subspace (§4.3).
pub const CLUSTERS_PER_SUBSPACE: usize = 32;

/// k-means iteration cap, grounded on the teacher's `ClusterMap::build`
/// iterate-until-stable loop shape.
const MAX_KMEANS_ITERATIONS: usize = 16;

/// A trained product-quantization codebook: `subspaces` runs of
/// `CLUSTERS_PER_SUBSPACE` centroids, each `subspace_dim` wide.
struct Codebook {
    subspaces: usize,
    subspace_dim: usize,
    /// `centroids[s * CLUSTERS_PER_SUBSPACE + c]` is subspace `s`'s centroid `c`.
    centroids: Vec<Vec<f32>>,
}

impl Codebook {
    /// Train one codebook per subspace via k-means over the subspace slices
    /// of every live node's vector (the node's own vector stands in for its
    /// neighbors' vectors at training time — codes are assigned per-neighbor
    /// at write time using this shared codebook).
    fn train(graph: &SourceGraph, dimension: usize, subspaces: usize) -> AnnResult<Self> {
        if dimension % subspaces != 0 {
            return Err(AnnError::precondition(format!(
                "FUSED_ADC subspace count {subspaces} does not divide dimension {dimension}"
            )));
        }
        let subspace_dim = dimension / subspaces;
        let vectors: Vec<&[f32]> = graph
            .live_ids()
            .filter_map(|id| graph.vector(id))
            .collect();

        let mut centroids = Vec::with_capacity(subspaces * CLUSTERS_PER_SUBSPACE);
        for s in 0..subspaces {
            let slices: Vec<&[f32]> = vectors
                .iter()
                .map(|v| &v[s * subspace_dim..(s + 1) * subspace_dim])
                .collect();
            centroids.extend(kmeans(&slices, subspace_dim, CLUSTERS_PER_SUBSPACE));
        }

        Ok(Self {
            subspaces,
            subspace_dim,
            centroids,
        })
    }

    fn centroid(&self, subspace: usize, cluster: usize) -> &[f32] {
        &self.centroids[subspace * CLUSTERS_PER_SUBSPACE + cluster]
    }

    /// Encode `vector` against this codebook: one cluster id per subspace.
    fn encode(&self, vector: &[f32]) -> Vec<u8> {
        (0..self.subspaces)
            .map(|s| {
                let slice = &vector[s * self.subspace_dim..(s + 1) * self.subspace_dim];
                let mut best = 0usize;
                let mut best_dist = f32::INFINITY;
                for c in 0..CLUSTERS_PER_SUBSPACE {
                    let dist = squared_distance(slice, self.centroid(s, c));
                    if dist < best_dist {
                        best_dist = dist;
                        best = c;
                    }
                }
                best as u8
            })
            .collect()
    }
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(&x, &y)| (x - y) * (x - y)).sum()
}

/// Lightweight k-means: `k` centroids over `points`, each `dim` wide.
/// Initializes centroids at evenly-spaced points, grounded on the teacher's
/// `ClusterMap::build` even-spacing initialization.
fn kmeans(points: &[&[f32]], dim: usize, k: usize) -> Vec<Vec<f32>> {
    if points.is_empty() {
        return vec![vec![0.0; dim]; k];
    }
    let step = (points.len() / k).max(1);
    let mut centroids: Vec<Vec<f32>> = (0..k)
        .map(|i| points[(i * step).min(points.len() - 1)].to_vec())
        .collect();

    for _ in 0..MAX_KMEANS_ITERATIONS {
        let mut sums = vec![vec![0.0f32; dim]; k];
        let mut counts = vec![0u32; k];
        for &point in points {
            let mut best = 0usize;
            let mut best_dist = f32::INFINITY;
            for (c, centroid) in centroids.iter().enumerate() {
                let dist = squared_distance(point, centroid);
                if dist < best_dist {
                    best_dist = dist;
                    best = c;
                }
            }
            for (d, &v) in point.iter().enumerate() {
                sums[best][d] += v;
            }
            counts[best] += 1;
        }
        let mut changed = false;
        for c in 0..k {
            if counts[c] == 0 {
                continue;
            }
            let new_centroid: Vec<f32> = sums[c].iter().map(|&s| s / counts[c] as f32).collect();
            if new_centroid != centroids[c] {
                changed = true;
                centroids[c] = new_centroid;
            }
        }
        if !changed {
            break;
        }
    }
    centroids
}

/// Write-side `FUSED_ADC`: the trained codebook plus the max-degree bound
/// needed to size and pad each node's transposed code block.
pub struct FusedAdcWriter<'g> {
    graph: &'g SourceGraph,
    codebook: Codebook,
    max_degree: usize,
}

impl<'g> FusedAdcWriter<'g> {
    pub fn new(graph: &'g SourceGraph, dimension: usize, subspaces: usize, max_degree: usize) -> AnnResult<Self> {
        let codebook = Codebook::train(graph, dimension, subspaces)?;
        Ok(Self {
            graph,
            codebook,
            max_degree,
        })
    }
}

impl FeaturePayload for FusedAdcWriter<'_> {
    fn header_size(&self) -> usize {
        // S, then S * CLUSTERS_PER_SUBSPACE * subspace_dim f32 centroids.
        4 + self.codebook.subspaces * CLUSTERS_PER_SUBSPACE * self.codebook.subspace_dim * 4
    }

    fn inline_size(&self) -> usize {
        self.max_degree * self.codebook.subspaces
    }

    fn write_header(&self, out: &mut dyn Write) -> AnnResult<()> {
        write_i32(out, self.codebook.subspaces as i32)?;
        for centroid in &self.codebook.centroids {
            write_f32_array(out, centroid)?;
        }
        Ok(())
    }

    fn write_inline(
        &self,
        _orig_id: u64,
        out: &mut dyn Write,
        neighbor_orig_ids: &[u64],
    ) -> AnnResult<()> {
        let mut codes_by_neighbor: Vec<Vec<u8>> = Vec::with_capacity(self.max_degree);
        for &neighbor_id in neighbor_orig_ids {
            let vector = self.graph.vector(neighbor_id).ok_or_else(|| {
                AnnError::precondition(format!(
                    "neighbor {neighbor_id} has no vector for FUSED_ADC"
                ))
            })?;
            codes_by_neighbor.push(self.codebook.encode(vector));
        }
        // Pad unused neighbor slots with arbitrary (zero) code bytes; the
        // consumer gates by the real neighbor count (§4.3).
        while codes_by_neighbor.len() < self.max_degree {
            codes_by_neighbor.push(vec![0u8; self.codebook.subspaces]);
        }

        // Transpose to subspace-major: subspace s holds max_degree
        // contiguous bytes, one per neighbor slot.
        for s in 0..self.codebook.subspaces {
            for codes in &codes_by_neighbor {
                out.write_all(&codes[s..s + 1])?;
            }
        }
        Ok(())
    }
}

/// Read-side `FUSED_ADC`: the codebook plus geometry needed to decode a
/// node's transposed code block and build a per-query lookup table.
#[derive(Debug, Clone)]
pub struct FusedAdcView {
    subspaces: usize,
    subspace_dim: usize,
    max_degree: usize,
    centroids: Vec<f32>,
}

impl FusedAdcView {
    pub fn subspaces(&self) -> usize {
        self.subspaces
    }

    fn centroid(&self, subspace: usize, cluster: usize) -> &[f32] {
        let start = (subspace * CLUSTERS_PER_SUBSPACE + cluster) * self.subspace_dim;
        &self.centroids[start..start + self.subspace_dim]
    }

    /// Build the `S * 32` query-dependent lookup table: squared distance
    /// from the query's subspace slice to each of that subspace's centroids.
    pub fn build_lookup_table(&self, query: &[f32]) -> Vec<f32> {
        let mut table = vec![0.0f32; self.subspaces * CLUSTERS_PER_SUBSPACE];
        for s in 0..self.subspaces {
            let slice = &query[s * self.subspace_dim..(s + 1) * self.subspace_dim];
            for c in 0..CLUSTERS_PER_SUBSPACE {
                table[s * CLUSTERS_PER_SUBSPACE + c] = squared_distance(slice, self.centroid(s, c));
            }
        }
        table
    }

    /// Decode a node's transposed per-neighbor code block. `cursor` must be
    /// positioned at the start of this feature's slot.
    pub fn read_inline<S: ByteSource + ?Sized>(
        &self,
        cursor: &mut Cursor<S>,
    ) -> AnnResult<DecodedAdcCodes> {
        let mut bytes = vec![0u8; self.max_degree * self.subspaces];
        cursor.read_exact(&mut bytes)?;
        Ok(DecodedAdcCodes {
            bytes,
            subspaces: self.subspaces,
            max_degree: self.max_degree,
        })
    }

    /// Score neighbor slot `i` against a lookup table built by
    /// [`Self::build_lookup_table`]: sum of the table entries its codes name.
    pub fn score_slot(&self, decoded: &DecodedAdcCodes, table: &[f32], i: usize) -> f32 {
        decoded
            .code_for_slot(i)
            .enumerate()
            .map(|(s, code)| table[s * CLUSTERS_PER_SUBSPACE + code as usize])
            .sum()
    }
}

impl<S: ByteSource + ?Sized> FeatureView<S> for FusedAdcView {
    fn load_header(cursor: &mut Cursor<S>, dimension: i32, max_degree: i32) -> AnnResult<Self> {
        let subspaces = cursor.read_i32()?;
        if subspaces <= 0 || dimension % subspaces != 0 {
            return Err(AnnError::format(format!(
                "FUSED_ADC header declares S={subspaces} incompatible with D={dimension}"
            )));
        }
        let subspaces = subspaces as usize;
        let subspace_dim = dimension as usize / subspaces;
        let centroids = cursor.read_f32_array(subspaces * CLUSTERS_PER_SUBSPACE * subspace_dim)?;
        Ok(Self {
            subspaces,
            subspace_dim,
            max_degree: max_degree as usize,
            centroids,
        })
    }
}

impl FusedAdcView {
    pub fn inline_size(&self) -> usize {
        self.max_degree * self.subspaces
    }
}
