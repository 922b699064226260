//! The closed `FeatureId` registry and the bitmask that serializes a set of
//! features (§4.2), plus the shared `Feature` payload contract (§4.3).

pub mod fused_adc;
pub mod inline_vectors;
pub mod lvq;

use crate::codec::{ByteSource, Cursor};
use crate::error::AnnResult;

/// A feature kind, identified by a stable bitshift that never changes once
/// assigned — this is "the one source of ordering truth" for both the
/// feature-bitmask and the on-disk byte order of header blocks and inline
/// payloads (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FeatureKind {
    /// Raw `f32 * D` vectors, one per node.
    InlineVectors = 0,
    /// Fused asymmetric-distance-computation PQ codes over a node's neighbors.
    FusedAdc = 1,
    /// Locally-adaptive scalar quantization.
    Lvq = 2,
}

impl FeatureKind {
    /// The closed, ascending-bitshift list of every feature kind.
    pub const ALL: [FeatureKind; 3] = [
        FeatureKind::InlineVectors,
        FeatureKind::FusedAdc,
        FeatureKind::Lvq,
    ];

    /// This kind's stable bitshift.
    pub fn bitshift(self) -> u32 {
        self as u8 as u32
    }

    /// Convert a bitshift back to a kind, or `None` if it names no kind.
    pub fn from_bitshift(shift: u32) -> Option<Self> {
        match shift {
            0 => Some(Self::InlineVectors),
            1 => Some(Self::FusedAdc),
            2 => Some(Self::Lvq),
            _ => None,
        }
    }
}

/// A set of enabled feature kinds, serializable to/from the header's
/// `i32` feature-bitmask (§4.2, §4.4).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSet(Vec<FeatureKind>);

impl FeatureSet {
    /// An empty feature set.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a feature set from an arbitrary collection, normalizing to the
    /// closed ascending-bitshift order and deduplicating.
    pub fn from_kinds(kinds: impl IntoIterator<Item = FeatureKind>) -> Self {
        let mut set = Self::new();
        for kind in kinds {
            set.insert(kind);
        }
        set
    }

    /// Insert a kind, keeping ascending-bitshift order.
    pub fn insert(&mut self, kind: FeatureKind) {
        if !self.0.contains(&kind) {
            self.0.push(kind);
            self.0.sort_by_key(|k| k.bitshift());
        }
    }

    /// Whether `kind` is a member.
    pub fn contains(&self, kind: FeatureKind) -> bool {
        self.0.contains(&kind)
    }

    /// Iterate members in ascending-bitshift order — the order every on-disk
    /// header block and inline payload must follow.
    pub fn iter(&self) -> impl Iterator<Item = FeatureKind> + '_ {
        self.0.iter().copied()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no members.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `serialize(set) = OR of (1 << bitshift) over members` (§4.2).
    pub fn serialize(&self) -> i32 {
        self.0.iter().fold(0i32, |acc, k| acc | (1 << k.bitshift()))
    }

    /// `deserialize(mask)` iterates bits low-to-high, mapping set bits back
    /// to kinds in ascending bitshift (§4.2). Unknown set bits are ignored —
    /// they cannot name a kind outside the closed `FeatureKind::ALL` set,
    /// and a truly corrupt bitmask is instead caught by the header-block
    /// size arithmetic failing to add up on read.
    pub fn deserialize(mask: i32) -> Self {
        let mut set = Self::new();
        for shift in 0..32u32 {
            if mask & (1 << shift) != 0 {
                if let Some(kind) = FeatureKind::from_bitshift(shift) {
                    set.insert(kind);
                }
            }
        }
        set
    }
}

/// The decoded form of `INLINE_VECTORS`'s per-node payload.
pub struct DecodedVector(pub Vec<f32>);

/// The decoded form of `LVQ`'s per-node payload: dequantized on demand by
/// the reranker rather than eagerly, since callers mostly want a score, not
/// the reconstructed vector.
pub struct DecodedLvqCodes {
    /// Per-dimension 8-bit codes.
    pub codes: Vec<i8>,
    /// Per-node bias term.
    pub bias: f32,
    /// Per-node scale term.
    pub scale: f32,
}

/// The decoded form of `FUSED_ADC`'s per-node payload: the transposed
/// per-neighbor PQ code block, subspace-major (§4.3).
pub struct DecodedAdcCodes {
    /// `subspaces` runs of `max_degree` bytes each; subspace `s`, neighbor
    /// slot `i` is at `bytes[s * max_degree + i]`.
    pub bytes: Vec<u8>,
    pub subspaces: usize,
    pub max_degree: usize,
}

impl DecodedAdcCodes {
    /// The PQ code of neighbor slot `i` across all subspaces.
    pub fn code_for_slot(&self, i: usize) -> impl Iterator<Item = u8> + '_ {
        (0..self.subspaces).map(move |s| self.bytes[s * self.max_degree + i])
    }
}

/// Shared contract every feature kind implements (§4.3): a fixed per-file
/// header block and a fixed per-node inline record, written once at build
/// time and re-derived by the header block on open.
pub trait FeaturePayload {
    /// Size in bytes of this feature's header block.
    fn header_size(&self) -> usize;

    /// Size in bytes of this feature's per-node inline record. Constant
    /// over the life of the file (§4.3).
    fn inline_size(&self) -> usize;

    /// Write this feature's header block.
    fn write_header(&self, out: &mut dyn std::io::Write) -> AnnResult<()>;

    /// Write the inline record for the original (pre-renumbering) node id
    /// `orig_id`. `neighbor_orig_ids` is that node's neighbor list in the
    /// source graph's own id space — FUSED_ADC needs the original ids to
    /// look up neighbor vectors for quantization; features that don't care
    /// about neighbors simply ignore the parameter.
    fn write_inline(
        &self,
        orig_id: u64,
        out: &mut dyn std::io::Write,
        neighbor_orig_ids: &[u64],
    ) -> AnnResult<()>;
}

/// Load-side counterpart of [`FeaturePayload`]: parses a header block given
/// the common header. Each implementor also exposes an inherent
/// `inline_size(&self) -> usize` (not part of this trait, since it needs no
/// type parameter and a trait method generic over `S` would make ordinary
/// calls ambiguous).
pub trait FeatureView<S: ByteSource + ?Sized> {
    /// Read this feature's header block starting at the cursor's current
    /// position, advancing past it.
    fn load_header(cursor: &mut Cursor<S>, dimension: i32, max_degree: i32) -> AnnResult<Self>
    where
        Self: Sized;
}
