//! `CommonHeader`/`Header` (§4.4): file-global metadata plus one header block
//! per enabled feature, in ascending-bitshift order. Grounded on the
//! teacher's `FileHeader` (fixed field layout, `read_from`/`write_to` pair)
//! and `other_examples`' DiskANN `Header::from_bytes`/`validate` magic probe.

use std::io::Write;

use crate::codec::{write_i32, write_u32, ByteSource, Cursor};
use crate::error::{AnnError, AnnResult};
use crate::feature::fused_adc::FusedAdcView;
use crate::feature::inline_vectors::InlineVectorsView;
use crate::feature::lvq::LvqView;
use crate::feature::{FeatureKind, FeatureSet, FeatureView};

/// Magic value stamped at the start of every version-1+ artifact.
pub const MAGIC_V1: u32 = 0x564D_4E41; // "VMNA"

/// The format version this writer always emits.
pub const CURRENT_VERSION: u32 = 1;

/// File-global metadata common to every feature set (§3, §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommonHeader {
    /// 0 for a version-0 artifact (no magic/version on disk); otherwise
    /// [`CURRENT_VERSION`].
    pub version: u32,
    pub n: i32,
    pub d: i32,
    pub entry_node: i32,
    pub m: i32,
    pub feature_bitmask: i32,
}

impl CommonHeader {
    /// Write the common fields. Version-0 artifacts are never *written* by
    /// this crate (§4.4: "Writers always emit the current version") — only
    /// read — so this always emits magic + version.
    fn write_to(&self, out: &mut impl Write) -> AnnResult<()> {
        write_u32(out, MAGIC_V1)?;
        write_u32(out, CURRENT_VERSION)?;
        write_i32(out, self.n)?;
        write_i32(out, self.d)?;
        write_i32(out, self.entry_node)?;
        write_i32(out, self.m)?;
        write_i32(out, self.feature_bitmask)?;
        Ok(())
    }
}

/// One parsed feature header block, in the order it appeared on disk
/// (ascending bitshift).
pub enum FeatureHeader {
    InlineVectors(InlineVectorsView),
    FusedAdc(FusedAdcView),
    Lvq(LvqView),
}

impl FeatureHeader {
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureHeader::InlineVectors(_) => FeatureKind::InlineVectors,
            FeatureHeader::FusedAdc(_) => FeatureKind::FusedAdc,
            FeatureHeader::Lvq(_) => FeatureKind::Lvq,
        }
    }

    pub fn inline_size(&self) -> usize {
        match self {
            FeatureHeader::InlineVectors(v) => v.inline_size(),
            FeatureHeader::FusedAdc(v) => v.inline_size(),
            FeatureHeader::Lvq(v) => v.inline_size(),
        }
    }

    pub fn as_inline_vectors(&self) -> Option<&InlineVectorsView> {
        match self {
            FeatureHeader::InlineVectors(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_lvq(&self) -> Option<&LvqView> {
        match self {
            FeatureHeader::Lvq(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_fused_adc(&self) -> Option<&FusedAdcView> {
        match self {
            FeatureHeader::FusedAdc(v) => Some(v),
            _ => None,
        }
    }
}

/// The fully parsed file header: common fields plus every feature's header
/// block, in ascending-bitshift order.
pub struct Header {
    pub common: CommonHeader,
    pub features: Vec<FeatureHeader>,
    /// Total size in bytes of everything before node 0's record.
    pub header_size: u64,
}

impl Header {
    /// Write the common header plus every feature's header block, in
    /// ascending-bitshift order (§4.4). `feature_writers` must already be in
    /// that order.
    pub fn write_to(
        out: &mut impl Write,
        common: &CommonHeader,
        feature_writers: &[&dyn crate::feature::FeaturePayload],
    ) -> AnnResult<()> {
        common.write_to(out)?;
        for feature in feature_writers {
            feature.write_header(&mut *out)?;
        }
        Ok(())
    }

    /// Parse a header starting at `base_offset` in `cursor`'s backing bytes.
    /// Probes for the magic value first (§4.4, §9 open question #2): a
    /// mismatch is treated as "no magic, no version, version 0" and the
    /// cursor is repositioned to re-read the version-0 layout, rather than
    /// being treated as a `FormatError`.
    pub fn read_from<S: ByteSource + ?Sized>(
        cursor: &mut Cursor<S>,
        base_offset: u64,
    ) -> AnnResult<Self> {
        cursor.seek(base_offset);
        let probe = cursor.read_u32()?;

        let (version, n, d, entry_node, m, feature_bitmask) = if probe == MAGIC_V1 {
            let version = cursor.read_u32()?;
            if version > CURRENT_VERSION {
                return Err(AnnError::format(format!(
                    "unsupported version {version} (current is {CURRENT_VERSION})"
                )));
            }
            let n = cursor.read_i32()?;
            let d = cursor.read_i32()?;
            let entry_node = cursor.read_i32()?;
            let m = cursor.read_i32()?;
            let feature_bitmask = cursor.read_i32()?;
            (version, n, d, entry_node, m, feature_bitmask)
        } else {
            // Version 0: `probe` was actually N, not a magic value.
            let n = probe as i32;
            let d = cursor.read_i32()?;
            let entry_node = cursor.read_i32()?;
            let m = cursor.read_i32()?;
            let bitmask = FeatureSet::from_kinds([FeatureKind::InlineVectors]).serialize();
            (0, n, d, entry_node, m, bitmask)
        };

        if n < 0 || d < 0 || m < 0 {
            return Err(AnnError::format("negative N, D, or M in header"));
        }
        if n > 0 && !(0..n).contains(&entry_node) {
            return Err(AnnError::format(format!(
                "entryNode {entry_node} out of range [0, {n})"
            )));
        }

        let feature_set = FeatureSet::deserialize(feature_bitmask);
        let mut features = Vec::with_capacity(feature_set.len());
        for kind in feature_set.iter() {
            let header = match kind {
                FeatureKind::InlineVectors => {
                    FeatureHeader::InlineVectors(InlineVectorsView::load_header(cursor, d, m)?)
                }
                FeatureKind::FusedAdc => {
                    FeatureHeader::FusedAdc(FusedAdcView::load_header(cursor, d, m)?)
                }
                FeatureKind::Lvq => FeatureHeader::Lvq(LvqView::load_header(cursor, d, m)?),
            };
            features.push(header);
        }

        if feature_set.contains(FeatureKind::FusedAdc)
            && !feature_set.contains(FeatureKind::InlineVectors)
            && !feature_set.contains(FeatureKind::Lvq)
        {
            return Err(AnnError::format(
                "FUSED_ADC present without an exact-score feature (invariant 6)",
            ));
        }

        let header_size = cursor.position() - base_offset;

        log::debug!(
            "parsed header: version={version} n={n} d={d} m={m} entry_node={entry_node} features={}",
            feature_set.len()
        );

        Ok(Self {
            common: CommonHeader {
                version,
                n,
                d,
                entry_node,
                m,
                feature_bitmask,
            },
            features,
            header_size,
        })
    }

    /// Sum of every feature's `inline_size()` — the per-node payload total,
    /// excluding the sanity ordinal and neighbor slots.
    pub fn feature_inline_total(&self) -> usize {
        self.features.iter().map(|f| f.inline_size()).sum()
    }

    /// Fixed per-node record size (invariant 3): sanity ordinal + feature
    /// payloads + neighbor count + `M` neighbor slots.
    pub fn record_size(&self) -> u64 {
        4 + self.feature_inline_total() as u64 + 4 + 4 * self.common.m as u64
    }
}
