//! Codec, bitmask, and header-layout level tests — no writer/view involved.

use vamana_index::codec::{write_f32, write_i32, Cursor, SliceSource};
use vamana_index::view::OnDiskView;
use vamana_index::{FeatureKind, FeatureSet};
use std::sync::Arc;

#[test]
fn bitmask_law_holds_for_every_subset() {
    let all = [
        FeatureKind::InlineVectors,
        FeatureKind::FusedAdc,
        FeatureKind::Lvq,
    ];
    // Every subset of a 3-element closed set, as a bitmask over its index.
    for mask in 0u8..8 {
        let subset: Vec<FeatureKind> = all
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, &k)| k)
            .collect();
        let set = FeatureSet::from_kinds(subset.clone());
        let roundtripped = FeatureSet::deserialize(set.serialize());
        assert_eq!(set, roundtripped);
        for kind in subset {
            assert!(roundtripped.contains(kind));
        }
    }
}

#[test]
fn bitshift_table_is_stable() {
    assert_eq!(FeatureKind::InlineVectors.bitshift(), 0);
    assert_eq!(FeatureKind::FusedAdc.bitshift(), 1);
    assert_eq!(FeatureKind::Lvq.bitshift(), 2);
}

#[test]
fn feature_set_iterates_ascending_bitshift_regardless_of_insertion_order() {
    let set = FeatureSet::from_kinds([
        FeatureKind::Lvq,
        FeatureKind::InlineVectors,
        FeatureKind::FusedAdc,
    ]);
    let order: Vec<FeatureKind> = set.iter().collect();
    assert_eq!(
        order,
        vec![
            FeatureKind::InlineVectors,
            FeatureKind::FusedAdc,
            FeatureKind::Lvq,
        ]
    );
}

#[test]
fn cursor_round_trips_big_endian_primitives() {
    let mut buf = Vec::new();
    write_i32(&mut buf, -17).unwrap();
    write_f32(&mut buf, 3.5).unwrap();

    // Big-endian: -17 as i32 is 0xFFFFFFEF.
    assert_eq!(&buf[0..4], &[0xFF, 0xFF, 0xFF, 0xEF]);

    let mut cursor = Cursor::new(Arc::new(SliceSource::new(buf)));
    assert_eq!(cursor.read_i32().unwrap(), -17);
    assert_eq!(cursor.read_f32().unwrap(), 3.5);
}

#[test]
fn cursor_duplicate_shares_bytes_but_not_position() {
    let mut buf = Vec::new();
    write_i32(&mut buf, 1).unwrap();
    write_i32(&mut buf, 2).unwrap();

    let mut cursor = Cursor::new(Arc::new(SliceSource::new(buf)));
    cursor.read_i32().unwrap();

    let mut dup = cursor.duplicate();
    assert_eq!(dup.position(), 0);
    assert_eq!(dup.read_i32().unwrap(), 1);
    // Original cursor's position is untouched by the duplicate's reads.
    assert_eq!(cursor.read_i32().unwrap(), 2);
}

#[test]
fn short_read_is_a_format_error_not_a_panic() {
    let mut cursor = Cursor::new(Arc::new(SliceSource::new(vec![0u8, 1, 2])));
    assert!(cursor.read_i32().is_err());
}

/// Scenario 5: a hand-crafted version-0 artifact (no magic/version fields,
/// implied feature set {INLINE_VECTORS}) opens and reads back correctly.
#[test]
fn version_0_artifact_without_magic_opens_with_inline_vectors_implied() {
    let mut bytes = Vec::new();
    // v0 common header: N, D, entryNode, M — no magic, no version, no bitmask.
    write_i32(&mut bytes, 2).unwrap(); // N
    write_i32(&mut bytes, 2).unwrap(); // D
    write_i32(&mut bytes, 0).unwrap(); // entryNode
    write_i32(&mut bytes, 1).unwrap(); // M
    // INLINE_VECTORS's own header block: its private redeclaration of D,
    // read the same way in v0 as in v1 since the implied feature set still
    // goes through the ordinary per-feature header-block parse.
    write_i32(&mut bytes, 2).unwrap(); // D (INLINE_VECTORS header block)

    // Record 0: sanity ordinal, vector, neighborCount=1, neighbor[0]=1.
    write_i32(&mut bytes, 0).unwrap();
    write_f32(&mut bytes, 1.0).unwrap();
    write_f32(&mut bytes, 2.0).unwrap();
    write_i32(&mut bytes, 1).unwrap();
    write_i32(&mut bytes, 1).unwrap();

    // Record 1: sanity ordinal, vector, neighborCount=0, one -1 pad slot.
    write_i32(&mut bytes, 1).unwrap();
    write_f32(&mut bytes, 3.0).unwrap();
    write_f32(&mut bytes, 4.0).unwrap();
    write_i32(&mut bytes, 0).unwrap();
    write_i32(&mut bytes, -1).unwrap();

    let mut view = OnDiskView::open_slice(bytes).unwrap();
    assert_eq!(view.version(), 0);
    assert_eq!(view.size(), 2);
    assert_eq!(view.dimension(), 2);
    assert_eq!(view.max_degree(), 1);
    assert_eq!(view.entry_node(), 0);

    assert_eq!(view.vector(0).unwrap(), vec![1.0, 2.0]);
    assert_eq!(view.vector(1).unwrap(), vec![3.0, 4.0]);
    assert_eq!(view.neighbors(0).unwrap().collect::<Vec<_>>(), vec![1]);
    assert_eq!(view.neighbors(1).unwrap().collect::<Vec<_>>(), Vec::<i32>::new());
}

/// A corrupted leading sanity ordinal (record `k`'s encoded check value !=
/// `k`) must be caught by both primary read paths, `vector()` and
/// `neighbors()` — not just by a separate `check_sanity_ordinal` call site.
#[test]
fn corrupted_sanity_ordinal_is_rejected_by_vector_and_neighbors() {
    let mut bytes = Vec::new();
    write_i32(&mut bytes, 2).unwrap(); // N
    write_i32(&mut bytes, 2).unwrap(); // D
    write_i32(&mut bytes, 0).unwrap(); // entryNode
    write_i32(&mut bytes, 1).unwrap(); // M
    write_i32(&mut bytes, 2).unwrap(); // D (INLINE_VECTORS header block)

    // Record 0: sanity ordinal corrupted to 99 instead of 0.
    write_i32(&mut bytes, 99).unwrap();
    write_f32(&mut bytes, 1.0).unwrap();
    write_f32(&mut bytes, 2.0).unwrap();
    write_i32(&mut bytes, 1).unwrap();
    write_i32(&mut bytes, 1).unwrap();

    // Record 1: sanity ordinal intact.
    write_i32(&mut bytes, 1).unwrap();
    write_f32(&mut bytes, 3.0).unwrap();
    write_f32(&mut bytes, 4.0).unwrap();
    write_i32(&mut bytes, 0).unwrap();
    write_i32(&mut bytes, -1).unwrap();

    let mut view = OnDiskView::open_slice(bytes).unwrap();
    assert!(view.vector(0).is_err());
    assert!(view.neighbors(0).is_err());
    // Record 1's sanity ordinal is intact, so its reads still succeed.
    assert_eq!(view.vector(1).unwrap(), vec![3.0, 4.0]);
}
