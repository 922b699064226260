//! `OrdinalMapping` and `ordinal::sequential` properties (§4.5).

use vamana_index::{OrdinalMapping, SourceGraph};

#[test]
fn sequential_renumbering_is_monotonic_and_dense() {
    let vectors = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
    let neighbors = vec![vec![1], vec![2], vec![3], vec![0]];
    let graph = SourceGraph::from_parts(vectors, neighbors).unwrap();

    let mapping = vamana_index::ordinal::sequential(&graph);
    assert_eq!(mapping.len(), 4);
    assert_eq!(mapping.max_ordinal(), Some(3));
    assert!(mapping.is_injective());

    let mut prev = None;
    for old_id in 0..4u64 {
        let ordinal = mapping.get(old_id).unwrap();
        if let Some(p) = prev {
            assert!(ordinal > p, "mapping must be monotonic in source id order");
        }
        prev = Some(ordinal);
    }
}

#[test]
fn sequential_renumbering_skips_tombstoned_nodes() {
    let vectors = vec![vec![1.0], vec![2.0], vec![3.0]];
    let neighbors = vec![vec![], vec![], vec![]];
    let mut graph = SourceGraph::from_parts(vectors, neighbors).unwrap();
    graph.tombstone(1).unwrap();
    graph.cleanup();

    let mapping = vamana_index::ordinal::sequential(&graph);
    assert_eq!(mapping.len(), 2);
    assert_eq!(mapping.max_ordinal(), Some(1));
}

#[test]
fn invert_recovers_the_old_id_for_every_ordinal() {
    let table = vec![Some(2), Some(0), Some(1)];
    let mapping = OrdinalMapping::from_table(table);
    let inverted = mapping.invert().unwrap();
    assert_eq!(inverted, vec![1, 2, 0]);
}

#[test]
fn invert_fails_when_an_ordinal_is_out_of_range() {
    let table = vec![Some(0), Some(5)];
    let mapping = OrdinalMapping::from_table(table);
    assert!(mapping.invert().is_err());
}

#[test]
fn invert_fails_when_two_old_ids_share_an_ordinal() {
    let table = vec![Some(0), Some(0)];
    let mapping = OrdinalMapping::from_table(table);
    assert!(!mapping.is_injective());
    assert!(mapping.invert().is_err());
}

#[test]
fn invert_fails_when_the_mapping_is_not_surjective() {
    // len() == 2 (two Some entries), but max_ordinal is 2, so ordinal 1 is
    // never assigned: not surjective onto [0, 2).
    let table = vec![Some(0), Some(2)];
    let mapping = OrdinalMapping::from_table(table);
    assert_eq!(mapping.len(), 2);
    assert!(mapping.invert().is_err());
}

#[test]
fn get_returns_none_for_ids_the_mapping_does_not_cover() {
    let table = vec![Some(0), None, Some(1)];
    let mapping = OrdinalMapping::from_table(table);
    assert_eq!(mapping.get(0), Some(0));
    assert_eq!(mapping.get(1), None);
    assert_eq!(mapping.get(2), Some(1));
    assert_eq!(mapping.get(99), None);
}

#[test]
fn empty_mapping_has_no_max_ordinal() {
    let mapping = OrdinalMapping::from_table(vec![None, None]);
    assert!(mapping.is_empty());
    assert_eq!(mapping.max_ordinal(), None);
}
