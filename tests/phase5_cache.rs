//! `GraphCache` pinned-hot-node behavior (§4.8).

use vamana_index::view::OnDiskView;
use vamana_index::writer::{FeatureSpec, Writer};
use vamana_index::{GraphCache, SourceGraph};

fn ring_graph(n: usize) -> SourceGraph {
    let vectors: Vec<Vec<f32>> = (0..n).map(|i| vec![i as f32]).collect();
    let neighbors: Vec<Vec<u64>> = (0..n as u64)
        .map(|i| vec![(i + 1) % n as u64])
        .collect();
    SourceGraph::from_parts(vectors, neighbors).unwrap()
}

#[test]
fn pin_bfs_pins_exactly_the_requested_bound_on_a_larger_ring() {
    let graph = ring_graph(20);
    let mut writer = Writer::builder(&graph)
        .with_feature(FeatureSpec::InlineVectors)
        .build()
        .unwrap();
    let mut bytes = Vec::new();
    writer.write(&mut bytes).unwrap();

    let view = OnDiskView::open_slice(bytes).unwrap();
    let mut cache = GraphCache::new(view);
    cache.pin_bfs(0, 5).unwrap();

    assert_eq!(cache.pinned_count(), 5);
    assert!(cache.is_pinned(0));
}

#[test]
fn pin_bfs_pins_the_whole_graph_when_bound_exceeds_its_size() {
    let graph = ring_graph(6);
    let mut writer = Writer::builder(&graph)
        .with_feature(FeatureSpec::InlineVectors)
        .build()
        .unwrap();
    let mut bytes = Vec::new();
    writer.write(&mut bytes).unwrap();

    let view = OnDiskView::open_slice(bytes).unwrap();
    let mut cache = GraphCache::new(view);
    cache.pin_bfs(0, 100).unwrap();

    assert_eq!(cache.pinned_count(), 6);
    for k in 0..6u32 {
        assert!(cache.is_pinned(k));
    }
}

#[test]
fn cache_serves_pinned_vectors_and_falls_through_for_unpinned_ones() {
    let graph = ring_graph(10);
    let mut writer = Writer::builder(&graph)
        .with_feature(FeatureSpec::InlineVectors)
        .build()
        .unwrap();
    let mut bytes = Vec::new();
    writer.write(&mut bytes).unwrap();

    let view = OnDiskView::open_slice(bytes).unwrap();
    let mut cache = GraphCache::new(view);
    cache.pin_bfs(0, 3).unwrap();

    // A pinned node's vector, served from the pin.
    let pinned_vector = cache.vector(0).unwrap();
    assert_eq!(pinned_vector, vec![0.0]);

    // A node outside the pinned set still resolves via the wrapped view.
    let far_vector = cache.vector(9).unwrap();
    assert_eq!(far_vector, vec![9.0]);
}

#[test]
fn pin_bfs_with_zero_bound_pins_nothing() {
    let graph = ring_graph(4);
    let mut writer = Writer::builder(&graph)
        .with_feature(FeatureSpec::InlineVectors)
        .build()
        .unwrap();
    let mut bytes = Vec::new();
    writer.write(&mut bytes).unwrap();

    let view = OnDiskView::open_slice(bytes).unwrap();
    let mut cache = GraphCache::new(view);
    cache.pin_bfs(0, 0).unwrap();
    assert_eq!(cache.pinned_count(), 0);
}
