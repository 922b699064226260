//! LVQ and FUSED_ADC payload behavior, exercised through the public
//! writer/view API (the codec internals aren't exported).

use vamana_index::view::OnDiskView;
use vamana_index::writer::{FeatureSpec, Writer};
use vamana_index::{Similarity, SourceGraph};

fn build_graph(n: usize, d: usize) -> SourceGraph {
    let vectors: Vec<Vec<f32>> = (0..n)
        .map(|i| (0..d).map(|j| ((i * 7 + j * 3) % 11) as f32 - 5.0).collect())
        .collect();
    let neighbors: Vec<Vec<u64>> = (0..n as u64)
        .map(|i| (0..n as u64).filter(|&j| j != i).collect())
        .collect();
    SourceGraph::from_parts(vectors, neighbors).unwrap()
}

#[test]
fn lvq_reranker_dequantizes_to_an_approximate_vector() {
    let graph = build_graph(10, 16);
    let mut writer = Writer::builder(&graph)
        .with_feature(FeatureSpec::Lvq)
        .build()
        .unwrap();
    let mut bytes = Vec::new();
    writer.write(&mut bytes).unwrap();

    let mut view = OnDiskView::open_slice(bytes).unwrap();
    let query = graph.vector(0).unwrap().to_vec();
    let mut reranker = view.reranker_for(query, Similarity::Cosine).unwrap();

    // Scoring node 0 against its own (quantized, then dequantized) vector
    // should land close to perfect cosine similarity (1.0) — quantization
    // error is small relative to the vector's own magnitude.
    let self_score = reranker(&mut view, 0).unwrap();
    assert!(self_score > 0.9, "self_score was {self_score}");
}

#[test]
fn lvq_quantization_is_lossy_but_bounded() {
    let graph = build_graph(5, 8);
    let mut writer = Writer::builder(&graph)
        .with_feature(FeatureSpec::Lvq)
        .build()
        .unwrap();
    let mut bytes = Vec::new();
    writer.write(&mut bytes).unwrap();

    let mut view = OnDiskView::open_slice(bytes).unwrap();
    let query = vec![0.0; 8];
    let mut reranker = view.reranker_for(query, Similarity::Euclidean).unwrap();

    // Euclidean similarity is negated squared distance; scoring against the
    // zero vector should be finite and not NaN for every node.
    for k in 0..5u32 {
        let score = reranker(&mut view, k).unwrap();
        assert!(score.is_finite());
    }
}

#[test]
fn fused_adc_requires_dimension_divisible_by_subspaces() {
    let graph = build_graph(6, 10);
    let mut writer = Writer::builder(&graph)
        .with_feature(FeatureSpec::InlineVectors)
        .with_feature(FeatureSpec::FusedAdc { subspaces: 3 })
        .build()
        .unwrap();
    let mut bytes = Vec::new();
    assert!(writer.write(&mut bytes).is_err());
}

#[test]
fn fused_adc_scores_every_neighbor_slot_against_the_lookup_table() {
    let n = 12;
    let d = 8;
    let graph = build_graph(n, d);
    let mut writer = Writer::builder(&graph)
        .with_feature(FeatureSpec::InlineVectors)
        .with_feature(FeatureSpec::FusedAdc { subspaces: 4 })
        .build()
        .unwrap();
    let mut bytes = Vec::new();
    writer.write(&mut bytes).unwrap();

    let mut view = OnDiskView::open_slice(bytes).unwrap();
    assert!(view.has_fused_adc());

    let query = graph.vector(0).unwrap().to_vec();
    let mut scorer = view
        .approximate_score_function_for(query, Similarity::Euclidean)
        .unwrap();

    let max_degree = view.max_degree();
    for k in 0..n as u32 {
        let per_slot = scorer(&mut view, k).unwrap();
        assert_eq!(per_slot.len(), max_degree);
        for s in per_slot {
            assert!(s.is_finite());
            assert!(s >= 0.0);
        }
    }
}

#[test]
fn approximate_score_function_rejects_views_without_fused_adc() {
    let graph = build_graph(4, 6);
    let mut writer = Writer::builder(&graph)
        .with_feature(FeatureSpec::InlineVectors)
        .build()
        .unwrap();
    let mut bytes = Vec::new();
    writer.write(&mut bytes).unwrap();

    let mut view = OnDiskView::open_slice(bytes).unwrap();
    let query = vec![0.0; 6];
    assert!(view
        .approximate_score_function_for(query, Similarity::Cosine)
        .is_err());
}

#[test]
fn reranker_accepts_lvq_as_an_exact_score_feature_without_inline_vectors() {
    let n = 8;
    let d = 8;
    let graph = build_graph(n, d);
    let mut writer = Writer::builder(&graph)
        .with_feature(FeatureSpec::Lvq)
        .with_feature(FeatureSpec::FusedAdc { subspaces: 2 })
        .build()
        .unwrap();
    let mut bytes = Vec::new();
    writer.write(&mut bytes).unwrap();

    let mut view = OnDiskView::open_slice(bytes).unwrap();
    let query = vec![0.0; d];
    assert!(view.reranker_for(query, Similarity::Cosine).is_ok());
}

#[test]
fn vector_accessor_requires_inline_vectors_feature() {
    let graph = build_graph(4, 4);
    let mut writer = Writer::builder(&graph)
        .with_feature(FeatureSpec::Lvq)
        .build()
        .unwrap();
    let mut bytes = Vec::new();
    writer.write(&mut bytes).unwrap();

    let mut view = OnDiskView::open_slice(bytes).unwrap();
    assert!(view.vector(0).is_err());
}
