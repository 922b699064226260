//! Basic build -> write -> view flow.

use vamana_index::{AnnResult, FeatureSpec, OnDiskView, Similarity, SourceGraph, Writer};

fn main() -> AnnResult<()> {
    // A tiny 5-node graph over 4-dimensional vectors, each node connected to
    // its two ring neighbors.
    let vectors: Vec<Vec<f32>> = vec![
        vec![1.0, 0.0, 0.0, 0.0],
        vec![0.0, 1.0, 0.0, 0.0],
        vec![0.0, 0.0, 1.0, 0.0],
        vec![0.0, 0.0, 0.0, 1.0],
        vec![0.5, 0.5, 0.0, 0.0],
    ];
    let neighbors: Vec<Vec<u64>> = (0..5u64)
        .map(|i| vec![(i + 1) % 5, (i + 4) % 5])
        .collect();
    let graph = SourceGraph::from_parts(vectors, neighbors)?;

    println!(
        "Graph created with {} nodes, dimension {}",
        graph.len(),
        graph.dimension()
    );

    let mut writer = Writer::builder(&graph)
        .with_feature(FeatureSpec::InlineVectors)
        .build()?;

    let path = std::path::Path::new("/tmp/vamana_basic_usage.annidx");
    let file = std::fs::File::create(path)?;
    let mut out = std::io::BufWriter::new(file);
    writer.write(&mut out)?;
    println!("Saved to {}", path.display());

    // Reload and verify.
    let mut view = OnDiskView::open(path)?;
    println!(
        "Reloaded: {} nodes, D={}, M={}",
        view.size(),
        view.dimension(),
        view.max_degree()
    );

    let query = view.vector(0)?;
    let mut reranker = view.reranker_for(query, Similarity::Cosine)?;
    println!("Scores from node 0's own vector:");
    for neighbor in view.neighbors(0)?.collect::<Vec<_>>() {
        let score = reranker(&mut view, neighbor as u32)?;
        println!("  node {neighbor}: {score:.4}");
    }

    Ok(())
}
