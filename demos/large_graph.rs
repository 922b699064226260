//! 100K node performance demo.
//!
//! Uses `SourceGraph::from_parts` for fast bulk construction.

use std::time::Instant;

use rand::Rng;
use vamana_index::{AnnResult, FeatureSpec, OnDiskView, Similarity, SourceGraph, Writer};

fn main() -> AnnResult<()> {
    let dimension = 128;
    let node_count = 100_000;
    let max_degree = 16;

    println!("Creating graph with {node_count} nodes...");
    let start = Instant::now();
    let mut rng = rand::thread_rng();

    let vectors: Vec<Vec<f32>> = (0..node_count)
        .map(|_| (0..dimension).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect();
    println!("  Vectors created in {:?}", start.elapsed());

    let start = Instant::now();
    let neighbors: Vec<Vec<u64>> = (0..node_count)
        .map(|i| {
            (1..=max_degree)
                .map(|j| ((i + j * 7) % node_count) as u64)
                .filter(|&target| target != i as u64)
                .collect()
        })
        .collect();

    let graph = SourceGraph::from_parts(vectors, neighbors)?;
    println!(
        "  Graph built in {:?} ({} nodes, dimension {})",
        start.elapsed(),
        graph.len(),
        graph.dimension()
    );

    // Write to file.
    let path = std::path::Path::new("/tmp/vamana_large_graph.annidx");
    let start = Instant::now();
    let mut writer = Writer::builder(&graph)
        .with_feature(FeatureSpec::InlineVectors)
        .build()?;
    let file = std::fs::File::create(path)?;
    let mut out = std::io::BufWriter::new(file);
    writer.write(&mut out)?;
    let file_size = std::fs::metadata(path)?.len();
    println!(
        "  Written to file in {:?} ({:.1} MB)",
        start.elapsed(),
        file_size as f64 / 1_048_576.0
    );

    // Read back via mmap.
    let start = Instant::now();
    let mut view = OnDiskView::open(path)?;
    println!("  Opened in {:?}", start.elapsed());
    println!(
        "  Loaded: {} nodes, D={}, M={}",
        view.size(),
        view.dimension(),
        view.max_degree()
    );

    // Neighbor lookups.
    let start = Instant::now();
    let mut visited = 0usize;
    for k in (0..node_count as u32).step_by(100) {
        visited += view.neighbors(k)?.count();
    }
    println!(
        "  {visited} neighbor slots read over {} probes in {:?}",
        node_count / 100,
        start.elapsed()
    );

    // Rerank a handful of candidates against a random query.
    let query: Vec<f32> = (0..dimension).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let mut reranker = view.reranker_for(query, Similarity::Cosine)?;
    let start = Instant::now();
    let mut best = (0u32, f32::NEG_INFINITY);
    for k in (0..node_count as u32).step_by(1000) {
        let score = reranker(&mut view, k)?;
        if score > best.1 {
            best = (k, score);
        }
    }
    println!(
        "  Best of {} sampled candidates: node {} (score {:.4}) in {:?}",
        node_count / 1000,
        best.0,
        best.1,
        start.elapsed()
    );

    println!("\nDone!");
    Ok(())
}
