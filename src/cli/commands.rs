//! CLI command implementations for the `annidx` binary: `build`, `inspect`,
//! `check`. Following the teacher's `cli::commands` + `bin/amem.rs` split —
//! this module holds the logic, the binary only parses arguments.

use std::path::Path;

use rand::Rng;

use crate::error::AnnResult;
use crate::feature::FeatureKind;
use crate::graph::SourceGraph;
use crate::similarity::Similarity;
use crate::view::OnDiskView;
use crate::writer::{FeatureSpec, Writer};

/// Build a synthetic random graph and write it to `path`.
///
/// Each node gets a random unit-ish vector and `min(m, n-1)` neighbors
/// chosen from the rest of the graph — a stand-in for a real in-memory
/// graph builder, which is an external collaborator to this format.
pub fn cmd_build(
    path: &Path,
    n: usize,
    dimension: usize,
    m: usize,
    features: &[FeatureKind],
    subspaces: usize,
    json: bool,
) -> AnnResult<()> {
    let mut rng = rand::thread_rng();
    let degree = m.min(n.saturating_sub(1));

    let vectors: Vec<Vec<f32>> = (0..n)
        .map(|_| (0..dimension).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect();
    let neighbor_lists: Vec<Vec<u64>> = (0..n as u64)
        .map(|id| {
            let mut neighbors = Vec::with_capacity(degree);
            while neighbors.len() < degree {
                let candidate = rng.gen_range(0..n as u64);
                if candidate != id && !neighbors.contains(&candidate) {
                    neighbors.push(candidate);
                }
            }
            neighbors
        })
        .collect();
    let graph = SourceGraph::from_parts(vectors, neighbor_lists)?;

    let mut builder = Writer::builder(&graph);
    for &kind in features {
        builder = builder.with_feature(match kind {
            FeatureKind::InlineVectors => FeatureSpec::InlineVectors,
            FeatureKind::Lvq => FeatureSpec::Lvq,
            FeatureKind::FusedAdc => FeatureSpec::FusedAdc { subspaces },
        });
    }
    let mut writer = builder.build()?;

    let file = std::fs::File::create(path)?;
    let mut out = std::io::BufWriter::new(file);
    writer.write(&mut out)?;

    if json {
        println!(
            "{}",
            serde_json::json!({"file": path.display().to_string(), "nodes": n, "dimension": dimension, "max_degree": m})
        );
    } else {
        println!(
            "Wrote {} nodes, D={dimension}, M={m} to {}",
            n,
            path.display()
        );
    }
    Ok(())
}

/// Print header fields and record layout for an existing artifact.
pub fn cmd_inspect(path: &Path, json: bool) -> AnnResult<()> {
    let view = OnDiskView::open(path)?;
    let file_size = std::fs::metadata(path)?.len();

    if json {
        let info = serde_json::json!({
            "file": path.display().to_string(),
            "version": view.version(),
            "size": view.size(),
            "dimension": view.dimension(),
            "max_degree": view.max_degree(),
            "entry_node": view.entry_node(),
            "has_fused_adc": view.has_fused_adc(),
            "file_size": file_size,
        });
        println!("{}", serde_json::to_string_pretty(&info).unwrap_or_default());
    } else {
        println!("File: {}", path.display());
        println!("Version: {}", view.version());
        println!("Nodes (N): {}", view.size());
        println!("Dimension (D): {}", view.dimension());
        println!("Max degree (M): {}", view.max_degree());
        println!("Entry node: {}", view.entry_node());
        println!("FUSED_ADC present: {}", view.has_fused_adc());
        println!("File size: {file_size} bytes");
    }
    Ok(())
}

/// Open a view and validate invariants 1-7 over every node, reporting the
/// first failure (if any).
pub fn cmd_check(path: &Path) -> AnnResult<()> {
    let mut view = OnDiskView::open(path)?;
    let n = view.size();

    if n > 0 && view.entry_node() as usize >= n {
        return Err(crate::error::AnnError::format(format!(
            "entry node {} out of range [0, {n})",
            view.entry_node()
        )));
    }

    for k in 0..n as u32 {
        view.check_sanity_ordinal(k)?;
        // neighbors() itself validates count <= M and every id in [0,N)∪{-1}.
        let _ = view.neighbors(k)?;
    }

    println!("OK: {n} nodes checked, all invariants hold");
    Ok(())
}

/// Score a random query against every neighbor of `start` using the exact
/// reranker, for a quick smoke test of the view's scoring path.
pub fn cmd_probe(path: &Path, start: u32, similarity: Similarity) -> AnnResult<()> {
    let mut view = OnDiskView::open(path)?;
    let dimension = view.dimension();
    if dimension == 0 {
        return Err(crate::error::AnnError::unsupported(
            "probe requires a view with a known dimension (INLINE_VECTORS or LVQ)",
        ));
    }
    let query = match view.vector(start) {
        Ok(v) => v,
        Err(_) => {
            log::warn!("no INLINE_VECTORS vector for node {start}; probing with a zero query");
            vec![0.0; dimension]
        }
    };
    let mut reranker = view.reranker_for(query, similarity)?;

    for neighbor in view.neighbors(start)?.collect::<Vec<_>>() {
        let score = reranker(&mut view, neighbor as u32)?;
        println!("neighbor {neighbor}: score={score:.4}");
    }
    Ok(())
}
