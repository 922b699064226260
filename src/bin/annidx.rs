//! CLI entry point for the `annidx` command-line tool.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use vamana_index::cli::commands;
use vamana_index::{FeatureKind, Similarity};

#[derive(Parser)]
#[command(
    name = "annidx",
    about = "On-disk Vamana/DiskANN-style proximity graph — build, inspect, and check artifacts"
)]
struct Cli {
    /// Output format: "text" (default) or "json"
    #[arg(long, default_value = "text")]
    format: String,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a synthetic artifact
    Build {
        /// Path to write the artifact to
        file: PathBuf,
        /// Number of nodes
        #[arg(long, default_value = "1000")]
        n: usize,
        /// Vector dimension
        #[arg(long, default_value = "64")]
        dimension: usize,
        /// Max degree (M)
        #[arg(long, default_value = "32")]
        m: usize,
        /// Comma-separated feature list: inline_vectors, lvq, fused_adc
        #[arg(long, default_value = "inline_vectors")]
        features: String,
        /// Number of FUSED_ADC subspaces, if requested
        #[arg(long, default_value = "8")]
        subspaces: usize,
    },
    /// Print header fields and record layout
    Inspect {
        /// Path to the artifact
        file: PathBuf,
    },
    /// Validate invariants 1-7 over every node
    Check {
        /// Path to the artifact
        file: PathBuf,
    },
    /// Score a node's neighbors against its own vector (smoke test)
    Probe {
        /// Path to the artifact
        file: PathBuf,
        /// Node ordinal to probe from
        #[arg(long, default_value = "0")]
        start: u32,
        /// Similarity: cosine, dot, euclidean
        #[arg(long, default_value = "cosine")]
        similarity: String,
    },
}

fn parse_features(spec: &str) -> Result<Vec<FeatureKind>, String> {
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s {
            "inline_vectors" => Ok(FeatureKind::InlineVectors),
            "lvq" => Ok(FeatureKind::Lvq),
            "fused_adc" => Ok(FeatureKind::FusedAdc),
            other => Err(format!("unknown feature '{other}'")),
        })
        .collect()
}

fn parse_similarity(s: &str) -> Result<Similarity, String> {
    match s {
        "cosine" => Ok(Similarity::Cosine),
        "dot" => Ok(Similarity::Dot),
        "euclidean" => Ok(Similarity::Euclidean),
        other => Err(format!("unknown similarity '{other}'")),
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        // env_logger is only available in dev/test builds
        eprintln!("Verbose mode enabled");
    }

    let json = cli.format == "json";

    let result = match cli.command {
        Commands::Build {
            file,
            n,
            dimension,
            m,
            features,
            subspaces,
        } => parse_features(&features)
            .map_err(|e| vamana_index::AnnError::precondition(e))
            .and_then(|features| {
                commands::cmd_build(&file, n, dimension, m, &features, subspaces, json)
            }),
        Commands::Inspect { file } => commands::cmd_inspect(&file, json),
        Commands::Check { file } => commands::cmd_check(&file),
        Commands::Probe {
            file,
            start,
            similarity,
        } => parse_similarity(&similarity)
            .map_err(|e| vamana_index::AnnError::precondition(e))
            .and_then(|similarity| commands::cmd_probe(&file, start, similarity)),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        process::exit(1);
    }
}
