//! On-disk Vamana/DiskANN-style proximity graph: a self-describing binary
//! container over a directed ANN graph, with pluggable per-node feature
//! payloads (raw vectors, scalar quantization, fused product-quantization
//! codes) co-located with each node's adjacency list.
//!
//! The write path ([`graph::SourceGraph`] + [`writer::Writer`]) renumbers a
//! source graph's node ids into dense ordinals and streams a fixed-stride
//! artifact. The read path ([`view::OnDiskView`]) opens that artifact by
//! memory map and answers random-access neighbor/vector/score queries
//! without loading the whole graph into memory.

pub mod cache;
pub mod cli;
pub mod codec;
pub mod error;
pub mod feature;
pub mod graph;
pub mod header;
pub mod ordinal;
pub mod similarity;
pub mod view;
pub mod writer;

pub use cache::{GraphCache, PinnedNode};
pub use codec::{ByteSource, Cursor, MmapSource, SliceSource};
pub use error::{AnnError, AnnResult};
pub use feature::{DecodedAdcCodes, DecodedLvqCodes, DecodedVector, FeatureKind, FeatureSet};
pub use graph::SourceGraph;
pub use header::{CommonHeader, Header, CURRENT_VERSION, MAGIC_V1};
pub use ordinal::OrdinalMapping;
pub use similarity::Similarity;
pub use view::{NeighborIter, OnDiskView};
pub use writer::{FeatureSpec, Writer, WriterBuilder};
