//! # evgraph Graph
//!
//! Neo4j persistence for evgraph.
//!
//! Provides the connection client, schema constraints, the transactional
//! graph sink with its batched reset, and the end-to-end load pipeline.

pub mod client;
pub mod pipeline;
pub mod schema;
pub mod sink;

pub use client::{GraphClient, GraphConfig, GraphCounts};
pub use pipeline::{
    load_records, prepare_batch, prepare_path, run_pipeline, LoadOptions, LoadResult, PrepareStats,
};
pub use sink::{reset, GraphSink, Neo4jSink, ResetSummary, WriteSummary};
