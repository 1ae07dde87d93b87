//! Graph CLI commands: load, reset, status.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;

use evgraph_graph::sink::{DEFAULT_RESET_BATCH_SIZE, DEFAULT_WRITE_CHUNK_SIZE};
use evgraph_graph::{GraphClient, GraphConfig, GraphSink, LoadOptions, Neo4jSink};

use crate::output;

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// CSV event-log export
    pub path: PathBuf,

    /// Clear the graph before loading
    #[arg(long)]
    pub reset: bool,

    /// Skip creating the user/event uniqueness constraints
    #[arg(long)]
    pub no_schema: bool,

    /// Rows per write statement
    #[arg(long, default_value_t = DEFAULT_WRITE_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Nodes deleted per batch when --reset is given
    #[arg(long, default_value_t = DEFAULT_RESET_BATCH_SIZE)]
    pub reset_batch_size: usize,
}

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Nodes deleted per batch
    #[arg(long, default_value_t = DEFAULT_RESET_BATCH_SIZE)]
    pub batch_size: usize,
}

/// Load a CSV export into Neo4j.
pub async fn cmd_load(args: LoadArgs, config: &GraphConfig) -> Result<()> {
    println!("{} {}", "Loading".bold(), args.path.display().to_string().cyan());

    let client = connect(config).await?;
    let sink = Neo4jSink::with_chunk_size(client, args.chunk_size);
    let options = LoadOptions {
        reset_first: args.reset,
        reset_batch_size: args.reset_batch_size,
        ensure_schema: !args.no_schema,
    };

    let result = evgraph_graph::run_pipeline(&sink, &args.path, &options).await?;

    output::print_load_result(&result);
    Ok(())
}

/// Delete all graph state in bounded batches.
pub async fn cmd_reset(args: ResetArgs, config: &GraphConfig) -> Result<()> {
    let client = connect(config).await?;
    let sink = Neo4jSink::new(client);

    let summary = evgraph_graph::reset(&sink, args.batch_size, |total| {
        println!("Deleted {} nodes so far", total.to_string().yellow());
    })
    .await?;

    println!("{}", "Finished deleting nodes.".green().bold());
    println!("  Batches: {}", summary.batches);
    Ok(())
}

/// Show graph status (node/relationship counts).
pub async fn cmd_status(config: &GraphConfig) -> Result<()> {
    let sink = Neo4jSink::new(connect(config).await?);
    let counts = sink.counts().await?;

    println!("{}", "Graph Status".bold());
    println!("{}", "─".repeat(40));
    println!("  Database:      {}", config.database.cyan());
    println!("  Nodes:         {}", counts.nodes.to_string().cyan());
    println!("  Relationships: {}", counts.relationships.to_string().cyan());
    println!("{}", "─".repeat(40));

    Ok(())
}

async fn connect(config: &GraphConfig) -> Result<GraphClient> {
    debug!(
        uri = %config.uri,
        user = %config.user,
        database = %config.database,
        "Connecting to Neo4j"
    );
    GraphClient::connect(config).await
}
