//! Dry-run derivation of a CSV export.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::output;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// CSV event-log export
    pub path: PathBuf,

    /// Print the derived nodes and relationships as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let (stats, batch) = evgraph_graph::prepare_path(&args.path)?;

    if args.json {
        let json = serde_json::to_string_pretty(&batch).context("Failed to serialize graph batch")?;
        println!("{}", json);
    } else {
        output::print_prepare_stats(&stats);
        output::print_batch_summary(&batch);
    }

    Ok(())
}
