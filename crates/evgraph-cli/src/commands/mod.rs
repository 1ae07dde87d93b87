//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use evgraph_graph::GraphConfig;

pub mod graph;
pub mod inspect;

/// evgraph - materialize event-log submit actions as a Neo4j graph
#[derive(Parser)]
#[command(name = "evgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Neo4j connection settings.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Bolt URI of the Neo4j server
    #[arg(long, global = true, env = "NEO4J_URI")]
    pub uri: Option<String>,

    /// Neo4j user
    #[arg(long, global = true, env = "NEO4J_USER")]
    pub user: Option<String>,

    /// Neo4j password
    #[arg(long, global = true, env = "NEO4J_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Target database
    #[arg(long, global = true, env = "NEO4J_DATABASE")]
    pub database: Option<String>,
}

impl ConnectionArgs {
    /// Overlay the given flags on the default configuration.
    pub fn to_config(&self) -> GraphConfig {
        let defaults = GraphConfig::default();
        GraphConfig {
            uri: self.uri.clone().unwrap_or(defaults.uri),
            user: self.user.clone().unwrap_or(defaults.user),
            password: self.password.clone().unwrap_or(defaults.password),
            database: self.database.clone().unwrap_or(defaults.database),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a CSV event log into the graph
    Load(graph::LoadArgs),

    /// Delete every node and relationship in batches
    Reset(graph::ResetArgs),

    /// Show graph node/relationship counts
    Status,

    /// Derive the graph from a CSV event log without writing it
    Inspect(inspect::InspectArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.connection.to_config();

        match self.command {
            Commands::Load(args) => graph::cmd_load(args, &config).await,
            Commands::Reset(args) => graph::cmd_reset(args, &config).await,
            Commands::Status => graph::cmd_status(&config).await,
            Commands::Inspect(args) => inspect::execute(args),
        }
    }
}
