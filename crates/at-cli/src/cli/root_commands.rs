use std::path::PathBuf;

use clap::{Args, Subcommand};

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a JSON-lines interaction script through a headless tracker
    Replay(ReplayArgs),
    /// Print the resolved configuration as TOML
    Config,
    /// Print the JSON Schema of the batch payload
    Schema,
    /// Print the durable user id, creating it if needed
    Identity,
}

#[derive(Debug, Clone, Args)]
pub struct ReplayArgs {
    /// Script file, one step object per line
    pub script: PathBuf,

    /// Collector endpoint (overrides collector.endpoint)
    #[arg(long)]
    pub endpoint: Option<String>,
}
