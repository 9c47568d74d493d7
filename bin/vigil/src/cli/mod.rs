pub mod constants;
pub mod monitor_node;

use clap::{Parser, Subcommand};

use crate::cli::monitor_node::MonitorNodeConfig;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the validator duty monitor
    #[command(name = "monitor")]
    Monitor(MonitorNodeConfig),
}
