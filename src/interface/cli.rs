use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::StressMode;

/// Container utilization alerts and synthetic load injection
#[derive(Debug, Parser)]
#[command(name = "dockguard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML config file (can also be set via DOCKGUARD_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check every running container once and alert on threshold breaches
    Monitor {
        /// Repeat the pass every N seconds until interrupted
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },

    /// Run a CPU and/or memory stress workload inside containers
    Stress {
        /// Container name(s) or ID(s)
        #[arg(long = "containers", short = 'c', num_args = 1.., required = true)]
        containers: Vec<String>,

        /// Stress type
        #[arg(long, short, value_enum, default_value_t = StressMode::Cpu)]
        mode: StressMode,

        /// Duration in seconds
        #[arg(long, short, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
        duration: u64,
    },
}
