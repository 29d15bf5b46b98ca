//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ucontainer")]
#[command(author, version, about = "Drive scheduler and memory containers from many threads", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: SubCommand,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output (debug logging unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write the report to a file instead of stdout
    #[arg(long, short, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// JSON file with limit overrides
    #[arg(long, global = true, value_name = "FILE", env = "UCONTAINER_LIMITS")]
    pub limits: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum SubCommand {
    /// Round-robin threads through scheduler containers
    Schedule {
        /// Number of containers
        #[arg(long, short, default_value = "1")]
        containers: u64,

        /// Number of threads, assigned to containers in turn
        #[arg(long, short, default_value = "4")]
        threads: usize,

        /// Switches each thread performs before leaving
        #[arg(long, short, default_value = "8")]
        switches: usize,
    },

    /// Share locked counters through memory containers
    Memory {
        /// Number of containers
        #[arg(long, short, default_value = "1")]
        containers: u64,

        /// Number of threads, assigned to containers in turn
        #[arg(long, short, default_value = "4")]
        threads: usize,

        /// Objects mapped by every thread
        #[arg(long, default_value = "4")]
        objects: u64,

        /// Locked increments each thread performs
        #[arg(long, short, default_value = "1000")]
        iterations: usize,

        /// Size of each object in bytes
        #[arg(long, default_value = "4096")]
        object_size: usize,
    },
}
