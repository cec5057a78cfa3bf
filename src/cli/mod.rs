pub mod commands;

use clap::Parser;

pub use commands::{Commands, ScanArgs};

/// Basecheck — browser-support checker
///
/// Finds uses of web-platform features your target browsers don't support
/// yet, straight from your source tree.
#[derive(Parser, Debug)]
#[command(
    name = "basecheck",
    version,
    about = "🌐 Basecheck — browser-support checker",
    long_about = "Basecheck scans your source files for uses of web-platform features\nand classifies each one against a browser-support target.\nIt works locally and gives fast feedback."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}
