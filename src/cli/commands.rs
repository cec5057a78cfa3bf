use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a directory for unsupported feature uses
    Scan(ScanArgs),

    /// Initialize a .basecheck.toml config file in the current directory
    Init,

    /// List the built-in support targets
    Targets,

    /// List the features the catalog knows about
    Features,
}

#[derive(clap::Args, Debug)]
pub struct ScanArgs {
    /// Path to scan (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output format: "terminal" or "json"
    #[arg(short, long, default_value = "terminal")]
    pub format: String,

    /// Write a JSON snapshot to file
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Support target: "modern" or "enterprise" (overrides config)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Load the feature catalog from a JSON file instead of the built-in one
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Search query applied to the report (whitespace-separated terms,
    /// all must match)
    #[arg(long)]
    pub search: Option<String>,

    /// Verdicts to show (comma-separated). Values: BLOCKED, WARNING, SAFE
    #[arg(long)]
    pub severity: Option<String>,

    /// Sort order: "severity" or "file"
    #[arg(long)]
    pub sort: Option<String>,

    /// Group repeated occurrences of one feature+token per file
    #[arg(long)]
    pub grouped: bool,

    /// Fail (exit code 1) if findings at or above this verdict exist.
    /// Values: BLOCKED, WARNING, SAFE
    #[arg(long)]
    pub fail_on: Option<String>,

    /// Maximum file size in bytes to scan (skip larger files)
    #[arg(long, default_value = "1048576")]
    pub max_file_size: u64,

    /// Glob patterns to include (can be repeated)
    #[arg(long)]
    pub include: Vec<String>,

    /// Glob patterns to exclude (can be repeated)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Ignore .basecheck.toml config files found near the scanned path
    #[arg(long)]
    pub no_config: bool,
}
