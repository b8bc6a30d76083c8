use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod analyze;
pub mod frames;
pub mod install;
pub mod scan;
pub mod status;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "warden",
    version,
    about = "A multi-frame static code analyzer with CI-first output",
    long_about = "Warden classifies a source tree, runs an ordered set of validation frames,\n\
                  deduplicates and suppresses findings, and emits JSON, SARIF 2.1.0 and\n\
                  CI-platform annotations.\n\
                  • Deterministic findings with stable fingerprints\n\
                  • Frame-level timeouts, failure policies and cancellation\n\
                  • Incremental scans driven by git diffs"
)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline over a project tree (primary command)
    Scan(ScanArgs),

    /// Run the pipeline over a single file
    Analyze(AnalyzeArgs),

    /// List registered frames
    Frames(FramesArgs),

    /// Install frames declared in config
    Install(InstallArgs),

    /// Print the last-run status summary
    Status(StatusArgs),
}

/// Lowest severity that fails the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailOn {
    Critical,
    High,
    Medium,
}

#[derive(Parser)]
pub struct ScanArgs {
    /// Project root to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Comma-separated frame ids to run (default: all enabled in config)
    #[arg(long, value_delimiter = ',')]
    pub frames: Vec<String>,

    /// Scan only git-changed files, optionally against an explicit base ref
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    pub diff: Option<String>,

    /// Render the result in this format to stdout (or --out)
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Write the rendered format to this file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Lowest severity that fails the pipeline
    #[arg(long)]
    pub fail_on: Option<FailOn>,

    /// Maximum directory depth for discovery
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Skip .gitignore/.wardenignore handling
    #[arg(long)]
    pub no_ignores: bool,

    /// Skip CI annotations even when a CI platform is detected
    #[arg(long)]
    pub no_annotations: bool,
}

#[derive(Parser)]
pub struct AnalyzeArgs {
    /// File to analyze
    pub file: PathBuf,

    /// Comma-separated frame ids to run
    #[arg(long, value_delimiter = ',')]
    pub frames: Vec<String>,

    /// Render the result in this format to stdout
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Lowest severity that fails the pipeline
    #[arg(long)]
    pub fail_on: Option<FailOn>,
}

#[derive(Parser)]
pub struct FramesArgs {
    /// Project root (installed frames are discovered beneath it)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Parser)]
pub struct InstallArgs {
    /// Project root
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Reinstall bundles even when their lock hash matches
    #[arg(long)]
    pub force_update: bool,
}

#[derive(Parser)]
pub struct StatusArgs {
    /// Project root
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

impl FailOn {
    /// Apply the CLI override on top of configured thresholds
    pub fn apply(&self, thresholds: &mut crate::config::ThresholdConfig) {
        thresholds.fail_on_critical = true;
        thresholds.fail_on_high = matches!(self, FailOn::High | FailOn::Medium);
        thresholds.fail_on_medium = matches!(self, FailOn::Medium);
    }
}
