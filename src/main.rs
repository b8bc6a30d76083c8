//! # Warden CLI
//!
//! Entry point for the `warden` command-line tool.
//!
//! ## Usage
//!
//! ```bash
//! warden scan [path] [--frames a,b] [--diff [base]] [--format json|sarif|md]
//! warden analyze <file>
//! warden frames
//! warden install [--force-update]
//! warden status
//! ```

use clap::Parser;
use tracing_subscriber::EnvFilter;

use warden::cli::{analyze, frames, install, scan, status, Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warden={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let outcome = match cli.command {
        Commands::Scan(args) => scan::run(args, cli.quiet).await,
        Commands::Analyze(args) => analyze::run(args, cli.quiet).await,
        Commands::Frames(args) => frames::run(args).await,
        Commands::Install(args) => install::run(args, cli.quiet).await,
        Commands::Status(args) => status::run(args).await,
    };

    let code = match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            2
        }
    };
    std::process::exit(code);
}
