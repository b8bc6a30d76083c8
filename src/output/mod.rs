//! # Output Formats
//!
//! Machine- and human-readable renderings of a `PipelineResult`: the JSON
//! result schema, SARIF 2.1.0 and the Markdown summary. All formats are
//! deterministic for identical input.

pub mod json;
pub mod markdown;
pub mod sarif;

pub use json::to_report_json;
pub use markdown::to_markdown;
pub use sarif::to_sarif;

use clap::ValueEnum;

/// Output format selected on the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Sarif,
    Md,
}

impl OutputFormat {
    pub fn render(&self, result: &crate::types::PipelineResult) -> anyhow::Result<String> {
        Ok(match self {
            OutputFormat::Json => serde_json::to_string_pretty(&to_report_json(result))?,
            OutputFormat::Sarif => serde_json::to_string_pretty(&to_sarif(result))?,
            OutputFormat::Md => to_markdown(result),
        })
    }
}
