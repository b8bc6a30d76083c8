//! `warden analyze <file>` — single-file pipeline run. Shares the scan
//! path end to end; the scope is just one file.

use anyhow::Context;
use std::collections::HashMap;
use std::sync::Arc;

use crate::ci;
use crate::cli::AnalyzeArgs;
use crate::config::{Config, RulesFile};
use crate::discovery::{DiscoveredFile, FileType};
use crate::frames::FrameRegistry;
use crate::pipeline::Orchestrator;
use crate::progress::progress_sink;
use crate::utils::paths::canonicalize_safe;

use super::scan::print_summary;

pub async fn run(args: AnalyzeArgs, quiet: bool) -> anyhow::Result<i32> {
    let file = canonicalize_safe(&args.file);
    if !file.is_file() {
        anyhow::bail!("not a file: {}", file.display());
    }
    let root = file
        .parent()
        .map(|p| p.to_path_buf())
        .context("file has no parent directory")?;

    let mut config = Config::load(&root).unwrap_or_default();
    if !args.frames.is_empty() {
        config.frames.enabled = args.frames.clone();
    }
    if let Some(fail_on) = args.fail_on {
        fail_on.apply(&mut config.thresholds);
    }
    let rules = RulesFile::load(&root).unwrap_or_default();
    let registry = FrameRegistry::with_builtins(&root, &rules);

    let file_type = FileType::classify(&file);
    let size_bytes = std::fs::metadata(&file).map(|m| m.len()).unwrap_or(0);
    let batch = vec![DiscoveredFile {
        language: file_type.language().map(String::from),
        is_analyzable: file_type.is_analyzable(),
        path: file.clone(),
        file_type,
        size_bytes,
    }];

    let mut metadata: HashMap<String, serde_json::Value> = HashMap::new();
    metadata.insert("single_file".to_string(), serde_json::json!(true));

    let config = Arc::new(config);
    let orchestrator = Orchestrator::new(registry, Arc::clone(&config), Arc::new(rules))
        .with_events(progress_sink(false));
    let result = orchestrator.run(&root, &batch, metadata).await;

    if !quiet {
        print_summary(&result, config.output.max_display);
    }
    if let Some(format) = args.format {
        println!("{}", format.render(&result)?);
    }

    Ok(ci::exit_code(&result))
}
