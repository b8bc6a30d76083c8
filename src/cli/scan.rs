//! `warden scan` — run the pipeline over a project tree.

use anyhow::Context;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::ci::{self, CiPlatform};
use crate::cli::ScanArgs;
use crate::config::{validate_config, Config, RulesFile};
use crate::discovery::{discover, DiscoveredFile, DiscoveryOptions};
use crate::frames::FrameRegistry;
use crate::incremental::select_files;
use crate::pipeline::Orchestrator;
use crate::progress::progress_sink;
use crate::report;
use crate::types::PipelineResult;
use crate::utils::paths::{canonicalize_safe, ensure_parent_dir};

pub async fn run(args: ScanArgs, quiet: bool) -> anyhow::Result<i32> {
    let root = canonicalize_safe(&args.path);
    if !root.is_dir() {
        anyhow::bail!("project root is not a directory: {}", root.display());
    }

    let mut config = Config::load(&root).context("failed to load configuration")?;
    let rules = RulesFile::load(&root).context("failed to load rules")?;
    let registry = FrameRegistry::with_builtins(&root, &rules);

    let validation = validate_config(&config, &rules, &registry.ids());
    for issue in &validation.issues {
        match issue.severity {
            crate::config::IssueSeverity::Error => {
                eprintln!("config error: {}", issue.message)
            }
            crate::config::IssueSeverity::Warning => warn!("{}", issue.message),
            crate::config::IssueSeverity::Info => info!("{}", issue.message),
        }
    }
    if validation.has_errors() {
        return Ok(2);
    }

    if !args.frames.is_empty() {
        config.frames.enabled = args.frames.clone();
    }
    if let Some(fail_on) = args.fail_on {
        fail_on.apply(&mut config.thresholds);
    }

    let options = DiscoveryOptions {
        max_depth: args.max_depth,
        honor_ignores: !args.no_ignores,
    };
    let discovery = discover(&root, &options);

    let mut metadata: HashMap<String, serde_json::Value> = HashMap::new();
    metadata.insert(
        "files_discovered".to_string(),
        serde_json::json!(discovery.files.len()),
    );
    if let Some(framework) = &discovery.frameworks.primary {
        metadata.insert("framework".to_string(), serde_json::json!(framework));
    }

    let batch: Vec<DiscoveredFile> = match &args.diff {
        Some(base) => {
            let base = if base.is_empty() {
                None
            } else {
                Some(base.as_str())
            };
            let selection = select_files(&root, &discovery.files, base, &config.incremental);
            metadata.insert(
                "reduction_percentage".to_string(),
                serde_json::json!(selection.reduction_percentage),
            );
            metadata.insert(
                "base_ref".to_string(),
                serde_json::json!(selection.base_ref),
            );
            selection.files
        }
        None => discovery.files.clone(),
    };
    metadata.insert("files_scanned".to_string(), serde_json::json!(batch.len()));

    let config = Arc::new(config);
    let orchestrator = Orchestrator::new(registry, Arc::clone(&config), Arc::new(rules))
        .with_events(progress_sink(!quiet && args.format.is_none()));

    // first ctrl-c cancels cooperatively, the second is a hard exit
    let cancel = orchestrator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("cancellation requested, finalizing partial results");
            cancel.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(2);
            }
        }
    });

    let result = orchestrator.run(&root, &batch, metadata).await;

    if !quiet {
        print_summary(&result, config.output.max_display);
    }

    // a formatted report on stdout must never interleave with annotations
    let format_to_stdout = args.format.is_some() && args.out.is_none();
    if !args.no_annotations && !format_to_stdout {
        let platform = ci::detect_platform();
        ci::emit_annotations(&result, platform, &mut std::io::stdout())?;
        if platform == CiPlatform::Github {
            ci::persist_github_outputs(&result)?;
        }
    }

    report::write_reports(&root, &config.output.reports_dir, &result).await?;

    if let Some(format) = args.format {
        let rendered = format.render(&result)?;
        match &args.out {
            Some(path) => {
                ensure_parent_dir(path).await?;
                tokio::fs::write(path, rendered).await?;
            }
            None => println!("{}", rendered),
        }
    }

    Ok(ci::exit_code(&result))
}

/// Concise console summary: status line, count breakdown, then the first N
/// findings per frame. The JSON report always carries the full list.
pub fn print_summary(result: &PipelineResult, max_display: usize) {
    println!(
        "\n{} — {} findings across {} frames ({} passed, {} failed, {} skipped)",
        result.status,
        result.total_findings,
        result.total_frames,
        result.frames_passed,
        result.frames_failed,
        result.frames_skipped,
    );
    let counts = &result.findings_by_severity;
    println!(
        "critical: {}  high: {}  medium: {}  low: {}  info: {}  suppressed: {}",
        counts.critical,
        counts.high,
        counts.medium,
        counts.low,
        counts.info,
        result.suppressed_count(),
    );

    for frame in &result.frame_results {
        if frame.findings.is_empty() {
            continue;
        }
        println!("\n[{}] {} — {} issues", frame.frame_id, frame.status, frame.issues_found);
        for finding in frame.findings.iter().take(max_display) {
            let location = match (&finding.file_path, finding.line) {
                (Some(file), Some(line)) => format!("{}:{}", file.display(), line),
                (Some(file), None) => file.display().to_string(),
                _ => "-".to_string(),
            };
            println!(
                "  {:<8} {:<40} {}",
                finding.severity, location, finding.message
            );
        }
        if frame.findings.len() > max_display {
            println!("  ... and {} more", frame.findings.len() - max_display);
        }
    }
}
