//! # Frames Module
//!
//! A frame is a self-contained analyzer that produces findings. Frames
//! implement the [`Frame`] trait and are registered with the
//! [`FrameRegistry`], which resolves execution order.
//!
//! ## Built-in frames
//!
//! - `security`: hardcoded secrets, injection patterns, weak cryptography
//! - `architecture`: structural smells (oversized files, wildcard imports)
//! - `orphan`: dead and commented-out code
//! - `chaos`: failure-handling hygiene (bare excepts, swallowed errors)
//! - `stress`: performance anti-patterns
//! - `contract`: cross-platform API contract checks
//! - `custom`: user-defined rules from `.warden/rules.yaml`
//!
//! Installed frame bundles under `.warden/frames/` are loaded as rule-driven
//! frames from their manifests.

pub mod architecture;
pub mod chaos;
pub mod contract;
pub mod custom;
pub mod installed;
pub mod orphan;
pub mod security;
pub mod stress;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

use crate::cache::ContentCache;
use crate::config::{Config, RulesFile};
use crate::discovery::DiscoveredFile;
use crate::error::{Result, WardenError};
use crate::types::{Finding, Priority};

/// Phases the pipeline passes through exactly once, in this order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    PreAnalysis,
    Analysis,
    Classification,
    Validation,
    Fortification,
    Cleaning,
}

impl PipelinePhase {
    pub const ALL: [PipelinePhase; 6] = [
        PipelinePhase::PreAnalysis,
        PipelinePhase::Analysis,
        PipelinePhase::Classification,
        PipelinePhase::Validation,
        PipelinePhase::Fortification,
        PipelinePhase::Cleaning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelinePhase::PreAnalysis => "pre_analysis",
            PipelinePhase::Analysis => "analysis",
            PipelinePhase::Classification => "classification",
            PipelinePhase::Validation => "validation",
            PipelinePhase::Fortification => "fortification",
            PipelinePhase::Cleaning => "cleaning",
        }
    }
}

/// Static description of a frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameMetadata {
    pub id: String,
    pub name: String,
    pub description: String,
    pub phase: PipelinePhase,
    pub priority: Priority,
    pub is_blocker: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_languages: Option<Vec<String>>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub parallel_safe: bool,
}

/// Shared, read-only execution context threaded through frames
#[derive(Clone)]
pub struct FrameContext {
    pub root: PathBuf,
    pub config: Arc<Config>,
    pub rules: Arc<RulesFile>,
    pub cache: Arc<ContentCache>,
    pub parallelism: usize,
    cancel: watch::Receiver<bool>,
}

impl FrameContext {
    pub fn new(
        root: PathBuf,
        config: Arc<Config>,
        rules: Arc<RulesFile>,
        cache: Arc<ContentCache>,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        let parallelism = config.parallelism();
        Self {
            root,
            config,
            rules,
            cache,
            parallelism,
            cancel,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

/// Core trait for all frames.
///
/// `execute` must not mutate its inputs and must check the context's cancel
/// flag between file scans.
#[async_trait]
pub trait Frame: Send + Sync {
    fn metadata(&self) -> &FrameMetadata;

    /// Optional warm-up before execution
    async fn prepare(&self, _ctx: &FrameContext) -> Result<()> {
        Ok(())
    }

    /// Analyze the batch and return raw findings. Status, timing and policy
    /// handling belong to the orchestrator.
    async fn execute(&self, batch: &[DiscoveredFile], ctx: &FrameContext) -> Result<Vec<Finding>>;
}

/// Registry resolving the ordered list of frames to execute
pub struct FrameRegistry {
    frames: Vec<Arc<dyn Frame>>,
}

impl FrameRegistry {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Registry pre-populated with all built-in frames plus any installed
    /// frame bundles found under the project root.
    pub fn with_builtins(root: &std::path::Path, rules: &RulesFile) -> Self {
        let mut registry = Self::new();
        let builtins: Vec<Arc<dyn Frame>> = vec![
            Arc::new(security::SecurityFrame::new()),
            Arc::new(architecture::ArchitectureFrame::new()),
            Arc::new(orphan::OrphanFrame::new()),
            Arc::new(chaos::ChaosFrame::new()),
            Arc::new(stress::StressFrame::new()),
            Arc::new(contract::ContractFrame::new()),
        ];
        for frame in builtins {
            if let Err(e) = registry.register(frame) {
                warn!("skipping frame: {}", e);
            }
        }
        if let Some(frame) = custom::CustomRuleFrame::from_rules(rules) {
            if let Err(e) = registry.register(Arc::new(frame)) {
                warn!("skipping frame: {}", e);
            }
        }
        for frame in installed::load_installed_frames(root) {
            if let Err(e) = registry.register(Arc::new(frame)) {
                warn!("skipping frame: {}", e);
            }
        }
        registry
    }

    /// Register a frame, refusing duplicate ids.
    pub fn register(&mut self, frame: Arc<dyn Frame>) -> Result<()> {
        let id = &frame.metadata().id;
        if self.frames.iter().any(|f| &f.metadata().id == id) {
            return Err(WardenError::frame_load(format!(
                "duplicate frame id '{}'",
                id
            )));
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Frame>> {
        self.frames.iter().find(|f| f.metadata().id == id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.frames.iter().map(|f| f.metadata().id.clone()).collect()
    }

    /// Ordered execution list: stable sort by `(priority rank, blockers
    /// first, name)`, optionally filtered to the enabled set.
    pub fn ordered(&self, enabled: &[String]) -> Vec<Arc<dyn Frame>> {
        let mut frames: Vec<Arc<dyn Frame>> = self
            .frames
            .iter()
            .filter(|f| enabled.is_empty() || enabled.iter().any(|id| *id == f.metadata().id))
            .cloned()
            .collect();
        frames.sort_by(|a, b| {
            let (ma, mb) = (a.metadata(), b.metadata());
            ma.priority
                .rank()
                .cmp(&mb.priority.rank())
                .then_with(|| mb.is_blocker.cmp(&ma.is_blocker))
                .then_with(|| ma.name.cmp(&mb.name))
        });
        frames
    }
}

impl Default for FrameRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan the analyzable files of a batch with a bounded worker pool.
///
/// The per-file function receives the file and its content and returns
/// findings. The cancel flag is honored between scans; consecutive read
/// failures beyond `max_consecutive_failures` trip the circuit breaker and
/// short-circuit the frame.
fn scan_one_file<'a>(
    file: &'a DiscoveredFile,
    ctx: &'a FrameContext,
    per_file: &'a (dyn Fn(&DiscoveredFile, &str) -> Vec<Finding> + Send + Sync),
) -> std::pin::Pin<
    Box<dyn std::future::Future<Output = std::result::Result<Vec<Finding>, WardenError>> + Send + 'a>,
> {
    Box::pin(async move {
        if ctx.is_cancelled() {
            return Err(WardenError::Cancelled);
        }
        match ctx.cache.read(&file.path).await {
            Ok(content) => Ok(per_file(file, &content)),
            Err(e) => Err(WardenError::Io(e)),
        }
    })
}

pub async fn scan_files<F>(
    batch: &[DiscoveredFile],
    ctx: &FrameContext,
    per_file: F,
) -> Result<Vec<Finding>>
where
    F: Fn(&DiscoveredFile, &str) -> Vec<Finding> + Send + Sync,
{
    let max_failures = ctx.config.frames.max_consecutive_failures;
    let per_file: &(dyn Fn(&DiscoveredFile, &str) -> Vec<Finding> + Send + Sync) = &per_file;

    let analyzable: Vec<&DiscoveredFile> = batch.iter().filter(|f| f.is_analyzable).collect();

    let mut futs = Vec::with_capacity(analyzable.len());
    for file in &analyzable {
        futs.push(scan_one_file(file, ctx, per_file));
    }

    let mut results = stream::iter(futs).buffered(ctx.parallelism.max(1));

    let mut findings = Vec::new();
    let mut consecutive_failures = 0usize;
    while let Some(result) = results.next().await {
        match result {
            Ok(file_findings) => {
                consecutive_failures = 0;
                findings.extend(file_findings);
            }
            Err(WardenError::Cancelled) => return Err(WardenError::Cancelled),
            Err(e) => {
                warn!("file scan failed: {}", e);
                consecutive_failures += 1;
                if consecutive_failures > max_failures {
                    return Err(WardenError::frame_execution(format!(
                        "circuit breaker tripped after {} consecutive file failures",
                        consecutive_failures
                    )));
                }
            }
        }
    }
    Ok(findings)
}
