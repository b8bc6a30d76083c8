//! # Pipeline Orchestrator
//!
//! Executes the ordered frames in phases, wraps every frame call with a
//! timeout and an uncaught-error barrier, applies `on_fail` policy, streams
//! progress events and finalizes findings through the finding pipeline.
//!
//! The orchestrator is single-tenant: one pipeline per invocation. No
//! exception escapes it; frame-level errors surface as fields on the
//! frame's own result.

pub mod events;
pub mod findings;
pub mod suppression;

pub use events::{logging_sink, EventSender, PipelineEvent};
pub use findings::{finalize, FinalizeInput};

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::ContentCache;
use crate::config::{Config, RulesFile};
use crate::discovery::DiscoveredFile;
use crate::error::WardenError;
use crate::frames::{custom, Frame, FrameContext, FrameRegistry, PipelinePhase};
use crate::types::{FrameResult, FrameStatus, OnFail, PipelineResult};

/// Handle for requesting cooperative cancellation from another task
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

pub struct Orchestrator {
    registry: FrameRegistry,
    config: Arc<Config>,
    rules: Arc<RulesFile>,
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
    events: Option<EventSender>,
}

impl Orchestrator {
    pub fn new(registry: FrameRegistry, config: Arc<Config>, rules: Arc<RulesFile>) -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            registry,
            config,
            rules,
            cancel_tx: Arc::new(tx),
            cancel_rx: rx,
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.cancel_tx),
        }
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }

    /// Run the pipeline over the batch and return the finalized result.
    pub async fn run(
        &self,
        root: &Path,
        batch: &[DiscoveredFile],
        extra_metadata: HashMap<String, serde_json::Value>,
    ) -> PipelineResult {
        let pipeline_id = Uuid::new_v4();
        let pipeline_name = self
            .config
            .pipeline_name
            .clone()
            .unwrap_or_else(|| "warden".to_string());
        let started_at = Utc::now();
        let start = Instant::now();

        let ctx = FrameContext::new(
            root.to_path_buf(),
            Arc::clone(&self.config),
            Arc::clone(&self.rules),
            Arc::new(ContentCache::default()),
            self.cancel_rx.clone(),
        );

        let ordered = self.registry.ordered(&self.config.frames.enabled);
        self.emit(PipelineEvent::PipelineStarted {
            pipeline_id,
            pipeline_name: pipeline_name.clone(),
            total_frames: ordered.len(),
        });

        let mut results: Vec<FrameResult> = Vec::with_capacity(ordered.len());
        let mut stopped = false;
        let mut cancelled = false;
        // frames whose failure skips their declared dependents
        let mut skip_dependents_of: HashSet<String> = HashSet::new();

        for phase in PipelinePhase::ALL {
            let phase_frames: Vec<&Arc<dyn Frame>> = ordered
                .iter()
                .filter(|f| f.metadata().phase == phase)
                .collect();

            for group in parallel_groups(&phase_frames) {
                // schedule-time gates, evaluated per frame in C4 order;
                // slots keep result order aligned with the group order even
                // when skips and runs interleave
                let mut slots: Vec<Option<FrameResult>> = Vec::with_capacity(group.len());
                let mut runnable: Vec<(usize, &Arc<dyn Frame>)> = Vec::new();
                for (index, &frame) in group.iter().enumerate() {
                    let metadata = frame.metadata();
                    if stopped {
                        slots.push(Some(skipped_result(
                            metadata,
                            "pipeline stopped by earlier frame",
                        )));
                    } else if cancelled || ctx.is_cancelled() {
                        cancelled = true;
                        slots.push(Some(skipped_result(metadata, "pipeline cancelled")));
                    } else if metadata
                        .depends_on
                        .iter()
                        .any(|dep| skip_dependents_of.contains(dep))
                    {
                        slots.push(Some(skipped_result(metadata, "dependency failed")));
                    } else {
                        slots.push(None);
                        runnable.push((index, frame));
                    }
                }

                let executed: Vec<FrameResult> = if runnable.len() > 1 {
                    futures::future::join_all(
                        runnable
                            .iter()
                            .map(|(_, frame)| self.run_frame(frame, batch, &ctx)),
                    )
                    .await
                } else if let Some((_, frame)) = runnable.first() {
                    vec![self.run_frame(frame, batch, &ctx).await]
                } else {
                    Vec::new()
                };
                for ((index, _), result) in runnable.iter().zip(executed) {
                    slots[*index] = Some(result);
                }
                let mut group_results: Vec<FrameResult> =
                    slots.into_iter().flatten().collect();

                // policy evaluation in C4 order after the group completes
                for result in &group_results {
                    if cancelled_frame(result) {
                        cancelled = true;
                    }
                    let fired = result.status == FrameStatus::Errored
                        || result
                            .findings
                            .iter()
                            .any(|f| self.config.thresholds.is_blocker(f.severity));
                    if fired {
                        match self.rules.binding(&result.frame_id).on_fail {
                            OnFail::Continue => {}
                            OnFail::Stop => {
                                debug!("frame '{}' fired with on_fail=stop", result.frame_id);
                                stopped = true;
                            }
                            OnFail::SkipDependents => {
                                skip_dependents_of.insert(result.frame_id.clone());
                            }
                        }
                    }
                }
                results.append(&mut group_results);
            }
        }

        let input = FinalizeInput {
            pipeline_name,
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            frame_results: results,
            cancelled,
            stopped,
            metadata: extra_metadata,
        };
        let mut result = finalize(
            input,
            root,
            &self.config.suppressions,
            &self.config.thresholds,
        );
        result.pipeline_id = pipeline_id;

        self.emit(PipelineEvent::PipelineCompleted {
            pipeline_id,
            status: result.status,
            total_findings: result.total_findings,
            duration_ms: result.duration_ms,
        });
        result
    }

    /// Run one frame: pre-rules, prepare + execute under the timeout and
    /// error barrier, then post-rules. Never panics outward; failures land
    /// in the frame's result metadata.
    async fn run_frame(
        &self,
        frame: &Arc<dyn Frame>,
        batch: &[DiscoveredFile],
        ctx: &FrameContext,
    ) -> FrameResult {
        let metadata = frame.metadata();
        self.emit(PipelineEvent::FrameStarted {
            frame_id: metadata.id.clone(),
            frame_name: metadata.name.clone(),
            phase: metadata.phase,
        });
        let start = Instant::now();
        let mut result = FrameResult::new(&metadata.id, &metadata.name, metadata.is_blocker);

        // pre-rule findings are attributed to this frame
        let pre_rules = compile_resolved(self.rules.pre_rules_for(&metadata.id));
        match custom::apply_rules(&metadata.id, &pre_rules, batch, ctx).await {
            Ok(findings) => result.findings.extend(findings),
            Err(e) => {
                mark_errored(&mut result, &e);
            }
        }

        if result.status != FrameStatus::Errored {
            let timeout = std::time::Duration::from_secs(self.config.frames.frame_timeout_secs);
            let execution = async {
                frame.prepare(ctx).await?;
                frame.execute(batch, ctx).await
            };
            match tokio::time::timeout(timeout, execution).await {
                Err(_) => {
                    warn!("frame '{}' timed out", metadata.id);
                    let e = WardenError::Timeout(self.config.frames.frame_timeout_secs);
                    mark_errored(&mut result, &e);
                    result
                        .metadata
                        .insert("reason".to_string(), serde_json::json!("timeout"));
                }
                Ok(Err(e)) => mark_errored(&mut result, &e),
                Ok(Ok(findings)) => result.findings.extend(findings),
            }
        }

        if result.status != FrameStatus::Errored {
            let post_rules = compile_resolved(self.rules.post_rules_for(&metadata.id));
            match custom::apply_rules(&metadata.id, &post_rules, batch, ctx).await {
                Ok(findings) => result.findings.extend(findings),
                Err(e) => mark_errored(&mut result, &e),
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        result.issues_found = result.findings.len();
        if result.status != FrameStatus::Errored {
            // provisional status for events and on_fail; suppression may
            // still soften it during finalization
            let has_blockers = result
                .findings
                .iter()
                .any(|f| self.config.thresholds.is_blocker(f.severity));
            result.status = if has_blockers {
                FrameStatus::Failed
            } else if result.findings.is_empty() {
                FrameStatus::Passed
            } else {
                FrameStatus::Warning
            };
        }

        self.emit(PipelineEvent::FrameCompleted {
            frame_id: result.frame_id.clone(),
            status: result.status,
            duration_ms: result.duration_ms,
            issues_found: result.issues_found,
        });
        result
    }
}

fn compile_resolved(resolved: Vec<&crate::config::Rule>) -> Vec<custom::CompiledRule> {
    resolved
        .into_iter()
        .filter_map(custom::CompiledRule::compile)
        .collect()
}

fn mark_errored(result: &mut FrameResult, error: &WardenError) {
    result.status = FrameStatus::Errored;
    result
        .metadata
        .insert("error".to_string(), serde_json::json!(error.to_string()));
    if matches!(error, WardenError::Cancelled) {
        result
            .metadata
            .insert("reason".to_string(), serde_json::json!("cancelled"));
    }
}

fn cancelled_frame(result: &FrameResult) -> bool {
    result
        .metadata
        .get("reason")
        .and_then(|v| v.as_str())
        .map(|r| r == "cancelled")
        .unwrap_or(false)
}

fn skipped_result(metadata: &crate::frames::FrameMetadata, reason: &str) -> FrameResult {
    let mut result = FrameResult::new(&metadata.id, &metadata.name, metadata.is_blocker);
    result.status = FrameStatus::Skipped;
    result
        .metadata
        .insert("reason".to_string(), serde_json::json!(reason));
    result
}

/// Split a phase's frames into execution groups: a maximal run of frames
/// sharing one priority where every member is `parallel_safe` runs
/// concurrently; everything else runs alone.
fn parallel_groups<'a>(frames: &[&'a Arc<dyn Frame>]) -> Vec<Vec<&'a Arc<dyn Frame>>> {
    let mut groups: Vec<Vec<&'a Arc<dyn Frame>>> = Vec::new();
    for &frame in frames {
        let metadata = frame.metadata();
        let joinable = metadata.parallel_safe
            && groups.last().is_some_and(|group| {
                group.iter().all(|g| {
                    g.metadata().parallel_safe && g.metadata().priority == metadata.priority
                })
            });
        if joinable {
            groups.last_mut().expect("group exists").push(frame);
        } else {
            groups.push(vec![frame]);
        }
    }
    groups
}
