//! Streaming progress events emitted by the orchestrator.
//!
//! Events for a single frame are emitted in order (`started` before
//! `completed`). The stream is finite and consumed by whatever sink the
//! caller configures; the default sink logs through `tracing`.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::frames::PipelinePhase;
use crate::types::{FrameStatus, PipelineStatus};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    PipelineStarted {
        pipeline_id: Uuid,
        pipeline_name: String,
        total_frames: usize,
    },
    FrameStarted {
        frame_id: String,
        frame_name: String,
        phase: PipelinePhase,
    },
    FrameCompleted {
        frame_id: String,
        status: FrameStatus,
        duration_ms: u64,
        issues_found: usize,
    },
    PipelineCompleted {
        pipeline_id: Uuid,
        status: PipelineStatus,
        total_findings: usize,
        duration_ms: u64,
    },
}

/// Sender half handed to the orchestrator; dropping the receiver silently
/// discards events.
pub type EventSender = mpsc::UnboundedSender<PipelineEvent>;

/// Spawn a consumer that logs every event. Returns the sender to hand to
/// the orchestrator.
pub fn logging_sink() -> EventSender {
    let (tx, mut rx) = mpsc::unbounded_channel::<PipelineEvent>();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match &event {
                PipelineEvent::PipelineStarted {
                    pipeline_name,
                    total_frames,
                    ..
                } => info!("pipeline '{}' started: {} frames", pipeline_name, total_frames),
                PipelineEvent::FrameStarted {
                    frame_id, phase, ..
                } => info!("frame '{}' started ({})", frame_id, phase.as_str()),
                PipelineEvent::FrameCompleted {
                    frame_id,
                    status,
                    duration_ms,
                    issues_found,
                } => info!(
                    "frame '{}' {} in {}ms, {} issues",
                    frame_id, status, duration_ms, issues_found
                ),
                PipelineEvent::PipelineCompleted {
                    status,
                    total_findings,
                    duration_ms,
                    ..
                } => info!(
                    "pipeline {} in {}ms, {} findings",
                    status, duration_ms, total_findings
                ),
            }
        }
    });
    tx
}
