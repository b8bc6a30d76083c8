//! Console progress reporting driven by pipeline events.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::pipeline::{EventSender, PipelineEvent};

/// Spawn a spinner-based consumer for pipeline events. Returns the sender
/// to hand to the orchestrator. With `enabled = false` events are drained
/// silently.
pub fn progress_sink(enabled: bool) -> EventSender {
    let (tx, mut rx) = mpsc::unbounded_channel::<PipelineEvent>();
    tokio::spawn(async move {
        let bar = if enabled {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .expect("valid template"),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            Some(bar)
        } else {
            None
        };

        while let Some(event) = rx.recv().await {
            let Some(bar) = &bar else { continue };
            match event {
                PipelineEvent::PipelineStarted { total_frames, .. } => {
                    bar.set_message(format!("running {} frames", total_frames));
                }
                PipelineEvent::FrameStarted { frame_name, .. } => {
                    bar.set_message(format!("frame: {}", frame_name));
                }
                PipelineEvent::FrameCompleted {
                    frame_id,
                    status,
                    issues_found,
                    ..
                } => {
                    bar.set_message(format!(
                        "{} {} ({} issues)",
                        frame_id, status, issues_found
                    ));
                }
                PipelineEvent::PipelineCompleted {
                    status,
                    total_findings,
                    duration_ms,
                    ..
                } => {
                    bar.finish_with_message(format!(
                        "{} — {} findings in {}ms",
                        status, total_findings, duration_ms
                    ));
                }
            }
        }
    });
    tx
}
