//! # Warden
//!
//! A multi-frame static code analyzer. Warden classifies a source tree,
//! runs an ordered set of validation frames (security, architecture,
//! orphan-code, chaos, stress, contract and custom rules), deduplicates and
//! suppresses findings, and emits JSON, SARIF 2.1.0 and CI-platform
//! annotations.
//!
//! ## Guarantees
//!
//! - **Deterministic**: identical tree + config yields identical findings,
//!   fingerprints and SARIF output
//! - **Contained failures**: no frame error escapes the orchestrator;
//!   errored frames surface in their own results
//! - **CI-first**: platform detection, annotations and exit codes designed
//!   for pipelines

pub mod cache;
pub mod ci;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod frames;
pub mod incremental;
pub mod installer;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod progress;
pub mod report;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use crate::{
    config::Config, error::WardenError, pipeline::Orchestrator, types::Finding,
    types::PipelineResult,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
