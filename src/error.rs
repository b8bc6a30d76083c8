//! # Error Handling Module
//!
//! Defines the error types and result alias used throughout Warden.
//! Library-level errors use `thiserror`; the command layer wraps them
//! with `anyhow` context.
//!
//! ## Error Categories
//!
//! - `Configuration`: malformed config, invalid enum value, unresolvable path (fatal, exit 2)
//! - `FrameLoad`: frame entry point unavailable or duplicate id (frame skipped)
//! - `FrameExecution`: a frame threw; caught by the orchestrator
//! - `Timeout`: per-frame wall clock expired
//! - `Git`: git subprocess failure (downgrades incremental to full scan)
//! - `Cancelled`: cooperative cancellation; not a failure

use thiserror::Error;

/// Result type alias for Warden operations
pub type Result<T> = std::result::Result<T, WardenError>;

/// Comprehensive error type for the Warden analyzer
#[derive(Error, Debug)]
pub enum WardenError {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (fatal before the pipeline starts)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Frame registration/loading errors
    #[error("Frame load error: {0}")]
    FrameLoad(String),

    /// Errors thrown by a frame during execution
    #[error("Frame execution error: {0}")]
    FrameExecution(String),

    /// Per-frame wall-clock timeout
    #[error("Frame timed out after {0}s")]
    Timeout(u64),

    /// Git subprocess failure
    #[error("Git error: {0}")]
    Git(String),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Cooperative cancellation was requested
    #[error("Cancellation requested")]
    Cancelled,

    /// Logging setup error
    #[error("Failed to setup logging")]
    LoggingSetup,
}

impl WardenError {
    /// Create a new configuration error with a custom message
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a new frame load error with a custom message
    pub fn frame_load<S: Into<String>>(message: S) -> Self {
        Self::FrameLoad(message.into())
    }

    /// Create a new frame execution error with a custom message
    pub fn frame_execution<S: Into<String>>(message: S) -> Self {
        Self::FrameExecution(message.into())
    }

    /// Create a new git error with a custom message
    pub fn git<S: Into<String>>(message: S) -> Self {
        Self::Git(message.into())
    }

    /// True when the error should abort before any frame runs (exit 2)
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
