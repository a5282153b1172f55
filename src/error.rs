//! Error handling for obdvis-rs
//!
//! This module defines the crate error type and a Result alias used
//! throughout the pipeline. Per-tick faults (a failed query, a rejected
//! CSV row) are recovered where they happen and reported through the
//! event log; only configuration and lifecycle errors reach callers.

use thiserror::Error;

/// Main error type for obdvis-rs operations
#[derive(Error, Debug)]
pub enum ObdVisError {
    /// A session was requested with an unusable configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An acquisition session is already active
    #[error("Acquisition is already running")]
    AlreadyRunning,

    /// No connected diagnostic link is attached
    #[error("Not connected to ECU")]
    NotConnected,

    /// Errors reported by the diagnostic link
    #[error("Link error: {0}")]
    Link(String),

    /// Errors related to the durable sink
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ObdVisError>,
    },
}

impl ObdVisError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ObdVisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// True for errors that reject a request before any state was touched
    pub fn is_config_error(&self) -> bool {
        match self {
            ObdVisError::InvalidConfig(_) | ObdVisError::AlreadyRunning => true,
            ObdVisError::WithContext { source, .. } => source.is_config_error(),
            _ => false,
        }
    }
}

/// Result type alias for obdvis-rs operations
pub type Result<T> = std::result::Result<T, ObdVisError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ObdVisError::from(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| ObdVisError::from(e).with_context(f()))
    }
}
