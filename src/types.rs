//! Core data types for obdvis-rs
//!
//! This module contains the value objects that flow through the pipeline.
//!
//! # Main Types
//!
//! - [`ParameterDescriptor`] - Opaque query handle resolved by the diagnostic link
//! - [`Parameter`] - A labelled, queryable diagnostic quantity
//! - [`Sample`] - One acquisition tick's readings
//! - [`SeriesPoint`] - A `(relative_time, value)` pair in a plotted series
//! - [`ConnectionStatus`] - Link / acquisition state as seen by the controller
//!
//! # Readings
//!
//! A reading is `Option<f64>`. `None` means the query failed, the link
//! reported no data, or the value was not numeric. It is never the same
//! thing as `Some(0.0)`: a gap in the data is shown as the absence of a
//! point, not a zero.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque handle the diagnostic link uses to perform a query
///
/// For OBD-II links this is the command mnemonic (e.g. `RPM`), but the
/// pipeline never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterDescriptor(String);

impl ParameterDescriptor {
    /// Create a descriptor from a command name
    pub fn new(command: impl Into<String>) -> Self {
        Self(command.into())
    }

    /// The underlying command name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParameterDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A labelled diagnostic quantity, fixed for the lifetime of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Human-readable label, unique within a session
    pub label: String,
    /// Query handle resolved by the link
    pub descriptor: ParameterDescriptor,
}

impl Parameter {
    /// Create a new parameter
    pub fn new(label: impl Into<String>, descriptor: ParameterDescriptor) -> Self {
        Self {
            label: label.into(),
            descriptor,
        }
    }
}

/// One acquisition tick's readings
///
/// Produced exactly once per tick by the acquisition loop and never
/// mutated after it is pushed onto the event bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Wall-clock instant the tick started
    pub timestamp: DateTime<Local>,
    /// Reading per label; `None` marks a failed or empty query
    pub readings: HashMap<String, Option<f64>>,
}

impl Sample {
    /// Create an empty sample stamped with `timestamp`
    pub fn new(timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            readings: HashMap::new(),
        }
    }

    /// Builder-style reading insertion
    pub fn with_reading(mut self, label: impl Into<String>, value: Option<f64>) -> Self {
        self.readings.insert(label.into(), value);
        self
    }

    /// Set the reading for a label
    pub fn set_reading(&mut self, label: impl Into<String>, value: Option<f64>) {
        self.readings.insert(label.into(), value);
    }

    /// Numeric reading for `label`; absent and null readings both yield `None`
    pub fn reading(&self, label: &str) -> Option<f64> {
        self.readings.get(label).copied().flatten()
    }

    /// Number of labels carrying a null reading
    pub fn null_count(&self) -> usize {
        self.readings.values().filter(|v| v.is_none()).count()
    }
}

/// A single point in a plotted series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Seconds since the session anchor
    pub time: f64,
    /// Numeric reading
    pub value: f64,
}

impl SeriesPoint {
    /// Create a new point
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }

    /// `[x, y]` form used by plotting backends
    pub fn as_plot_point(&self) -> [f64; 2] {
        [self.time, self.value]
    }
}

/// Connection state as tracked by the pipeline controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConnectionStatus {
    /// No link attached, or the attached link reports disconnected
    #[default]
    Disconnected,
    /// Link attached and idle
    Connected,
    /// Acquisition thread is polling the link
    Polling,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Polling => write!(f, "Polling"),
        }
    }
}
