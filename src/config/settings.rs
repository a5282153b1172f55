//! Section types of the project configuration
//!
//! Each section deserializes with defaults for any missing field, so a
//! partial TOML file is always valid input.

use crate::backend::registry::ParameterRegistry;
use crate::session::projection::{TimeWindow, MAX_WINDOW_SECS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Number of chart slots on the display
pub const GRAPH_SLOTS: usize = 3;

/// Text shown for an empty chart slot
pub const NONE_LABEL: &str = "(None)";

/// Default acquisition interval in seconds
pub const DEFAULT_INTERVAL_SECS: f64 = 0.5;

/// Default destination file prefix
pub const DEFAULT_FILE_PREFIX: &str = "obd_log";

// ==================== Acquisition ====================

/// What to poll and how often
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Seconds between acquisition ticks
    pub interval_secs: f64,
    /// Labels to poll, in order
    pub parameters: Vec<String>,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            parameters: ParameterRegistry::default_selection(),
        }
    }
}

// ==================== Persistence ====================

/// Where and whether sessions are written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub enabled: bool,
    pub directory: PathBuf,
    pub file_prefix: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: super::default_log_dir(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
        }
    }
}

// ==================== Display ====================

/// Chart slots and the visible time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Trailing window in seconds; `0` shows the whole session
    pub window_secs: f64,
    /// Label plotted in each slot, `None` for an empty slot
    #[serde(with = "graph_slots")]
    pub graphs: [Option<String>; GRAPH_SLOTS],
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            window_secs: 0.0,
            graphs: Default::default(),
        }
    }
}

impl DisplaySettings {
    /// Set the window, clamped to `[0, 3600]`; NaN means "all"
    pub fn set_window(&mut self, secs: f64) {
        self.window_secs = clamp_window(secs);
    }

    /// The window as a [`TimeWindow`]
    pub fn window(&self) -> TimeWindow {
        TimeWindow::from_secs(self.window_secs)
    }

    /// Replace the slots from a list of labels
    ///
    /// Missing entries, empty strings and `(None)` leave a slot empty;
    /// entries past the last slot are ignored.
    pub fn set_graphs<S: AsRef<str>>(&mut self, labels: &[S]) {
        let mut slots: [Option<String>; GRAPH_SLOTS] = Default::default();
        for (slot, label) in slots.iter_mut().zip(labels) {
            *slot = slot_value(label.as_ref());
        }
        self.graphs = slots;
    }

    /// Distinct labels currently displayed, in slot order
    pub fn displayed_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::with_capacity(GRAPH_SLOTS);
        for label in self.graphs.iter().flatten() {
            if !labels.contains(&label.as_str()) {
                labels.push(label);
            }
        }
        labels
    }

    /// Whether every slot is empty
    pub fn is_empty(&self) -> bool {
        self.graphs.iter().all(Option::is_none)
    }

    /// Display text for slot `index`
    pub fn slot_text(&self, index: usize) -> &str {
        self.graphs
            .get(index)
            .and_then(|s| s.as_deref())
            .unwrap_or(NONE_LABEL)
    }
}

fn clamp_window(secs: f64) -> f64 {
    if secs.is_nan() {
        0.0
    } else {
        secs.clamp(0.0, MAX_WINDOW_SECS)
    }
}

fn slot_value(label: &str) -> Option<String> {
    let label = label.trim();
    if label.is_empty() || label == NONE_LABEL {
        None
    } else {
        Some(label.to_string())
    }
}

/// Slots are stored as a string list with `""` for an empty slot, since TOML
/// arrays cannot hold a missing value.
mod graph_slots {
    use super::{slot_value, GRAPH_SLOTS};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(
        slots: &[Option<String>; GRAPH_SLOTS],
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let names: Vec<&str> = slots.iter().map(|s| s.as_deref().unwrap_or("")).collect();
        names.serialize(serializer)
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> std::result::Result<[Option<String>; GRAPH_SLOTS], D::Error>
    where
        D: Deserializer<'de>,
    {
        let names: Vec<String> = Vec::deserialize(deserializer)?;
        let mut slots: [Option<String>; GRAPH_SLOTS] = Default::default();
        for (slot, name) in slots.iter_mut().zip(names) {
            *slot = slot_value(&name);
        }
        Ok(slots)
    }
}
