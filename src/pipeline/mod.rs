//! Producer/consumer plumbing between acquisition and display.
//!
//! ```text
//! [AcquisitionLoop] ──► EventBridge (logs, samples) ──► PipelineController::pump
//!                                                        ├──► SessionStore
//!                                                        ├──► CsvSink
//!                                                        └──► project() ──► ChartSink
//! ```
//!
//! The bridge channels are the only data shared between the two threads.

pub mod bridge;
pub mod controller;

pub use bridge::{stamp, BridgeSender, EventBridge};
pub use controller::{
    checked_interval, PipelineController, PumpReport, SessionStats, SessionSummary,
};
