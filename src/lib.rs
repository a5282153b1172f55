//! # obdvis-rs: live OBD-II telemetry pipeline
//!
//! Polls a set of diagnostic parameters from a vehicle link on a dedicated
//! thread, hands the readings to a consumer through lock-free channels, and
//! from there records them per session, persists them as CSV and projects a
//! trailing time window for charting.
//!
//! ## Architecture
//!
//! - **Backend**: the [`DiagnosticLink`] trait, the parameter registry and the
//!   [`AcquisitionLoop`](backend::AcquisitionLoop)
//! - **Pipeline**: the [`EventBridge`](pipeline::EventBridge) and the
//!   [`PipelineController`] that owns a session
//! - **Session**: [`SessionStore`](session::SessionStore),
//!   [`CsvSink`](session::CsvSink) and the windowed [`project`](session::project)
//! - **Display**: log and chart collaborator traits
//!
//! ## Example
//!
//! ```ignore
//! use obdvis_rs::{AppConfig, MockLink, PipelineController};
//! use obdvis_rs::display::{ChartFrame, EventLog};
//!
//! let config = AppConfig::default();
//! let mut controller = PipelineController::from_config(&config);
//! controller.attach_link(Box::new(MockLink::simulated_engine()))?;
//! controller.start(&config.acquisition.parameters, config.interval(), true)?;
//!
//! let (mut log, mut chart) = (EventLog::new(), ChartFrame::new());
//! loop {
//!     controller.pump(&mut log, &mut chart);
//!     std::thread::sleep(std::time::Duration::from_millis(100));
//! }
//! ```

pub mod backend;
pub mod config;
pub mod display;
pub mod error;
pub mod pipeline;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use backend::{DiagnosticLink, MockLink, ParameterRegistry};
pub use config::{AppConfig, DisplaySettings};
pub use error::{ObdVisError, Result};
pub use pipeline::{PipelineController, SessionSummary};
pub use types::{ConnectionStatus, Parameter, Sample, SeriesPoint};
