//! Per-session data: the in-memory series, the CSV sink and the windowed view
//!
//! All three are touched only from the consumer side of the pipeline.

pub mod projection;
pub mod sink;
pub mod store;

pub use projection::{project, project_window, TimeWindow, MAX_WINDOW_SECS};
pub use sink::CsvSink;
pub use store::SessionStore;
