//! Display collaborators driven by the pipeline controller
//!
//! The controller never renders anything itself. Each `pump` forwards log
//! lines to a [`LogSink`] and fresh projections to a [`ChartSink`]. The
//! implementations here cover the headless binary and tests; a GUI front
//! end would implement the same two traits.

use crate::types::SeriesPoint;
use std::collections::{HashMap, VecDeque};
use std::io::Write;

/// Default number of lines kept by [`EventLog`]
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 1000;

/// Receives formatted event-log lines
///
/// Called once per line during `pump`, so implementations must be cheap.
pub trait LogSink {
    fn log_line(&mut self, line: &str);
}

/// Receives the projected series of each displayed label
pub trait ChartSink {
    /// Replace the plotted points for `label`
    ///
    /// An empty slice means "nothing to draw", not an error.
    fn update(&mut self, label: &str, points: &[SeriesPoint]);

    /// Drop any labels that are no longer displayed
    fn retain(&mut self, _labels: &[&str]) {}
}

/// Bounded in-memory ring of log lines
#[derive(Debug, Clone)]
pub struct EventLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_LOG_CAPACITY)
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ring that keeps at most `capacity` lines (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_LOG_CAPACITY)),
            capacity,
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Whether any kept line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl LogSink for EventLog {
    fn log_line(&mut self, line: &str) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
    }
}

/// Forwards event-log lines to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl LogSink for TracingLog {
    fn log_line(&mut self, line: &str) {
        tracing::info!(target: "obdvis::event_log", "{}", line);
    }
}

/// Writes each line, newline-terminated, to any writer
///
/// Used with `tracing_appender::non_blocking` for the rolling event-log
/// file. Write failures are reported through `tracing` and otherwise ignored.
pub struct WriterLog<W: Write> {
    writer: W,
    failed: bool,
}

impl<W: Write> WriterLog<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            failed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> LogSink for WriterLog<W> {
    fn log_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.writer, "{}", line) {
            if !self.failed {
                tracing::warn!("Event log write failed: {}", e);
                self.failed = true;
            }
        }
    }
}

/// Fans one line out to two sinks
pub struct TeeLog<A, B> {
    first: A,
    second: B,
}

impl<A: LogSink, B: LogSink> TeeLog<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }
}

impl<A: LogSink, B: LogSink> LogSink for TeeLog<A, B> {
    fn log_line(&mut self, line: &str) {
        self.first.log_line(line);
        self.second.log_line(line);
    }
}

/// Latest projection per displayed label
#[derive(Debug, Default, Clone)]
pub struct ChartFrame {
    series: HashMap<String, Vec<SeriesPoint>>,
    updates: u64,
}

impl ChartFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points last drawn for `label`; empty when it has none
    pub fn points(&self, label: &str) -> &[SeriesPoint] {
        self.series.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Labels currently on the chart
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Total update calls received
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// `[time, value]` pairs ready for a plotting backend
    pub fn plot_points(&self, label: &str) -> Vec<[f64; 2]> {
        self.points(label).iter().map(SeriesPoint::as_plot_point).collect()
    }
}

impl ChartSink for ChartFrame {
    fn update(&mut self, label: &str, points: &[SeriesPoint]) {
        self.updates += 1;
        self.series.insert(label.to_string(), points.to_vec());
    }

    fn retain(&mut self, labels: &[&str]) {
        self.series.retain(|k, _| labels.contains(&k.as_str()));
    }
}
