//! PipelineController: session lifecycle and the consumer-side pump
//!
//! The controller is the single owner of everything mutable in a session:
//! the session store, the CSV sink, the display settings and the statistics.
//! The acquisition thread only ever sees the link, the parameter list, the
//! running flag and a [`BridgeSender`]; all its output comes back through
//! the [`EventBridge`] and is applied here by [`PipelineController::pump`].
//!
//! # Link ownership
//!
//! The link is held by the controller while idle and moved into the
//! acquisition thread when a session starts. The thread hands it back
//! through its join handle, so link I/O is single-owner by construction and
//! idle-only operations (trouble codes, detach) never race the polling loop.

use crate::backend::acquisition::{AcquisitionLoop, ExitReason};
use crate::backend::link::{
    DiagnosticLink, LinkValue, Response, TroubleCode, CLEAR_DTC_COMMAND, GET_DTC_COMMAND,
};
use crate::backend::registry::ParameterRegistry;
use crate::config::{AppConfig, DisplaySettings};
use crate::display::{ChartSink, LogSink};
use crate::error::{ObdVisError, Result};
use crate::pipeline::bridge::{stamp, BridgeSender, EventBridge};
use crate::session::projection::project_window;
use crate::session::sink::CsvSink;
use crate::session::store::SessionStore;
use crate::types::ConnectionStatus;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

type Worker = JoinHandle<(Box<dyn DiagnosticLink>, ExitReason)>;

/// Convert a user-supplied interval in seconds, rejecting non-positive values
pub fn checked_interval(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ObdVisError::InvalidConfig(format!(
            "Interval must be > 0, got {}",
            secs
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| ObdVisError::InvalidConfig(format!("Invalid interval {}: {}", secs, e)))
}

/// Counters for the current session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Samples applied by `pump`
    pub samples: u64,
    /// Null readings across those samples
    pub null_readings: u64,
    /// Rows persisted to the sink
    pub rows_written: u64,
    /// Lines forwarded to the log collaborator
    pub log_lines: u64,
}

/// What one `pump` call processed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    pub log_lines: usize,
    pub samples: usize,
}

impl PumpReport {
    pub fn is_empty(&self) -> bool {
        self.log_lines == 0 && self.samples == 0
    }
}

/// End-of-session report
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub labels: Vec<String>,
    pub session_start: Option<DateTime<Local>>,
    pub stats: SessionStats,
    /// Plotted points per label
    pub points: BTreeMap<String, usize>,
    /// Last CSV destination opened this session
    pub log_file: Option<PathBuf>,
}

/// Orchestrates acquisition, persistence and display for one link
pub struct PipelineController {
    registry: ParameterRegistry,
    store: SessionStore,
    sink: CsvSink,
    bridge: EventBridge,
    events: BridgeSender,
    running: Arc<AtomicBool>,
    worker: Option<Worker>,
    link: Option<Box<dyn DiagnosticLink>>,
    display: DisplaySettings,
    persist: bool,
    labels: Vec<String>,
    stats: SessionStats,
    last_log_file: Option<PathBuf>,
    last_exit: Option<ExitReason>,
}

impl PipelineController {
    /// Create an idle controller with no link attached
    pub fn new(registry: ParameterRegistry, sink: CsvSink) -> Self {
        let bridge = EventBridge::new();
        let events = bridge.sender();
        Self {
            registry,
            store: SessionStore::new(),
            sink,
            bridge,
            events,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
            link: None,
            display: DisplaySettings::default(),
            persist: true,
            labels: Vec::new(),
            stats: SessionStats::default(),
            last_log_file: None,
            last_exit: None,
        }
    }

    /// Create a controller from a project configuration
    pub fn from_config(config: &AppConfig) -> Self {
        let sink = CsvSink::new(
            config.persistence.directory.clone(),
            config.persistence.file_prefix.clone(),
        );
        let mut controller = Self::new(config.registry(), sink);
        controller.display = config.display.clone();
        controller.persist = config.persistence.enabled;
        controller
    }

    // ==================== Link lifecycle ====================

    /// Attach a connected link, closing any previously attached one
    pub fn attach_link(&mut self, link: Box<dyn DiagnosticLink>) -> Result<()> {
        if self.is_running() {
            return Err(ObdVisError::AlreadyRunning);
        }
        self.reap_worker();

        if !link.is_connected() {
            self.events.log("ECU connection failed.");
            return Err(ObdVisError::NotConnected);
        }

        if let Some(mut old) = self.link.take() {
            if let Err(e) = old.close() {
                tracing::warn!("Error closing previous link: {}", e);
            }
        }
        self.link = Some(link);
        tracing::info!("Link attached");
        self.events.log("Connected to ECU.");
        Ok(())
    }

    /// Stop polling, wait for the acquisition thread and close the link
    ///
    /// Safe to call repeatedly.
    pub fn detach_link(&mut self) {
        self.stop();
        self.reap_worker();

        if let Some(mut link) = self.link.take() {
            if let Err(e) = link.close() {
                tracing::warn!("Error closing link: {}", e);
            }
            tracing::info!("Link detached");
            self.events.log("Disconnected from ECU.");
        }
    }

    /// Current connection state
    pub fn connection_status(&mut self) -> ConnectionStatus {
        if self.is_running() {
            return ConnectionStatus::Polling;
        }
        self.reap_finished();
        match &self.link {
            Some(link) if link.is_connected() => ConnectionStatus::Connected,
            Some(_) => ConnectionStatus::Disconnected,
            // A stopping thread still holds the link
            None if self.worker.is_some() => ConnectionStatus::Connected,
            None => ConnectionStatus::Disconnected,
        }
    }

    // ==================== Session lifecycle ====================

    /// Start a polling session over `labels`
    ///
    /// Fails before touching any state when the labels are empty, the
    /// interval is zero, a session is already active, no connected link is
    /// attached, or a label cannot be resolved.
    pub fn start(&mut self, labels: &[String], interval: Duration, persist: bool) -> Result<()> {
        if labels.is_empty() {
            return Err(ObdVisError::InvalidConfig(
                "Select at least one parameter".to_string(),
            ));
        }
        if interval.is_zero() {
            return Err(ObdVisError::InvalidConfig(
                "Interval must be > 0".to_string(),
            ));
        }
        if self.is_running() {
            tracing::warn!("Already polling.");
            return Err(ObdVisError::AlreadyRunning);
        }

        // The previous thread must be gone before its link is reused
        self.reap_worker();

        let link = match self.link.as_deref() {
            Some(link) if link.is_connected() => link,
            _ => return Err(ObdVisError::NotConnected),
        };
        let parameters = self.registry.resolve(labels, link)?;
        let Some(link) = self.link.take() else {
            return Err(ObdVisError::NotConnected);
        };

        self.store.reset();
        self.bridge.clear();
        self.stats = SessionStats::default();
        self.labels = labels.to_vec();
        self.last_exit = None;
        self.persist = persist;
        self.last_log_file = None;

        if persist {
            match self.sink.open(labels) {
                Ok(path) => {
                    self.events.log(&format!("Logging to CSV: {}", path.display()));
                    self.last_log_file = Some(path);
                }
                Err(e) => {
                    tracing::error!("Failed to open CSV sink: {}", e);
                    self.events.log(&format!("Failed to open CSV file: {}", e));
                }
            }
        } else {
            self.sink.close();
        }

        self.reset_graph_slots();

        self.events.log(&format!(
            "Starting live data: {} (every {:.2}s)",
            labels.join(", "),
            interval.as_secs_f64()
        ));
        tracing::info!(
            "Starting session: {} parameters every {:?}, persist={}",
            labels.len(),
            interval,
            persist
        );

        self.running.store(true, Ordering::SeqCst);
        let acquisition = AcquisitionLoop::new(
            link,
            parameters,
            interval,
            self.running.clone(),
            self.bridge.sender(),
        );
        let spawned = thread::Builder::new()
            .name("obd-acquisition".to_string())
            .spawn(move || acquisition.run());

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(e) => Err(self.abort_start(e)),
        }
    }

    /// Unwind a start whose thread could not be spawned
    ///
    /// The link went down with the unspawned closure, so it is reported lost.
    fn abort_start(&mut self, e: std::io::Error) -> ObdVisError {
        self.running.store(false, Ordering::SeqCst);
        self.sink.close();
        tracing::error!("Failed to spawn acquisition thread: {}", e);
        self.events
            .log(&format!("Failed to start live data: {}; link lost.", e));
        ObdVisError::from(e).with_context("Failed to spawn acquisition thread")
    }

    /// Request the acquisition thread to stop and close the sink
    ///
    /// Cooperative: the thread exits at its next flag check. Idempotent.
    pub fn stop(&mut self) {
        let was_running = self.is_running();
        self.running.store(false, Ordering::SeqCst);
        if was_running {
            tracing::info!("Stopping session");
            self.events.log("Stopping live data...");
        }
        self.sink.close();
    }

    /// True while the acquisition thread is polling
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
            && self.worker.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Block until the acquisition thread has exited
    ///
    /// Does not stop it: call [`PipelineController::stop`] first unless the
    /// link is expected to disconnect on its own.
    pub fn wait_for_exit(&mut self) -> Option<ExitReason> {
        self.reap_worker();
        self.last_exit
    }

    /// Why the last acquisition thread exited, once it has been joined
    pub fn last_exit(&self) -> Option<ExitReason> {
        self.last_exit
    }

    // ==================== Consumer tick ====================

    /// Drain the bridge into the collaborators, store and sink
    ///
    /// Never blocks on the acquisition thread.
    pub fn pump(&mut self, log: &mut dyn LogSink, chart: &mut dyn ChartSink) -> PumpReport {
        let mut report = PumpReport::default();

        // Join an exited worker first so everything it pushed is drained below
        self.reap_finished();

        for line in self.bridge.drain_logs() {
            log.log_line(&line);
            report.log_lines += 1;
        }

        for sample in self.bridge.drain_samples() {
            self.store.record(&sample);
            self.stats.samples += 1;
            self.stats.null_readings += sample.null_count() as u64;

            let was_open = self.sink.is_open();
            match self.sink.write(&sample) {
                Ok(()) if was_open => self.stats.rows_written += 1,
                Ok(()) => {}
                Err(e) => {
                    log.log_line(&stamp(&format!("CSV write error: {}", e)));
                    report.log_lines += 1;
                }
            }

            self.refresh_chart(chart);
            report.samples += 1;
        }

        self.stats.log_lines += report.log_lines as u64;

        if self.worker.is_none()
            && self.last_exit == Some(ExitReason::Disconnected)
            && self.sink.is_open()
        {
            tracing::info!("Link lost, closing CSV sink");
            self.sink.close();
        }
        report
    }

    /// Re-project every displayed label and hand the result to `chart`
    pub fn refresh_chart(&self, chart: &mut dyn ChartSink) {
        let labels = self.display.displayed_labels();
        chart.retain(&labels);
        for label in labels {
            let points = project_window(self.store.series_for(label), self.display.window());
            chart.update(label, &points);
        }
    }

    // ==================== Display ====================

    /// Change the visible window and redraw
    pub fn set_window(&mut self, secs: f64, chart: &mut dyn ChartSink) {
        self.display.set_window(secs);
        self.refresh_chart(chart);
    }

    /// Change the chart slots and redraw
    pub fn set_graphs<S: AsRef<str>>(&mut self, labels: &[S], chart: &mut dyn ChartSink) {
        self.display.set_graphs(labels);
        self.refresh_chart(chart);
    }

    pub fn display(&self) -> &DisplaySettings {
        &self.display
    }

    // ==================== Persistence ====================

    /// Enable or disable CSV logging
    ///
    /// Disabling closes the sink at once; enabling applies from the next start.
    pub fn set_persistence(&mut self, enabled: bool) {
        self.persist = enabled;
        if !enabled && self.sink.is_open() {
            self.sink.close();
            self.events.log("CSV logging disabled.");
        }
    }

    pub fn persistence_enabled(&self) -> bool {
        self.persist
    }

    /// Destination of the open sink, if any
    pub fn sink_path(&self) -> Option<&Path> {
        self.sink.path()
    }

    // ==================== Trouble codes ====================

    /// Read stored trouble codes; only while idle
    pub fn read_trouble_codes(&mut self) -> Result<Vec<TroubleCode>> {
        self.ensure_idle_link()?;
        let Some(link) = self.link.as_mut() else {
            return Err(ObdVisError::NotConnected);
        };
        self.events.log("Reading DTCs...");

        let Some(descriptor) = link.resolve(GET_DTC_COMMAND) else {
            self.events.log("No DTC data or unsupported command.");
            return Ok(Vec::new());
        };

        match link.query(&descriptor) {
            Ok(Response::Value(LinkValue::TroubleCodes(codes))) => {
                if codes.is_empty() {
                    self.events.log("No stored DTCs.");
                } else {
                    self.events.log("Stored DTCs:");
                    for code in &codes {
                        self.events
                            .log(&format!("  {}: {}", code.code, code.description));
                    }
                }
                Ok(codes)
            }
            Ok(_) => {
                self.events.log("No DTC data or unsupported command.");
                Ok(Vec::new())
            }
            Err(e) => {
                tracing::warn!("DTC read failed: {}", e);
                self.events.log(&format!("Error reading DTCs: {}", e));
                Err(e)
            }
        }
    }

    /// Clear stored trouble codes; only while idle
    pub fn clear_trouble_codes(&mut self) -> Result<()> {
        self.ensure_idle_link()?;
        let Some(link) = self.link.as_mut() else {
            return Err(ObdVisError::NotConnected);
        };
        self.events.log("Clearing DTCs...");

        let Some(descriptor) = link.resolve(CLEAR_DTC_COMMAND) else {
            self.events.log("No response or unsupported command.");
            return Ok(());
        };

        match link.query(&descriptor) {
            Ok(Response::Null) => {
                self.events.log("No response or unsupported command.");
                Ok(())
            }
            Ok(Response::Value(_)) => {
                tracing::info!("Trouble codes cleared");
                self.events.log("Clear DTC command sent.");
                Ok(())
            }
            Err(e) => {
                tracing::warn!("DTC clear failed: {}", e);
                self.events.log(&format!("Error clearing DTCs: {}", e));
                Err(e)
            }
        }
    }

    // ==================== Accessors ====================

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    /// Labels of the current (or last) session
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Snapshot of the current session for reporting
    pub fn summary(&self) -> SessionSummary {
        let points = self
            .labels
            .iter()
            .map(|label| (label.clone(), self.store.series_for(label).len()))
            .collect();
        SessionSummary {
            labels: self.labels.clone(),
            session_start: self.store.session_start(),
            stats: self.stats,
            points,
            log_file: self.last_log_file.clone(),
        }
    }

    // ==================== Internals ====================

    /// Idle-only operations need the link back and connected
    fn ensure_idle_link(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(ObdVisError::AlreadyRunning);
        }
        self.reap_worker();
        match self.link.as_deref() {
            Some(link) if link.is_connected() => Ok(()),
            _ => Err(ObdVisError::NotConnected),
        }
    }

    /// Keep graph slots that belong to the new label set; default to the first label
    fn reset_graph_slots(&mut self) {
        for slot in self.display.graphs.iter_mut() {
            if slot.as_ref().is_some_and(|l| !self.labels.contains(l)) {
                *slot = None;
            }
        }
        if self.display.is_empty() {
            self.display.graphs[0] = self.labels.first().cloned();
        }
    }

    /// Join the worker if it has already exited
    fn reap_finished(&mut self) {
        if self.worker.as_ref().is_some_and(JoinHandle::is_finished) {
            self.reap_worker();
        }
    }

    /// Join the worker (blocking) and take the link back
    fn reap_worker(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };
        match handle.join() {
            Ok((link, reason)) => {
                tracing::debug!("Acquisition thread joined: {:?}", reason);
                self.running.store(false, Ordering::SeqCst);
                self.link = Some(link);
                self.last_exit = Some(reason);
            }
            Err(_) => {
                self.running.store(false, Ordering::SeqCst);
                self.sink.close();
                tracing::error!("Acquisition thread panicked; link lost");
                self.events.log("Acquisition thread failed; link lost.");
            }
        }
    }
}

impl Drop for PipelineController {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.reap_worker();
        self.sink.close();
        if let Some(mut link) = self.link.take() {
            if let Err(e) = link.close() {
                tracing::warn!("Error closing link on shutdown: {}", e);
            }
        }
    }
}
