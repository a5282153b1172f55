//! Acquisition loop running on the dedicated polling thread
//!
//! The loop owns the diagnostic link for the duration of a session and is
//! the only code that performs link I/O while a session is active. It
//! never touches the session store or the sink; everything it produces
//! goes onto the [`BridgeSender`].
//!
//! # One tick
//!
//! For each parameter, in order:
//!
//! - "no data" → reading `None`, fragment `label=N/A`
//! - query error → reading `None`, a separate `Error querying <label>: <cause>`
//!   line, no fragment; the tick carries on with the next parameter
//! - value → coerced through [`coerce`]; on coercion failure the reading is
//!   `None` but the raw value still appears as `label=<raw>`
//!
//! Then exactly one [`Sample`] (stamped with the tick start time) and one
//! aggregated `label=value | label=value` line are pushed.
//!
//! Tick times are the wall clock read once at construction plus monotonic
//! elapsed time, so a clock step during a session never reorders samples.
//!
//! # Exit
//!
//! The running flag and the link's connection state are checked at the top
//! of every tick; no tick starts once either says stop. The sleep between
//! ticks is sliced so a cleared flag is noticed quickly.

use crate::backend::link::{coerce, DiagnosticLink, Response};
use crate::pipeline::bridge::BridgeSender;
use crate::types::{Parameter, Sample};
use chrono::{DateTime, Local};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest single sleep between running-flag checks
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The running flag was cleared
    Stopped,
    /// The link reported disconnected
    Disconnected,
}

/// The acquisition loop for one session
pub struct AcquisitionLoop {
    link: Box<dyn DiagnosticLink>,
    parameters: Vec<Parameter>,
    interval: Duration,
    running: Arc<AtomicBool>,
    bridge: BridgeSender,
    ticks: u64,
    /// Wall-clock time paired with `clock`
    anchor: DateTime<Local>,
    clock: Instant,
}

impl AcquisitionLoop {
    /// Create a loop over `parameters`, polling every `interval`
    pub fn new(
        link: Box<dyn DiagnosticLink>,
        parameters: Vec<Parameter>,
        interval: Duration,
        running: Arc<AtomicBool>,
        bridge: BridgeSender,
    ) -> Self {
        Self {
            link,
            parameters,
            interval,
            running,
            bridge,
            ticks: 0,
            anchor: Local::now(),
            clock: Instant::now(),
        }
    }

    /// Run until stopped or disconnected, then hand the link back
    pub fn run(mut self) -> (Box<dyn DiagnosticLink>, ExitReason) {
        tracing::info!(
            "Acquisition started: {} parameters every {:?}",
            self.parameters.len(),
            self.interval
        );

        let reason = loop {
            if !self.running.load(Ordering::SeqCst) {
                break ExitReason::Stopped;
            }
            if !self.link.is_connected() {
                break ExitReason::Disconnected;
            }

            self.tick();
            self.sleep_interval();
        };

        if reason == ExitReason::Disconnected {
            tracing::warn!("Link disconnected, acquisition ending after {} ticks", self.ticks);
            self.bridge.log("Link disconnected; live data stopped.");
        } else {
            tracing::info!("Acquisition stopped after {} ticks", self.ticks);
        }

        (self.link, reason)
    }

    /// Perform one acquisition tick and push its sample and log line
    pub fn tick(&mut self) {
        let mut sample = Sample::new(self.now());
        let mut fragments = Vec::with_capacity(self.parameters.len());

        for param in &self.parameters {
            match self.link.query(&param.descriptor) {
                Ok(Response::Null) => {
                    sample.set_reading(param.label.clone(), None);
                    fragments.push(format!("{}=N/A", param.label));
                }
                Ok(Response::Value(value)) => {
                    let numeric = coerce(&value);
                    if numeric.is_none() {
                        tracing::trace!("'{}' returned non-numeric value {}", param.label, value);
                    }
                    sample.set_reading(param.label.clone(), numeric);
                    fragments.push(format!("{}={}", param.label, value));
                }
                Err(e) => {
                    tracing::warn!("Error querying {}: {}", param.label, e);
                    self.bridge
                        .log(&format!("Error querying {}: {}", param.label, e));
                    sample.set_reading(param.label.clone(), None);
                }
            }
        }

        self.ticks += 1;
        self.bridge.log(&fragments.join(" | "));
        self.bridge.push_sample(sample);
    }

    /// Current time on the session clock; never goes backwards
    fn now(&self) -> DateTime<Local> {
        let elapsed = chrono::Duration::from_std(self.clock.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.anchor + elapsed
    }

    /// Sleep for the interval, waking early if the running flag clears
    fn sleep_interval(&self) {
        let deadline = Instant::now() + self.interval;
        loop {
            if !self.running.load(Ordering::SeqCst) {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            std::thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}
