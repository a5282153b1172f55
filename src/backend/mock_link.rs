//! Mock diagnostic link for tests and the headless demo
//!
//! [`MockLink`] answers queries from per-command behaviours instead of a
//! real vehicle bus. It is the link the CLI runs against and the one the
//! integration tests drive the pipeline with.
//!
//! # Behaviours
//!
//! - [`MockBehavior::Pattern`] - synthetic waveform with a unit
//! - [`MockBehavior::Text`] - non-numeric value (exercises coercion failure)
//! - [`MockBehavior::NoData`] - link answers "no data"
//! - [`MockBehavior::Fail`] - query returns an error
//! - [`MockBehavior::Sequence`] - scripted responses, last one repeats
//!
//! Commands without a configured behaviour answer "no data", like an ECU
//! that does not support the PID.
//!
//! # Remote control
//!
//! The link is moved into the acquisition thread, so tests keep a
//! [`MockLinkHandle`] to observe query counts and to simulate a dropped
//! connection from outside.

use crate::backend::link::{
    DiagnosticLink, LinkValue, Response, TroubleCode, CLEAR_DTC_COMMAND, GET_DTC_COMMAND,
};
use crate::error::{ObdVisError, Result};
use crate::types::ParameterDescriptor;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Pattern for generating mock data
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockDataPattern {
    /// Constant value
    Constant(f64),
    /// Sine wave with frequency and amplitude
    Sine {
        frequency: f64,
        amplitude: f64,
        offset: f64,
    },
    /// Counter that increments on every query
    Counter { step: f64, min: f64, max: f64 },
    /// Random values within range
    Random { min: f64, max: f64 },
    /// Sawtooth wave
    Sawtooth { period: f64, amplitude: f64 },
}

impl MockDataPattern {
    /// Generate a value for `elapsed_secs`; `counter` carries Counter state
    fn generate(&self, elapsed_secs: f64, counter: &mut f64) -> f64 {
        match *self {
            MockDataPattern::Constant(v) => v,
            MockDataPattern::Sine {
                frequency,
                amplitude,
                offset,
            } => offset + amplitude * (2.0 * std::f64::consts::PI * frequency * elapsed_secs).sin(),
            MockDataPattern::Counter { step, min, max } => {
                *counter += step;
                if *counter > max {
                    *counter = min;
                } else if *counter < min {
                    *counter = max;
                }
                *counter
            }
            MockDataPattern::Random { min, max } => min + rand_simple() * (max - min),
            MockDataPattern::Sawtooth { period, amplitude } => {
                let t = elapsed_secs % period;
                amplitude * (t / period)
            }
        }
    }
}

/// Scripted response used by [`MockBehavior::Sequence`]
#[derive(Debug, Clone, PartialEq)]
pub enum MockResponse {
    /// Unit-bearing value
    Quantity(f64, &'static str),
    /// Non-numeric text
    Text(String),
    /// "No data"
    NoData,
    /// Query error with message
    Fail(String),
}

/// How the mock answers a given command
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Synthetic waveform with unit
    Pattern {
        pattern: MockDataPattern,
        unit: &'static str,
    },
    /// Always the same text value
    Text(String),
    /// Always "no data"
    NoData,
    /// Always an error
    Fail(String),
    /// Scripted responses in order; the last one repeats
    Sequence(Vec<MockResponse>),
}

impl MockBehavior {
    /// Shorthand for a pattern behaviour
    pub fn pattern(pattern: MockDataPattern, unit: &'static str) -> Self {
        MockBehavior::Pattern { pattern, unit }
    }

    /// Shorthand for a constant quantity
    pub fn constant(value: f64, unit: &'static str) -> Self {
        MockBehavior::Pattern {
            pattern: MockDataPattern::Constant(value),
            unit,
        }
    }
}

#[derive(Debug)]
struct CommandState {
    behavior: MockBehavior,
    counter: f64,
    cursor: usize,
}

/// Simple pseudo-random number generator (no external dependency)
fn rand_simple() -> f64 {
    use std::cell::Cell;
    thread_local! {
        static SEED: Cell<u64> = Cell::new(0x2545_F491_4F6C_DD1D);
    }
    SEED.with(|seed| {
        let mut s = seed.get();
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        seed.set(s);
        (s as f64) / (u64::MAX as f64)
    })
}

/// Shared view of a [`MockLink`] that survives the link being moved
#[derive(Debug, Clone)]
pub struct MockLinkHandle {
    connected: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
    queries: Arc<AtomicU64>,
}

impl MockLinkHandle {
    /// Simulate the instrument dropping off the bus
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Whether the link currently reports connected
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Whether `close()` has been called on the link
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Total queries issued against the link
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }
}

/// Mock diagnostic link
#[derive(Debug)]
pub struct MockLink {
    behaviors: HashMap<String, CommandState>,
    supported: Option<HashSet<String>>,
    stored_codes: Vec<TroubleCode>,
    query_delay: Duration,
    disconnect_after: Option<u64>,
    start_time: Instant,
    connected: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
    queries: Arc<AtomicU64>,
}

impl Default for MockLink {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLink {
    /// Create a connected mock link with no configured commands
    pub fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
            supported: None,
            stored_codes: Vec::new(),
            query_delay: Duration::ZERO,
            disconnect_after: None,
            start_time: Instant::now(),
            connected: Arc::new(AtomicBool::new(true)),
            closed: Arc::new(AtomicBool::new(false)),
            queries: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A link that behaves like an idling petrol engine
    pub fn simulated_engine() -> Self {
        Self::new()
            .with_behavior(
                "RPM",
                MockBehavior::pattern(
                    MockDataPattern::Sine {
                        frequency: 0.05,
                        amplitude: 1100.0,
                        offset: 1900.0,
                    },
                    "revolutions_per_minute",
                ),
            )
            .with_behavior(
                "SPEED",
                MockBehavior::pattern(
                    MockDataPattern::Sine {
                        frequency: 0.02,
                        amplitude: 40.0,
                        offset: 50.0,
                    },
                    "kph",
                ),
            )
            .with_behavior(
                "COOLANT_TEMP",
                MockBehavior::pattern(
                    MockDataPattern::Counter {
                        step: 0.1,
                        min: 20.0,
                        max: 92.0,
                    },
                    "degC",
                ),
            )
            .with_behavior(
                "ENGINE_LOAD",
                MockBehavior::pattern(MockDataPattern::Random { min: 15.0, max: 60.0 }, "percent"),
            )
            .with_behavior(
                "THROTTLE_POS",
                MockBehavior::pattern(
                    MockDataPattern::Sawtooth {
                        period: 8.0,
                        amplitude: 80.0,
                    },
                    "percent",
                ),
            )
            .with_behavior("FUEL_LEVEL", MockBehavior::constant(63.5, "percent"))
            .with_behavior("CONTROL_MODULE_VOLTAGE", MockBehavior::constant(14.1, "volt"))
            .with_behavior("INTAKE_TEMP", MockBehavior::constant(31.0, "degC"))
            .with_behavior("FUEL_TYPE", MockBehavior::Text("Gasoline".to_string()))
            .with_stored_codes(vec![TroubleCode::new(
                "P0420",
                "Catalyst System Efficiency Below Threshold (Bank 1)",
            )])
    }

    /// Configure the behaviour for a command
    pub fn with_behavior(mut self, command: impl Into<String>, behavior: MockBehavior) -> Self {
        self.behaviors.insert(
            command.into(),
            CommandState {
                behavior,
                counter: 0.0,
                cursor: 0,
            },
        );
        self
    }

    /// Restrict which commands `resolve` accepts
    pub fn with_supported_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported = Some(commands.into_iter().map(Into::into).collect());
        self
    }

    /// Trouble codes reported by `GET_DTC`
    pub fn with_stored_codes(mut self, codes: Vec<TroubleCode>) -> Self {
        self.stored_codes = codes;
        self
    }

    /// Simulated per-query latency
    pub fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = delay;
        self
    }

    /// Drop the connection once `queries` queries have been answered
    pub fn with_disconnect_after(mut self, queries: u64) -> Self {
        self.disconnect_after = Some(queries);
        self
    }

    /// Handle for observing the link after it has been moved
    pub fn handle(&self) -> MockLinkHandle {
        MockLinkHandle {
            connected: self.connected.clone(),
            closed: self.closed.clone(),
            queries: self.queries.clone(),
        }
    }

    fn answer(&mut self, command: &str) -> Result<Response> {
        if command == GET_DTC_COMMAND {
            return Ok(Response::Value(LinkValue::TroubleCodes(
                self.stored_codes.clone(),
            )));
        }
        if command == CLEAR_DTC_COMMAND {
            self.stored_codes.clear();
            return Ok(Response::Value(LinkValue::Flag(true)));
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let Some(state) = self.behaviors.get_mut(command) else {
            return Ok(Response::Null);
        };

        match &state.behavior {
            MockBehavior::Pattern { pattern, unit } => {
                let value = pattern.generate(elapsed, &mut state.counter);
                Ok(Response::quantity(value, *unit))
            }
            MockBehavior::Text(text) => Ok(Response::text(text.clone())),
            MockBehavior::NoData => Ok(Response::Null),
            MockBehavior::Fail(message) => Err(ObdVisError::Link(message.clone())),
            MockBehavior::Sequence(steps) => {
                let Some(step) = steps.get(state.cursor.min(steps.len().saturating_sub(1)))
                else {
                    return Ok(Response::Null);
                };
                state.cursor += 1;
                match step {
                    MockResponse::Quantity(v, unit) => Ok(Response::quantity(*v, *unit)),
                    MockResponse::Text(t) => Ok(Response::text(t.clone())),
                    MockResponse::NoData => Ok(Response::Null),
                    MockResponse::Fail(m) => Err(ObdVisError::Link(m.clone())),
                }
            }
        }
    }
}

impl DiagnosticLink for MockLink {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn query(&mut self, descriptor: &ParameterDescriptor) -> Result<Response> {
        if !self.is_connected() {
            return Err(ObdVisError::Link("not connected".to_string()));
        }
        if !self.query_delay.is_zero() {
            std::thread::sleep(self.query_delay);
        }

        let answered = self.queries.fetch_add(1, Ordering::SeqCst) + 1;
        let response = self.answer(descriptor.as_str());

        if self.disconnect_after.is_some_and(|limit| answered >= limit) {
            tracing::debug!("Mock link dropping connection after {} queries", answered);
            self.connected.store(false, Ordering::SeqCst);
        }
        response
    }

    fn resolve(&self, command: &str) -> Option<ParameterDescriptor> {
        match &self.supported {
            Some(set) if !set.contains(command) => None,
            _ => Some(ParameterDescriptor::new(command)),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
