//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use std::time::{Duration, Instant};

/// Acquisition interval used by integration tests
pub fn test_interval() -> Duration {
    Duration::from_millis(20)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Poll `condition` until it holds or `timeout` elapses
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Strip the `[HH:MM:SS] ` prefix from an event-log line
pub fn body(line: &str) -> &str {
    line.get(11..).unwrap_or(line)
}
