//! Test data builders for creating test objects

use chrono::{DateTime, Duration, Local};
use obdvis_rs::Sample;

/// Builder for a run of samples spaced at a fixed step
pub struct SampleSeriesBuilder {
    start: DateTime<Local>,
    step_ms: i64,
    readings: Vec<(String, Option<f64>)>,
}

impl SampleSeriesBuilder {
    pub fn new() -> Self {
        Self {
            start: Local::now(),
            step_ms: 500,
            readings: Vec::new(),
        }
    }

    pub fn start(mut self, start: DateTime<Local>) -> Self {
        self.start = start;
        self
    }

    pub fn step_ms(mut self, step_ms: i64) -> Self {
        self.step_ms = step_ms;
        self
    }

    /// Reading carried by every sample
    pub fn reading(mut self, label: &str, value: Option<f64>) -> Self {
        self.readings.push((label.to_string(), value));
        self
    }

    pub fn build(self, count: usize) -> Vec<Sample> {
        (0..count)
            .map(|i| {
                let ts = self.start + Duration::milliseconds(self.step_ms * i as i64);
                self.readings
                    .iter()
                    .fold(Sample::new(ts), |s, (label, value)| {
                        s.with_reading(label.clone(), *value)
                    })
            })
            .collect()
    }
}

impl Default for SampleSeriesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned label list from string literals
pub fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_series_builder() {
        let samples = SampleSeriesBuilder::new()
            .step_ms(250)
            .reading("Engine RPM", Some(800.0))
            .reading("Vehicle Speed", None)
            .build(4);

        assert_eq!(samples.len(), 4);
        assert_eq!(samples[3].reading("Engine RPM"), Some(800.0));
        assert_eq!(samples[3].null_count(), 1);
        assert_eq!(
            (samples[3].timestamp - samples[0].timestamp).num_milliseconds(),
            750
        );
    }
}
