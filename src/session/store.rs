//! Per-session time-series store

use std::collections::HashMap;

use chrono::{DateTime, Local};

use crate::types::{Sample, SeriesPoint};

/// Append-only per-label series for the current session
///
/// Only touched from the consumer side, so it needs no locking.
#[derive(Debug, Default)]
pub struct SessionStore {
    /// Timestamp of the first sample recorded since the last reset
    session_start: Option<DateTime<Local>>,
    /// Series per label, in insertion order
    series: HashMap<String, Vec<SeriesPoint>>,
    /// Samples recorded this session
    samples_recorded: u64,
    /// Latest relative time handed out; series never go back past it
    last_relative: f64,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all series and the session anchor
    pub fn reset(&mut self) {
        self.session_start = None;
        self.series.clear();
        self.samples_recorded = 0;
        self.last_relative = 0.0;
    }

    /// Record a sample, anchoring the session on the first call after reset
    ///
    /// Null readings register the label but add no point: a gap, not a zero.
    /// A timestamp older than one already recorded is held at the newest time.
    pub fn record(&mut self, sample: &Sample) {
        let start = *self.session_start.get_or_insert(sample.timestamp);
        let relative = relative_seconds(start, sample.timestamp).max(self.last_relative);
        self.last_relative = relative;

        for (label, reading) in &sample.readings {
            let series = self.series.entry(label.clone()).or_default();
            if let Some(value) = reading {
                series.push(SeriesPoint::new(relative, *value));
            }
        }
        self.samples_recorded += 1;
    }

    /// The series for `label`; empty for a label never seen
    pub fn series_for(&self, label: &str) -> &[SeriesPoint] {
        self.series.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Anchor timestamp of the current session, if any sample arrived
    pub fn session_start(&self) -> Option<DateTime<Local>> {
        self.session_start
    }

    /// Labels seen this session (unordered)
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Number of samples recorded since the last reset
    pub fn samples_recorded(&self) -> u64 {
        self.samples_recorded
    }

    /// Whether nothing has been recorded since the last reset
    pub fn is_empty(&self) -> bool {
        self.samples_recorded == 0
    }
}

/// Seconds from `start` to `at`, with microsecond resolution
fn relative_seconds(start: DateTime<Local>, at: DateTime<Local>) -> f64 {
    let delta = at.signed_duration_since(start);
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::projection::project;
    use chrono::Duration;
    use proptest::prelude::*;

    fn sample_at(base: DateTime<Local>, ms: i64) -> Sample {
        Sample::new(base + Duration::milliseconds(ms))
    }

    #[test]
    fn test_first_sample_anchors_at_zero() {
        let base = Local::now();
        let mut store = SessionStore::new();

        store.record(&sample_at(base, 0).with_reading("Engine RPM", Some(800.0)));
        store.record(&sample_at(base, 500).with_reading("Engine RPM", Some(820.0)));

        assert_eq!(store.session_start(), Some(base));
        assert_eq!(
            store.series_for("Engine RPM"),
            &[SeriesPoint::new(0.0, 800.0), SeriesPoint::new(0.5, 820.0)]
        );
    }

    #[test]
    fn test_null_readings_leave_gaps() {
        let base = Local::now();
        let mut store = SessionStore::new();
        store.record(
            &sample_at(base, 0)
                .with_reading("Engine RPM", Some(800.0))
                .with_reading("Vehicle Speed", None),
        );
        store.record(&sample_at(base, 500).with_reading("Vehicle Speed", Some(0.0)));

        assert_eq!(store.series_for("Engine RPM").len(), 1);
        assert_eq!(
            store.series_for("Vehicle Speed"),
            &[SeriesPoint::new(0.5, 0.0)]
        );
        assert!(store.labels().any(|l| l == "Vehicle Speed"));
    }

    #[test]
    fn test_unknown_label_is_empty() {
        let store = SessionStore::new();
        assert!(store.series_for("Oil Temp").is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_reset_clears_anchor() {
        let base = Local::now();
        let mut store = SessionStore::new();
        store.record(&sample_at(base, 0).with_reading("MAF", Some(3.2)));
        store.reset();

        assert!(store.session_start().is_none());
        assert!(store.series_for("MAF").is_empty());

        store.record(&sample_at(base, 10_000).with_reading("MAF", Some(4.0)));
        assert_eq!(store.series_for("MAF"), &[SeriesPoint::new(0.0, 4.0)]);
    }

    #[test]
    fn test_clock_step_back_keeps_series_ordered() {
        let base = Local::now();
        let mut store = SessionStore::new();
        for ms in [0, 10_000, 5_000] {
            store.record(&sample_at(base, ms).with_reading("Engine RPM", Some(800.0)));
        }

        let times: Vec<f64> = store.series_for("Engine RPM").iter().map(|p| p.time).collect();
        assert_eq!(times, vec![0.0, 10.0, 10.0]);

        let projected = project(store.series_for("Engine RPM"), 3.0);
        let t_last = projected.last().unwrap().time;
        assert!(projected.iter().all(|p| p.time >= t_last - 3.0 && p.time <= t_last));

        store.reset();
        store.record(&sample_at(base, 0).with_reading("Engine RPM", Some(1.0)));
        assert_eq!(store.series_for("Engine RPM"), &[SeriesPoint::new(0.0, 1.0)]);
    }

    proptest! {
        #[test]
        fn test_point_count_matches_non_null_readings(
            readings in prop::collection::vec(
                (prop::option::of(-1000.0f64..1000.0), prop::option::of(0.0f64..250.0)),
                1..60,
            )
        ) {
            let base = Local::now();
            let mut store = SessionStore::new();
            for (i, (rpm, speed)) in readings.iter().enumerate() {
                store.record(
                    &sample_at(base, i as i64 * 250)
                        .with_reading("Engine RPM", *rpm)
                        .with_reading("Vehicle Speed", *speed),
                );
            }

            let rpm_expected = readings.iter().filter(|(r, _)| r.is_some()).count();
            let speed_expected = readings.iter().filter(|(_, s)| s.is_some()).count();
            prop_assert_eq!(store.series_for("Engine RPM").len(), rpm_expected);
            prop_assert_eq!(store.series_for("Vehicle Speed").len(), speed_expected);

            // Times never decrease within a series
            let series = store.series_for("Engine RPM");
            prop_assert!(series.windows(2).all(|w| w[0].time <= w[1].time));

            // The anchoring sample sits at t = 0 for any label it carried
            if let Some(first) = readings[0].0 {
                prop_assert_eq!(series[0], SeriesPoint::new(0.0, first));
            }
        }
    }
}
