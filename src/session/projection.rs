//! Windowed projection of a series for charting
//!
//! [`project`] is a pure function: it keeps no state between calls and
//! never mutates its input, so the controller simply re-runs it after
//! every sample and every window change.

use crate::types::SeriesPoint;

/// Largest window the display accepts, in seconds
pub const MAX_WINDOW_SECS: f64 = 3600.0;

/// Visible time range of a chart
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TimeWindow {
    /// Whole series
    #[default]
    All,
    /// Trailing window in seconds, measured back from the newest point
    Last(f64),
}

impl TimeWindow {
    /// Interpret a seconds value the way the display does: `<= 0` means all
    pub fn from_secs(window_seconds: f64) -> Self {
        if window_seconds > 0.0 {
            TimeWindow::Last(window_seconds.min(MAX_WINDOW_SECS))
        } else {
            TimeWindow::All
        }
    }

    /// Seconds value, `0.0` for [`TimeWindow::All`]
    pub fn as_secs(&self) -> f64 {
        match self {
            TimeWindow::All => 0.0,
            TimeWindow::Last(secs) => *secs,
        }
    }
}

/// Points of `series` visible in a window of `window_seconds`
///
/// `window_seconds <= 0` (or NaN) returns the full series. Otherwise only points with
/// `time >= t_last - window_seconds` are kept, where `t_last` is the time of
/// the last point. An empty series projects to an empty sequence.
pub fn project(series: &[SeriesPoint], window_seconds: f64) -> Vec<SeriesPoint> {
    if window_seconds.is_nan() || window_seconds <= 0.0 {
        return series.to_vec();
    }
    let Some(last) = series.last() else {
        return Vec::new();
    };
    let t0 = last.time - window_seconds;
    series.iter().filter(|p| p.time >= t0).copied().collect()
}

/// [`project`] driven by a [`TimeWindow`]
pub fn project_window(series: &[SeriesPoint], window: TimeWindow) -> Vec<SeriesPoint> {
    project(series, window.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn series(times: &[f64]) -> Vec<SeriesPoint> {
        times
            .iter()
            .enumerate()
            .map(|(i, t)| SeriesPoint::new(*t, i as f64))
            .collect()
    }

    #[test]
    fn test_zero_window_is_identity() {
        let s = series(&[0.0, 0.5, 1.0, 1.5]);
        assert_eq!(project(&s, 0.0), s);
        assert_eq!(project(&s, -5.0), s);
    }

    #[test]
    fn test_window_keeps_trailing_points() {
        let s = series(&[0.0, 0.5, 1.0, 1.5, 2.0]);
        let p = project(&s, 1.0);
        let times: Vec<f64> = p.iter().map(|pt| pt.time).collect();
        assert_eq!(times, vec![1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_empty_series() {
        assert!(project(&[], 10.0).is_empty());
        assert!(project(&[], 0.0).is_empty());
    }

    #[test]
    fn test_time_window_conversion() {
        assert_eq!(TimeWindow::from_secs(0.0), TimeWindow::All);
        assert_eq!(TimeWindow::from_secs(-1.0), TimeWindow::All);
        assert_eq!(TimeWindow::from_secs(f64::NAN), TimeWindow::All);
        assert_eq!(TimeWindow::from_secs(30.0), TimeWindow::Last(30.0));
        assert_eq!(TimeWindow::from_secs(1e9), TimeWindow::Last(MAX_WINDOW_SECS));
        assert_eq!(TimeWindow::All.as_secs(), 0.0);

        let s = series(&[0.0, 10.0, 20.0]);
        assert_eq!(project_window(&s, TimeWindow::Last(10.0)).len(), 2);
    }

    proptest! {
        #[test]
        fn test_projection_laws(
            mut times in prop::collection::vec(0.0f64..500.0, 0..80),
            window in 0.01f64..200.0,
        ) {
            times.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let s = series(&times);

            // Identity for "all"
            prop_assert_eq!(project(&s, 0.0), s.clone());

            let p = project(&s, window);
            if let Some(last) = s.last() {
                // Everything kept lies in [t_last - W, t_last]
                prop_assert!(p.iter().all(|pt| pt.time >= last.time - window && pt.time <= last.time));
                // Nothing in range was dropped
                let in_range = s.iter().filter(|pt| pt.time >= last.time - window).count();
                prop_assert_eq!(p.len(), in_range);
                // Newest point always survives
                prop_assert_eq!(p.last(), Some(last));
            } else {
                prop_assert!(p.is_empty());
            }

            // Referentially transparent
            prop_assert_eq!(project(&s, window), p);
        }
    }
}
