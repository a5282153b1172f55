//! Test to verify test infrastructure works correctly

mod common;

use common::builders::{labels, SampleSeriesBuilder};
use obdvis_rs::session::SessionStore;

#[test]
fn test_infrastructure_setup() {
    let samples = SampleSeriesBuilder::new()
        .reading("Engine RPM", Some(812.0))
        .build(3);

    let mut store = SessionStore::new();
    for sample in &samples {
        store.record(sample);
    }

    let series = store.series_for("Engine RPM");
    assert_eq!(series.len(), 3);
    common::assert_float_eq(series[2].time, 1.0, 1e-9);
    assert_eq!(labels(&["a", "b"]), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_float_comparison() {
    common::assert_float_eq(1.0, 1.0000001, 0.001);
}

#[test]
#[should_panic]
fn test_float_comparison_fails() {
    common::assert_float_eq(1.0, 2.0, 0.001);
}

#[test]
fn test_wait_until() {
    let mut calls = 0;
    assert!(common::wait_until(common::test_interval(), || {
        calls += 1;
        calls >= 2
    }));
    assert_eq!(common::body("[12:34:56] hello"), "hello");
}
