//! Mock construction helpers

use obdvis_rs::backend::{MockBehavior, MockLink};
use obdvis_rs::config::AppConfig;
use obdvis_rs::session::CsvSink;
use obdvis_rs::{ParameterRegistry, PipelineController};
use std::path::Path;

/// Link answering RPM = 800.0 and "no data" for SPEED
pub fn idle_engine_link() -> MockLink {
    MockLink::new()
        .with_behavior("RPM", MockBehavior::constant(800.0, "revolutions_per_minute"))
        .with_behavior("SPEED", MockBehavior::NoData)
}

/// Controller writing CSV logs into `dir`
pub fn controller_in(dir: &Path) -> PipelineController {
    PipelineController::new(
        ParameterRegistry::default_catalog(),
        CsvSink::new(dir, "obd_log"),
    )
}

/// Default config with persistence redirected into `dir`
pub fn config_in(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.persistence.directory = dir.to_path_buf();
    config
}
