//! Parameter registry: label → link command table
//!
//! The registry is loaded once at startup. Labels are what the user picks
//! and what appears in series and CSV headers; commands are handed to the
//! link's own [`DiagnosticLink::resolve`] lookup, so the pipeline never
//! hard-codes any per-field constant.

use crate::backend::link::DiagnosticLink;
use crate::error::{ObdVisError, Result};
use crate::types::Parameter;
use std::collections::HashSet;

/// Standard OBD-II catalog in display order. Unsupported PIDs just read N/A.
const DEFAULT_CATALOG: &[(&str, &str)] = &[
    // Core driving data
    ("Engine RPM", "RPM"),
    ("Vehicle Speed", "SPEED"),
    ("Coolant Temp", "COOLANT_TEMP"),
    ("Engine Load", "ENGINE_LOAD"),
    ("Throttle Position", "THROTTLE_POS"),
    ("Fuel Level", "FUEL_LEVEL"),
    ("Run Time", "RUN_TIME"),
    // Fuel trims
    ("Short Fuel Trim Bank 1", "SHORT_FUEL_TRIM_1"),
    ("Long Fuel Trim Bank 1", "LONG_FUEL_TRIM_1"),
    ("Short Fuel Trim Bank 2", "SHORT_FUEL_TRIM_2"),
    ("Long Fuel Trim Bank 2", "LONG_FUEL_TRIM_2"),
    // Airflow / manifold / timing
    ("Intake Manifold Pressure", "INTAKE_PRESSURE"),
    ("Intake Air Temp", "INTAKE_TEMP"),
    ("MAF", "MAF"),
    ("Timing Advance", "TIMING_ADVANCE"),
    ("Barometric Pressure", "BAROMETRIC_PRESSURE"),
    // O2 sensor voltages
    ("O2 B1S1 Voltage", "O2_B1S1"),
    ("O2 B1S2 Voltage", "O2_B1S2"),
    ("O2 B2S1 Voltage", "O2_B2S1"),
    ("O2 B2S2 Voltage", "O2_B2S2"),
    // Misc
    ("Distance w/ MIL On", "DISTANCE_W_MIL"),
    ("Distance Since DTC Clear", "DISTANCE_SINCE_DTC_CLEAR"),
    ("Control Module Voltage", "CONTROL_MODULE_VOLTAGE"),
    ("Oil Temp", "OIL_TEMP"),
    ("Fuel Type", "FUEL_TYPE"),
];

/// Labels selected when no explicit parameter list is configured
const DEFAULT_SELECTION: &[&str] = &[
    "Engine RPM",
    "Vehicle Speed",
    "Coolant Temp",
    "Engine Load",
    "Throttle Position",
];

/// Ordered label → command table
#[derive(Debug, Clone, Default)]
pub struct ParameterRegistry {
    entries: Vec<(String, String)>,
}

impl ParameterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the standard OBD-II catalog
    pub fn default_catalog() -> Self {
        let mut registry = Self::new();
        for (label, command) in DEFAULT_CATALOG {
            registry.insert(*label, *command);
        }
        registry
    }

    /// Labels selected by default
    pub fn default_selection() -> Vec<String> {
        DEFAULT_SELECTION.iter().map(|s| s.to_string()).collect()
    }

    /// Add or replace an entry, keeping the original position on replace
    pub fn insert(&mut self, label: impl Into<String>, command: impl Into<String>) {
        let label = label.into();
        let command = command.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = command,
            None => self.entries.push((label, command)),
        }
    }

    /// Command registered for a label
    pub fn command_for(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| c.as_str())
    }

    /// All labels in registry order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve labels into parameters, in the order given
    ///
    /// Fails with `InvalidConfig` for an empty list, a duplicate label, a
    /// label missing from the registry, or a command the link cannot resolve.
    pub fn resolve(&self, labels: &[String], link: &dyn DiagnosticLink) -> Result<Vec<Parameter>> {
        if labels.is_empty() {
            return Err(ObdVisError::InvalidConfig(
                "Select at least one parameter".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut parameters = Vec::with_capacity(labels.len());
        for label in labels {
            if !seen.insert(label.as_str()) {
                return Err(ObdVisError::InvalidConfig(format!(
                    "Duplicate parameter label '{}'",
                    label
                )));
            }
            let command = self.command_for(label).ok_or_else(|| {
                ObdVisError::InvalidConfig(format!("Unknown parameter '{}'", label))
            })?;
            let descriptor = link.resolve(command).ok_or_else(|| {
                ObdVisError::InvalidConfig(format!(
                    "Link does not support command '{}' for '{}'",
                    command, label
                ))
            })?;
            parameters.push(Parameter::new(label.clone(), descriptor));
        }
        Ok(parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::link::MockDiagnosticLink;
    use crate::types::ParameterDescriptor;

    fn permissive_link() -> MockDiagnosticLink {
        let mut link = MockDiagnosticLink::new();
        link.expect_resolve()
            .returning(|cmd| Some(ParameterDescriptor::new(cmd)));
        link
    }

    #[test]
    fn test_default_catalog() {
        let registry = ParameterRegistry::default_catalog();
        assert_eq!(registry.len(), 25);
        assert_eq!(registry.command_for("Engine RPM"), Some("RPM"));
        assert_eq!(registry.command_for("Fuel Type"), Some("FUEL_TYPE"));
        assert_eq!(registry.labels().next(), Some("Engine RPM"));

        for label in ParameterRegistry::default_selection() {
            assert!(registry.command_for(&label).is_some(), "{label} missing");
        }
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut registry = ParameterRegistry::default_catalog();
        registry.insert("Engine RPM", "RPM_FAST");
        registry.insert("Boost", "BOOST");

        assert_eq!(registry.len(), 26);
        assert_eq!(registry.labels().next(), Some("Engine RPM"));
        assert_eq!(registry.command_for("Engine RPM"), Some("RPM_FAST"));
        assert_eq!(registry.labels().last(), Some("Boost"));
    }

    #[test]
    fn test_resolve_preserves_order() {
        let registry = ParameterRegistry::default_catalog();
        let link = permissive_link();
        let labels = vec!["Vehicle Speed".to_string(), "Engine RPM".to_string()];

        let params = registry.resolve(&labels, &link).unwrap();
        assert_eq!(params[0].label, "Vehicle Speed");
        assert_eq!(params[0].descriptor.as_str(), "SPEED");
        assert_eq!(params[1].label, "Engine RPM");
    }

    #[test]
    fn test_resolve_rejects_bad_labels() {
        let registry = ParameterRegistry::default_catalog();
        let link = permissive_link();

        let empty = registry.resolve(&[], &link).unwrap_err();
        assert!(matches!(empty, ObdVisError::InvalidConfig(_)));

        let unknown = registry
            .resolve(&["Warp Factor".to_string()], &link)
            .unwrap_err();
        assert!(unknown.to_string().contains("Warp Factor"));

        let dup = vec!["MAF".to_string(), "MAF".to_string()];
        assert!(matches!(
            registry.resolve(&dup, &link),
            Err(ObdVisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_resolve_goes_through_link_lookup() {
        let registry = ParameterRegistry::default_catalog();
        let mut link = MockDiagnosticLink::new();
        link.expect_resolve()
            .returning(|cmd| (cmd != "OIL_TEMP").then(|| ParameterDescriptor::new(cmd)));

        let err = registry
            .resolve(&["Oil Temp".to_string()], &link)
            .unwrap_err();
        assert!(err.to_string().contains("OIL_TEMP"));
    }
}
