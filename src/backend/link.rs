//! DiagnosticLink trait for the instrument connection
//!
//! This module provides the interface the pipeline consumes from the
//! diagnostic transport. Protocol decoding lives entirely behind the trait;
//! the pipeline only sees [`Response`] values.
//!
//! # Numeric coercion
//!
//! Link values may be unit-bearing quantities, bare numbers, text or
//! structured payloads. [`coerce`] turns a value into a plottable `f64` by
//! walking an ordered fallback chain: magnitude extraction first, then a
//! direct numeric cast. Anything that falls through the chain, or lands on
//! a non-finite number, becomes a null reading.

use crate::error::Result;
use crate::types::ParameterDescriptor;

/// Command the link resolves for reading stored trouble codes
pub const GET_DTC_COMMAND: &str = "GET_DTC";

/// Command the link resolves for clearing stored trouble codes
pub const CLEAR_DTC_COMMAND: &str = "CLEAR_DTC";

/// A stored diagnostic trouble code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TroubleCode {
    /// Code such as `P0301`
    pub code: String,
    /// Human-readable description (may be empty)
    pub description: String,
}

impl TroubleCode {
    /// Create a new trouble code entry
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }
}

/// A decoded value returned by the link
#[derive(Debug, Clone, PartialEq)]
pub enum LinkValue {
    /// Value with a physical unit
    Quantity { magnitude: f64, unit: String },
    /// Unitless number
    Number(f64),
    /// Free-form text (e.g. fuel type)
    Text(String),
    /// Boolean status
    Flag(bool),
    /// Stored trouble codes
    TroubleCodes(Vec<TroubleCode>),
}

impl LinkValue {
    /// Shorthand for a unit-bearing value
    pub fn quantity(magnitude: f64, unit: impl Into<String>) -> Self {
        LinkValue::Quantity {
            magnitude,
            unit: unit.into(),
        }
    }
}

impl std::fmt::Display for LinkValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkValue::Quantity { magnitude, unit } => write!(f, "{:?} {}", magnitude, unit),
            LinkValue::Number(n) => write!(f, "{:?}", n),
            LinkValue::Text(s) => f.write_str(s),
            LinkValue::Flag(b) => write!(f, "{}", b),
            LinkValue::TroubleCodes(codes) => {
                let joined: Vec<&str> = codes.iter().map(|c| c.code.as_str()).collect();
                write!(f, "[{}]", joined.join(", "))
            }
        }
    }
}

/// Outcome of a single query
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The link answered but had no data for the parameter
    Null,
    /// The link returned a value
    Value(LinkValue),
}

impl Response {
    /// Response carrying a unit-bearing value
    pub fn quantity(magnitude: f64, unit: impl Into<String>) -> Self {
        Response::Value(LinkValue::quantity(magnitude, unit))
    }

    /// Response carrying a unitless number
    pub fn number(value: f64) -> Self {
        Response::Value(LinkValue::Number(value))
    }

    /// Response carrying text
    pub fn text(value: impl Into<String>) -> Self {
        Response::Value(LinkValue::Text(value.into()))
    }

    /// True if the link reported "no data"
    pub fn is_null(&self) -> bool {
        matches!(self, Response::Null)
    }

    /// The value, if any
    pub fn value(&self) -> Option<&LinkValue> {
        match self {
            Response::Null => None,
            Response::Value(v) => Some(v),
        }
    }
}

/// One step of the coercion chain
type Coercion = fn(&LinkValue) -> Option<f64>;

/// Coercion steps, tried in order
const COERCION_CHAIN: &[Coercion] = &[extract_magnitude, cast_numeric];

fn extract_magnitude(value: &LinkValue) -> Option<f64> {
    match value {
        LinkValue::Quantity { magnitude, .. } => Some(*magnitude),
        _ => None,
    }
}

fn cast_numeric(value: &LinkValue) -> Option<f64> {
    match value {
        LinkValue::Number(n) => Some(*n),
        LinkValue::Flag(b) => Some(if *b { 1.0 } else { 0.0 }),
        LinkValue::Text(s) => s.trim().parse::<f64>().ok(),
        LinkValue::Quantity { .. } | LinkValue::TroubleCodes(_) => None,
    }
}

/// Coerce a link value into a plottable number
///
/// Returns `None` when no step of the chain applies or the result is not
/// finite. A failed coercion is not a query error.
pub fn coerce(value: &LinkValue) -> Option<f64> {
    COERCION_CHAIN
        .iter()
        .find_map(|step| step(value))
        .filter(|v| v.is_finite())
}

/// Unified interface for diagnostic links
///
/// Implementations must be `Send`: the link value is moved into the
/// acquisition thread for the duration of a session and handed back when
/// the thread exits, so at most one thread ever performs link I/O.
///
/// # Example
///
/// ```ignore
/// fn read_rpm(link: &mut dyn DiagnosticLink) -> Result<Option<f64>> {
///     let descriptor = link.resolve("RPM").expect("RPM is a standard command");
///     let response = link.query(&descriptor)?;
///     Ok(response.value().and_then(coerce))
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait DiagnosticLink: Send {
    /// Check if the link is still connected to the instrument
    fn is_connected(&self) -> bool;

    /// Issue one query for a parameter
    ///
    /// `Ok(Response::Null)` means the link answered with no data; `Err`
    /// means the query itself failed.
    fn query(&mut self, descriptor: &ParameterDescriptor) -> Result<Response>;

    /// Resolve a command name into a descriptor this link can query
    ///
    /// Returns `None` for commands the link does not know.
    fn resolve(&self, command: &str) -> Option<ParameterDescriptor> {
        Some(ParameterDescriptor::new(command))
    }

    /// Close the connection
    fn close(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_quantity_uses_magnitude() {
        let v = LinkValue::quantity(812.5, "revolutions_per_minute");
        assert_eq!(coerce(&v), Some(812.5));
    }

    #[test]
    fn test_coerce_falls_back_to_numeric_cast() {
        assert_eq!(coerce(&LinkValue::Number(14.2)), Some(14.2));
        assert_eq!(coerce(&LinkValue::Text(" 93.0 ".into())), Some(93.0));
        assert_eq!(coerce(&LinkValue::Flag(true)), Some(1.0));
    }

    #[test]
    fn test_coerce_failure_is_null() {
        assert_eq!(coerce(&LinkValue::Text("Gasoline".into())), None);
        assert_eq!(coerce(&LinkValue::TroubleCodes(vec![])), None);
        assert_eq!(coerce(&LinkValue::Number(f64::NAN)), None);
        assert_eq!(coerce(&LinkValue::quantity(f64::INFINITY, "kph")), None);
    }

    #[test]
    fn test_response_accessors() {
        assert!(Response::Null.is_null());
        assert!(Response::Null.value().is_none());

        let r = Response::quantity(60.0, "kph");
        assert!(!r.is_null());
        assert_eq!(r.value(), Some(&LinkValue::quantity(60.0, "kph")));
    }

    #[test]
    fn test_link_value_display() {
        assert_eq!(
            LinkValue::quantity(800.0, "revolutions_per_minute").to_string(),
            "800.0 revolutions_per_minute"
        );
        assert_eq!(LinkValue::Text("Gasoline".into()).to_string(), "Gasoline");
        let codes = LinkValue::TroubleCodes(vec![
            TroubleCode::new("P0301", "Cylinder 1 Misfire Detected"),
            TroubleCode::new("P0420", ""),
        ]);
        assert_eq!(codes.to_string(), "[P0301, P0420]");
    }
}
