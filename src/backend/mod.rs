//! Backend module: everything that talks to the diagnostic link
//!
//! # Main Types
//!
//! - [`DiagnosticLink`] - Trait the pipeline consumes from the instrument connection
//! - [`ParameterRegistry`] - Label → command table resolved through the link
//! - [`AcquisitionLoop`] - Polling loop run on the dedicated acquisition thread
//! - [`MockLink`] - Synthetic link for tests and the headless demo
//!
//! # Threading
//!
//! Only the acquisition thread performs link I/O while a session is active.
//! Its output reaches the consumer exclusively through the
//! [`EventBridge`](crate::pipeline::EventBridge).

pub mod acquisition;
pub mod link;
pub mod mock_link;
pub mod registry;

pub use acquisition::{AcquisitionLoop, ExitReason};
pub use link::{coerce, DiagnosticLink, LinkValue, Response, TroubleCode};
pub use mock_link::{MockBehavior, MockDataPattern, MockLink, MockLinkHandle, MockResponse};
pub use registry::ParameterRegistry;
