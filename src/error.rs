//! Failures of the per-event algorithm and of the trigger tools
//!
//! Only hard failures live here. An event which does not have enough
//! selected objects, or a chain which is missing from the trigger
//! configuration, are normal outcomes and are never reported as errors.

use thiserror::Error;

/// Errors raised by the analysis algorithm
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// A required container could not be retrieved from the event
    #[error("failed to retrieve \"{key}\" from the event")]
    MissingInput { key: String },

    /// The container exists, but does not hold the expected objects
    #[error("container \"{key}\" holds {found}, expected {expected}")]
    WrongContainer {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The trigger emulation does not know how to evaluate a chain
    #[error("cannot emulate chain \"{chain}\": {reason}")]
    UnsupportedChain { chain: String, reason: String },
}
