//! Engine-boundary error type.

use std::fmt;

/// Error returned from `Engine::step` and related top-level entry points.
///
/// Anomalies with a well-defined recovery never reach this type; they go
/// through [`crate::warnings::Warnings`] instead and the call returns its
/// documented neutral value.
#[derive(Debug, Clone)]
pub enum EngineError {
    /// An instruction could not be decoded or dispatched at all — program
    /// counter corruption, an unrecognized opcode with fatal handling
    /// enabled, or a story image too short to read from.
    Fatal(String),
    /// The host violated the suspension protocol, e.g. answered a save
    /// request with the wrong response variant.
    ProtocolViolation(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Fatal(msg) => write!(f, "fatal error: {msg}"),
            EngineError::ProtocolViolation(msg) => write!(f, "protocol violation: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<String> for EngineError {
    fn from(msg: String) -> Self {
        EngineError::Fatal(msg)
    }
}
