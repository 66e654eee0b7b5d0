//! Error handling for CabinetKit
//!
//! Provides error types for every layer of the engine:
//! - Calculation errors (remote derivation service)
//! - Configuration errors (loading/validating settings)
//!
//! All error types use `thiserror` for ergonomic error handling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single input rejected by the calculation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// The request field the service complained about (e.g. `width_in`).
    pub field: String,
    /// Human-readable reason from the service.
    pub message: String,
}

impl FieldError {
    /// Create a new field error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Calculation error type
///
/// Represents every way a remote derivation call can end without a usable
/// envelope. Cancellation is part of the taxonomy so callers can tell an
/// expected supersession apart from a genuine failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    /// The request was superseded or aborted before it completed
    #[error("Calculation cancelled")]
    Cancelled,

    /// The service rejected one or more inputs
    #[error("Calculation inputs rejected ({} field(s))", fields.len())]
    Validation {
        /// One entry per offending field.
        fields: Vec<FieldError>,
    },

    /// The service could not be reached
    #[error("Calculation service unreachable: {reason}")]
    Transport {
        /// The reason the transport failed.
        reason: String,
    },

    /// The service did not answer in time
    #[error("Calculation timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// The service answered with a body that could not be decoded
    #[error("Malformed calculation response: {reason}")]
    Decode {
        /// The reason decoding failed.
        reason: String,
    },

    /// The service answered with an unexpected status
    #[error("Calculation service returned {status}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
}

impl CalcError {
    /// Check if this is an expected cancellation (never surfaced to the user)
    pub fn is_cancellation(&self) -> bool {
        matches!(self, CalcError::Cancelled)
    }

    /// Check if the service rejected the inputs
    pub fn is_validation(&self) -> bool {
        matches!(self, CalcError::Validation { .. })
    }

    /// Stable short category name used for telemetry
    pub fn category(&self) -> &'static str {
        match self {
            CalcError::Cancelled => "cancelled",
            CalcError::Validation { .. } => "validation",
            CalcError::Transport { .. } => "transport",
            CalcError::Timeout { .. } => "timeout",
            CalcError::Decode { .. } => "decode",
            CalcError::Service { .. } => "service",
        }
    }
}

/// Main error type for CabinetKit
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Calculation error
    #[error(transparent)]
    Calc(#[from] CalcError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Check if this is a calculation error
    pub fn is_calc_error(&self) -> bool {
        matches!(self, Error::Calc(_))
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
