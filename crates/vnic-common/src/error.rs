//! Error types for vnic operations.
//!
//! This module defines the error types used throughout the vnic crates.
//! All errors implement `std::error::Error` via `thiserror`.

use thiserror::Error;

/// Result type alias for vnic operations.
pub type VnicResult<T> = Result<T, VnicError>;

/// Errors that can occur during vnic operations.
#[derive(Debug, Error)]
pub enum VnicError {
    /// The host registration authority rejected the device descriptor.
    ///
    /// Fatal to device creation: all partially allocated resources are
    /// released before this error is returned.
    #[error("Device registration failed (host code {code})")]
    RegistrationFailed {
        /// Host-supplied rejection code.
        code: i32,
    },

    /// The diagnostics surface could not be published.
    ///
    /// Non-fatal: the device remains registered and fully usable, it
    /// just has no readable stats surface.
    #[error("Diagnostics publish failed for device '{name}'")]
    DiagnosticsUnavailable {
        /// The device whose stats surface is missing.
        name: String,
    },

    /// An operation was invoked in a state that does not permit it.
    #[error("Invalid transition: {op} while device is {from}")]
    InvalidTransition {
        /// The operation that was attempted (e.g., "open", "stop").
        op: &'static str,
        /// The state the device was in.
        from: &'static str,
    },

    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// Internal error (unexpected state).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl VnicError {
    /// Creates a registration failure error.
    pub fn registration_failed(code: i32) -> Self {
        Self::RegistrationFailed { code }
    }

    /// Creates a diagnostics unavailable error.
    pub fn diagnostics_unavailable(name: impl Into<String>) -> Self {
        Self::DiagnosticsUnavailable { name: name.into() }
    }

    /// Creates an invalid transition error.
    pub fn invalid_transition(op: &'static str, from: &'static str) -> Self {
        Self::InvalidTransition { op, from }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error is fatal to device creation.
    ///
    /// Non-fatal errors leave the device registered and usable
    /// (degraded diagnostics, rejected redundant calls).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VnicError::RegistrationFailed { .. } | VnicError::Internal { .. }
        )
    }
}
