//! Domain-specific error types for rsmachine.
//!
//! This module defines `RsmachineError`, a `thiserror`-based enum that
//! lets callers tell failure kinds apart (missing machine record, OS
//! detection failure, driver failure, ...). Orchestration code and trait
//! boundaries return `anyhow::Result`, adding context only where it helps
//! the reader; the typed error stays reachable with
//! `anyhow::Error::downcast_ref::<RsmachineError>()`.

use std::io;

/// Formats an IO error kind into a human-readable message.
///
/// Provides consistent messages for common IO error kinds
/// (e.g., "I/O error: not found") instead of the OS-level messages
/// (e.g., "No such file or directory (os error 2)"). For unrecognized
/// error kinds, falls back to the OS-level error message.
pub(crate) fn io_error_kind_message(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "I/O error: not found".to_string(),
        io::ErrorKind::PermissionDenied => "I/O error: permission denied".to_string(),
        io::ErrorKind::IsADirectory => "I/O error: is a directory".to_string(),
        _ => format!("I/O error: {}", err),
    }
}

/// Domain-specific error type for rsmachine.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RsmachineError {
    /// A validation constraint was violated.
    #[error("validation error: {0}")]
    Validation(String),

    /// The machine store holds no record for the requested name.
    #[error("host is nil: no machine named '{0}'")]
    HostNotFound(String),

    /// A loaded machine failed the structural validity check.
    #[error("machine '{0}' is not valid: its record is incomplete")]
    InvalidMachine(String),

    /// A host record lacks a part required by the requested operation.
    #[error("host record '{name}' has no {field}")]
    IncompleteHost {
        /// Name of the host record.
        name: String,
        /// The missing part (e.g., "driver", "host options").
        field: &'static str,
    },

    /// The operating system of a live node could not be classified.
    #[error("OS type not recognized: {0}")]
    DetectionFailed(String),

    /// A driver could not answer a query about its machine.
    #[error("driver error: {0}")]
    Driver(String),

    /// The requested command was not found in `PATH`.
    #[error("command not found in PATH: {command}")]
    CommandNotFound {
        /// The command that could not be located.
        command: String,
    },

    /// A command execution failed (non-zero exit, spawn failure, wait failure, etc.).
    #[error("command execution failed: {command}: {status}")]
    Execution {
        /// The command that was executed.
        command: String,
        /// Human-readable reason for the failure.
        status: String,
    },

    /// A configuration or record file could not be parsed or encoded.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O operation failed with contextual information.
    #[error("{context}: {message}")]
    Io {
        /// What was being done when the error occurred, usually a path.
        context: String,
        /// Human-readable description derived from [`io_error_kind_message`].
        message: String,
        /// The underlying I/O error, preserved for programmatic inspection.
        #[source]
        source: std::io::Error,
    },
}

impl RsmachineError {
    /// Creates an `Io` variant with the `message` field derived from `source`.
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            message: io_error_kind_message(&source),
            source,
        }
    }
}
