//! Error types for SSD accelerator operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for SSD driver operations
pub type Result<T> = std::result::Result<T, SsdError>;

/// Errors that can occur while driving the accelerator or computing references
#[derive(Debug, Error)]
pub enum SsdError {
    /// Template ID outside the table or the control-word ID field
    #[error("Template ID {id} out of range (have {count} templates)")]
    InvalidTemplateId {
        /// Requested ID
        id: usize,
        /// Number of addressable templates
        count: usize,
    },

    /// Two sample sequences that must match in length do not
    #[error("Length mismatch: expected {expected} samples, got {actual}")]
    LengthMismatch {
        /// Expected length
        expected: usize,
        /// Length supplied
        actual: usize,
    },

    /// Vector longer than the control-word index field can address
    #[error("Sample index {index} does not fit the index field (max {max})")]
    SampleIndexOverflow {
        /// 1-based index that was requested
        index: usize,
        /// Largest addressable index
        max: usize,
    },

    /// DONE never asserted within the bounded wait
    #[error("Hardware timeout: DONE not asserted after {polls} status polls")]
    HardwareTimeout {
        /// Status reads performed before giving up
        polls: u64,
    },

    /// SSD does not fit the 32-bit distance register
    #[error("Distance overflow: {wide} exceeds the 32-bit accumulator")]
    DistanceOverflow {
        /// Exact sum computed in 64 bits
        wide: u64,
    },

    /// Configuration rejected during validation or parsing
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Reason for failure
        reason: String,
    },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path that was checked
        path: PathBuf,
    },

    /// I/O error while mapping or reading files
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Register window could not be mapped or accessed
    #[error("Register access failed: {reason}")]
    RegisterAccess {
        /// Reason for failure
        reason: String,
    },

    /// Selected backend cannot be used in this environment
    #[error("Backend unavailable: {reason}")]
    BackendUnavailable {
        /// Reason for failure
        reason: String,
    },
}

impl SsdError {
    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a register access error
    pub fn register_access(reason: impl Into<String>) -> Self {
        Self::RegisterAccess {
            reason: reason.into(),
        }
    }

    /// Create a backend unavailable error
    pub fn backend_unavailable(reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a length mismatch error
    pub const fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::LengthMismatch { expected, actual }
    }
}
