//! Error types for spotctl
//!
//! There are three error types: `SpotctlError` (main error enum), `ConfigError`
//! (configuration-specific) and `InvalidInputError` (raised by the pricing
//! recommender, defined in `crate::pricing`).
//!
//! ## Error Handling Philosophy
//!
//! Library code uses `crate::error::Result<T>` which returns `SpotctlError`.
//! The binary uses `anyhow::Result<T>` for top-level error handling and maps
//! the root `SpotctlError` to an exit code (see `crate::exit_codes`).
//!
//! ## Retry Awareness
//!
//! Errors implement `IsRetryable` to indicate whether an operation should be
//! retried. Only `CloudProvider`, `Io` and `Retryable` are retryable: they are
//! produced for timeouts, dispatch failures and throttling. A service error
//! such as an unknown AMI becomes `Aws` and fails immediately.
//!
//! ## When to Use Which Error
//!
//! - `Config`: configuration parsing and validation issues
//! - `InvalidInput`: price history that cannot produce a recommendation
//! - `CloudProvider`: transient EC2 API failures
//! - `Aws`: EC2 rejected the call
//! - `ProfileNotFound`: launch profile name not present in the config
//! - `ResourceNotFound`: an instance, volume or request ID EC2 does not know
//! - `Validation`: malformed user input (ids, prices, tags)

use crate::pricing::InvalidInputError;
use crate::provider::ResourceId;
use thiserror::Error;

/// Main error type for spotctl
#[derive(Error, Debug)]
pub enum SpotctlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid price history: {0}")]
    InvalidInput(#[from] InvalidInputError),

    #[error("Cloud provider error: {operation} - {message}")]
    CloudProvider { operation: String, message: String },

    #[error("Retryable error (attempt {attempt}/{max_attempts}): {reason}")]
    Retryable {
        attempt: u32,
        max_attempts: u32,
        reason: String,
        #[source]
        source: Option<Box<SpotctlError>>,
    },

    #[error("AWS SDK error: {0}")]
    Aws(String),

    #[error("Launch profile not found: {name}")]
    ProfileNotFound { name: String },

    #[error("Resource not found: {resource_type} - {resource_id}")]
    ResourceNotFound {
        resource_type: String,
        resource_id: ResourceId,
    },

    #[error("Validation error: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SpotctlError>;

/// Trait for determining if an error is retryable
///
/// Used by `RetryPolicy` implementations to decide whether an error
/// should trigger another attempt.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for SpotctlError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            SpotctlError::Retryable { .. }
                | SpotctlError::CloudProvider { .. }
                | SpotctlError::Io(_)
        )
    }
}

impl SpotctlError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SpotctlError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
