//! Error types for the OneThing pilot SDK.
//!
//! This module provides the error hierarchy for every layer of the SDK:
//! request transport, remote API responses, request/response validation
//! and configuration loading.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the OneThing pilot SDK.
#[derive(Debug, Error)]
pub enum PilotError {
    /// The request could not be completed at the transport level.
    #[error("{operation} failed: {source}")]
    Transport {
        /// Name of the operation that failed.
        operation: &'static str,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// The remote API reported a logical failure (`code != 0`).
    #[error("{operation} rejected by OneThing API (code {code}): {message}")]
    Api {
        /// Name of the operation that failed.
        operation: &'static str,
        /// Envelope code returned by the API.
        code: i64,
        /// Human-readable reason from the envelope.
        message: String,
    },

    /// The API answered with an HTTP 4xx status.
    #[error("{operation} failed with HTTP {status}: {body}")]
    Client {
        /// Name of the operation that failed.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        body: String,
    },

    /// A request or response value failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The envelope data did not match the expected response shape.
    #[error("{operation} returned an unexpected payload: {message}")]
    Decode {
        /// Name of the operation that failed.
        operation: &'static str,
        /// Description of the mismatch.
        message: String,
    },

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Every attempt timed out.
    #[error("request timed out after {attempts} attempt(s)")]
    Timeout {
        /// Number of attempts made.
        attempts: u32,
    },

    /// Every attempt ended with an HTTP 5xx status.
    #[error("server error {status} after {attempts} attempt(s)")]
    ServerError {
        /// Last HTTP status received.
        status: u16,
        /// Number of attempts made.
        attempts: u32,
    },

    /// HTTP 4xx status. Never retried.
    #[error("client error {status}: {body}")]
    ClientStatus {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The response body was not a valid JSON envelope.
    #[error("failed to decode response envelope: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },

    /// The request could not be built or sent.
    #[error("request failed: {message}")]
    Request {
        /// Description of the failure.
        message: String,
    },
}

/// Validation failures for requests and decoded responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A field holds an invalid value.
    #[error("{field}: {message}")]
    Field {
        /// The field path that failed validation.
        field: String,
        /// The error message.
        message: String,
    },

    /// An enumerated wire code has no matching variant.
    #[error("unrecognized {kind} code: {value}")]
    UnknownCode {
        /// Name of the enumeration.
        kind: &'static str,
        /// The raw wire value.
        value: i64,
    },
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// Environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },

    /// Environment variable holds an unparsable value.
    #[error("Invalid value for environment variable {name}: {value}")]
    InvalidEnvVar {
        /// Name of the variable.
        name: String,
        /// The rejected value.
        value: String,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {message}")]
    HttpClient {
        /// Description of the failure.
        message: String,
    },
}

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, PilotError>;

impl PilotError {
    /// Wraps a transport failure with the operation it belongs to.
    ///
    /// HTTP 4xx statuses are lifted into [`PilotError::Client`].
    #[must_use]
    pub fn from_transport(operation: &'static str, source: TransportError) -> Self {
        match source {
            TransportError::ClientStatus { status, body } => Self::Client {
                operation,
                status,
                body,
            },
            source => Self::Transport { operation, source },
        }
    }

    /// Creates a decode error for an operation.
    #[must_use]
    pub fn decode(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            operation,
            message: message.into(),
        }
    }

    /// Returns the number of attempts made, for transport failures.
    #[must_use]
    pub const fn attempts(&self) -> Option<u32> {
        match self {
            Self::Transport { source, .. } => source.attempts(),
            Self::Client { .. } => Some(1),
            _ => None,
        }
    }
}

impl TransportError {
    /// Returns true if another attempt may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ServerError { .. })
    }

    /// Returns the attempt count carried by exhausted-retry failures.
    #[must_use]
    pub const fn attempts(&self) -> Option<u32> {
        match self {
            Self::Timeout { attempts } | Self::ServerError { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// Creates a request error.
    #[must_use]
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }

    /// Creates an envelope decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

impl ValidationError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Converts the error set produced by `validator` derives.
    ///
    /// Only the first failing field (in name order) is reported.
    #[must_use]
    pub fn from_report(errors: &validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        fields.first().map_or_else(
            || Self::field("request", errors.to_string()),
            |(name, failures)| {
                let message = failures.first().map_or_else(
                    || String::from("invalid value"),
                    |f| {
                        f.message
                            .as_ref()
                            .map_or_else(|| format!("failed `{}` check", f.code), ToString::to_string)
                    },
                );
                Self::field(name.to_string(), message)
            },
        )
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}
