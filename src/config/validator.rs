//! Configuration validation.
//!
//! Checks loaded values before they reach the transport or the scaling
//! policy, collecting every problem instead of stopping at the first.

use crate::error::{ConfigError, PilotError, Result};
use tracing::debug;

use super::spec::{ApiConfig, PilotConfig, ScalingConfig};

/// Retry counts above this produce a warning.
const MAX_SENSIBLE_RETRIES: u32 = 10;

/// Retry delays above this (seconds) produce a warning.
const MAX_SENSIBLE_RETRY_DELAY_SECS: f64 = 60.0;

/// Validator for pilot configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all problems found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ConfigIssue>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single configuration problem.
#[derive(Debug)]
pub struct ConfigIssue {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigIssue {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a configuration.
    ///
    /// # Errors
    ///
    /// Returns the first error if validation fails.
    pub fn validate(&self, config: &PilotConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_api(&config.api, &mut result);
        Self::validate_scaling(&config.scaling, &mut result);

        match result.errors.first() {
            None => {
                debug!("Configuration validation passed");
                Ok(result)
            }
            Some(first_error) => Err(PilotError::Config(ConfigError::validation(
                first_error.message.clone(),
                first_error.field.clone(),
            ))),
        }
    }

    fn validate_api(api: &ApiConfig, result: &mut ValidationResult) {
        let url = api.base_url.trim();
        if url.is_empty() {
            result
                .errors
                .push(ConfigIssue::new("api.base_url", "Base URL cannot be empty"));
        } else if !(url.starts_with("http://") || url.starts_with("https://")) {
            result.errors.push(ConfigIssue::new(
                "api.base_url",
                format!("Base URL '{url}' must start with http:// or https://"),
            ));
        } else if url.starts_with("http://") {
            result
                .warnings
                .push(format!("Base URL '{url}' sends the API key without TLS"));
        }

        if api.max_retries == 0 {
            result.errors.push(ConfigIssue::new(
                "api.max_retries",
                "At least one attempt is required",
            ));
        } else if api.max_retries > MAX_SENSIBLE_RETRIES {
            result.warnings.push(format!(
                "{} attempts per call may hold requests for a long time",
                api.max_retries
            ));
        }

        if api.timeout_secs == 0 {
            result
                .errors
                .push(ConfigIssue::new("api.timeout_secs", "Timeout must be positive"));
        }

        if !api.retry_delay_secs.is_finite() || api.retry_delay_secs < 0.0 {
            result.errors.push(ConfigIssue::new(
                "api.retry_delay_secs",
                format!("Retry delay {} must be a non-negative number", api.retry_delay_secs),
            ));
        } else if api.retry_delay_secs > MAX_SENSIBLE_RETRY_DELAY_SECS {
            result.warnings.push(format!(
                "Retry delay of {}s grows by that much on every attempt",
                api.retry_delay_secs
            ));
        }
    }

    fn validate_scaling(scaling: &ScalingConfig, result: &mut ValidationResult) {
        for (field, value) in [
            ("scaling.cpu_threshold", scaling.cpu_threshold),
            ("scaling.memory_threshold", scaling.memory_threshold),
        ] {
            if !is_valid_percentage(value) {
                result.errors.push(ConfigIssue::new(
                    field,
                    format!("Threshold {value} must be in (0, 100]"),
                ));
            }
        }

        if scaling.scale_up_cooldown_secs == 0 || scaling.scale_down_cooldown_secs == 0 {
            result
                .warnings
                .push(String::from("A zero cooldown lets the policy fire on every poll"));
        }
    }
}

fn is_valid_percentage(value: f64) -> bool {
    value.is_finite() && value > 0.0 && value <= 100.0
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
