//! Configuration module for the OneThing pilot.
//!
//! This module handles all configuration-related functionality:
//! - Parsing `onething.yaml` and `.env` files
//! - Environment variable overrides
//! - Validation of configuration values

mod parser;
mod spec;
mod validator;

pub use parser::{
    api_key_from, apply_env_overrides, find_config_file, ConfigParser, API_KEY_VAR, BASE_URL_VAR,
    DEFAULT_CONFIG_FILES, MAX_RETRIES_VAR, RETRY_DELAY_VAR, TIMEOUT_VAR,
};
pub use spec::{ApiConfig, PilotConfig, ScalingConfig};
pub use validator::{ConfigIssue, ConfigValidator, ValidationResult};
