//! Configuration types for the OneThing pilot.
//!
//! These structs map to the `onething.yaml` file. The API key is never part
//! of the file; it only comes from the environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::onething::{
    TransportSettings, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT,
};
use crate::scaling::{
    AutoscalingPolicy, DEFAULT_COOLDOWN, DEFAULT_CPU_THRESHOLD, DEFAULT_MEMORY_THRESHOLD,
};

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PilotConfig {
    /// Connection settings.
    pub api: ApiConfig,
    /// Autoscaling thresholds.
    pub scaling: ScalingConfig,
}

/// Connection settings for the OneThing API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Base URL of the API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Total attempts per call.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Per-attempt timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Base retry delay in seconds; attempt `n` waits `n` times this.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: f64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl ApiConfig {
    /// Builds transport settings for the given API key.
    ///
    /// Negative or non-finite retry delays collapse to zero.
    #[must_use]
    pub fn transport_settings(&self, api_key: &str) -> TransportSettings {
        let retry_delay = Duration::try_from_secs_f64(self.retry_delay_secs).unwrap_or_default();
        TransportSettings::new(api_key)
            .with_base_url(&self.base_url)
            .with_max_retries(self.max_retries)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_retry_delay(retry_delay)
    }
}

/// Autoscaling thresholds and cooldowns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScalingConfig {
    /// CPU usage threshold (percent).
    #[serde(default = "default_cpu_threshold")]
    pub cpu_threshold: f64,
    /// Memory usage threshold (percent).
    #[serde(default = "default_memory_threshold")]
    pub memory_threshold: f64,
    /// Scale-up cooldown in seconds.
    #[serde(default = "default_cooldown_secs")]
    pub scale_up_cooldown_secs: u64,
    /// Scale-down cooldown in seconds.
    #[serde(default = "default_cooldown_secs")]
    pub scale_down_cooldown_secs: u64,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            cpu_threshold: default_cpu_threshold(),
            memory_threshold: default_memory_threshold(),
            scale_up_cooldown_secs: default_cooldown_secs(),
            scale_down_cooldown_secs: default_cooldown_secs(),
        }
    }
}

impl ScalingConfig {
    /// Converts the thresholds into a policy.
    #[must_use]
    pub const fn policy(&self) -> AutoscalingPolicy {
        AutoscalingPolicy {
            cpu_threshold: self.cpu_threshold,
            memory_threshold: self.memory_threshold,
            scale_up_cooldown: Duration::from_secs(self.scale_up_cooldown_secs),
            scale_down_cooldown: Duration::from_secs(self.scale_down_cooldown_secs),
        }
    }
}

fn default_base_url() -> String {
    String::from(DEFAULT_BASE_URL)
}

const fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

const fn default_retry_delay_secs() -> f64 {
    DEFAULT_RETRY_DELAY.as_secs_f64()
}

const fn default_cpu_threshold() -> f64 {
    DEFAULT_CPU_THRESHOLD
}

const fn default_memory_threshold() -> f64 {
    DEFAULT_MEMORY_THRESHOLD
}

const fn default_cooldown_secs() -> u64 {
    DEFAULT_COOLDOWN.as_secs()
}
