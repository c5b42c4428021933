//! Configuration parser for loading the pilot configuration.
//!
//! This module handles loading configuration from YAML files, `.env` files
//! and environment variables, with environment values taking precedence.

use crate::error::{ConfigError, PilotError, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use super::spec::PilotConfig;

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "ONETHING_API_KEY";

/// Environment variable overriding `api.base_url`.
pub const BASE_URL_VAR: &str = "ONETHING_BASE_URL";

/// Environment variable overriding `api.max_retries`.
pub const MAX_RETRIES_VAR: &str = "ONETHING_MAX_RETRIES";

/// Environment variable overriding `api.timeout_secs`.
pub const TIMEOUT_VAR: &str = "ONETHING_TIMEOUT_SECS";

/// Environment variable overriding `api.retry_delay_secs`.
pub const RETRY_DELAY_VAR: &str = "ONETHING_RETRY_DELAY_SECS";

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["onething.yaml", "onething.yml"];

/// Configuration parser for loading pilot configuration.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving the `.env` file.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving the `.env` file.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<PilotConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(PilotError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            PilotError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses configuration from a YAML string.
    ///
    /// An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<PilotConfig> {
        debug!("Parsing YAML configuration");

        if content.trim().is_empty() {
            return Ok(PilotConfig::default());
        }

        serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            PilotError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })
    }

    /// Resolves and loads the configuration.
    ///
    /// An explicit path must exist. Without one, the working directory and
    /// its parents are searched, then the user config directory. When no
    /// file is found the defaults are used. Environment overrides are
    /// applied last.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be loaded or an override is invalid.
    pub fn load(&self, explicit: Option<&Path>) -> Result<PilotConfig> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let cwd = std::env::current_dir()?;
                find_config_file(&cwd).ok().or_else(user_config_file)
            }
        };

        let mut config = match path {
            Some(path) => self.load_file(path)?,
            None => {
                debug!("No configuration file found, using defaults");
                PilotConfig::default()
            }
        };

        apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                PilotError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    /// Gets the API key from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not set.
    pub fn get_api_key() -> Result<String> {
        api_key_from(|name| std::env::var(name).ok())
    }
}

/// Reads the API key through `lookup`. Blank values count as missing.
///
/// # Errors
///
/// Returns an error if the key is absent or blank.
pub fn api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    lookup(API_KEY_VAR)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            PilotError::Config(ConfigError::MissingEnvVar {
                name: String::from(API_KEY_VAR),
            })
        })
}

/// Applies environment overrides read through `lookup`.
///
/// # Errors
///
/// Returns an error if a numeric override does not parse.
pub fn apply_env_overrides(
    config: &mut PilotConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(url) = lookup(BASE_URL_VAR) {
        debug!("Overriding api.base_url from environment");
        config.api.base_url = url;
    }

    if let Some(value) = lookup(MAX_RETRIES_VAR) {
        debug!("Overriding api.max_retries from environment");
        config.api.max_retries = parse_var(MAX_RETRIES_VAR, &value)?;
    }

    if let Some(value) = lookup(TIMEOUT_VAR) {
        debug!("Overriding api.timeout_secs from environment");
        config.api.timeout_secs = parse_var(TIMEOUT_VAR, &value)?;
    }

    if let Some(value) = lookup(RETRY_DELAY_VAR) {
        debug!("Overriding api.retry_delay_secs from environment");
        config.api.retry_delay_secs = parse_var(RETRY_DELAY_VAR, &value)?;
    }

    Ok(())
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        PilotError::Config(ConfigError::InvalidEnvVar {
            name: name.to_string(),
            value: value.to_string(),
        })
    })
}

/// Finds the configuration file in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no configuration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(PilotError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

/// Returns `<config dir>/onething/onething.yaml` if it exists.
fn user_config_file() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("onething").join(DEFAULT_CONFIG_FILES[0]);
    path.exists().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r"
api:
  max_retries: 5
";
        let config = ConfigParser::new().parse_yaml(yaml, None).unwrap();
        assert_eq!(config.api.max_retries, 5);
        assert_eq!(config.api.timeout_secs, 10);
        assert!((config.scaling.cpu_threshold - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
api:
  base_url: "https://api.example.com/"
  max_retries: 2
  timeout_secs: 30
  retry_delay_secs: 0.5
scaling:
  cpu_threshold: 75
  memory_threshold: 90
  scale_up_cooldown_secs: 120
  scale_down_cooldown_secs: 600
"#;
        let config = ConfigParser::new().parse_yaml(yaml, None).unwrap();
        let settings = config.api.transport_settings("key");
        assert_eq!(settings.base_url, "https://api.example.com");
        assert_eq!(settings.retry_delay, Duration::from_millis(500));
        assert_eq!(config.scaling.policy().scale_down_cooldown, Duration::from_secs(600));
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = ConfigParser::new().parse_yaml("  \n", None).unwrap();
        assert_eq!(config, PilotConfig::default());
    }

    #[test]
    fn test_invalid_yaml() {
        let err = ConfigParser::new()
            .parse_yaml("api: [unclosed", Some(Path::new("onething.yaml")))
            .unwrap_err();
        assert!(matches!(
            err,
            PilotError::Config(ConfigError::ParseError { location: Some(_), .. })
        ));
    }

    #[test]
    fn test_load_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigParser::new()
            .load_file(dir.path().join("onething.yaml"))
            .unwrap_err();
        assert!(matches!(err, PilotError::Config(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_find_config_file_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("onething.yml"), "api: {}\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config_file(&nested).unwrap();
        assert_eq!(found, dir.path().join("onething.yml"));

        let config = ConfigParser::new().load_file(found).unwrap();
        assert_eq!(config, PilotConfig::default());
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(ConfigParser::new().load(Some(missing.as_path())).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = PilotConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                (BASE_URL_VAR, "http://localhost:8080"),
                (MAX_RETRIES_VAR, "7"),
                (RETRY_DELAY_VAR, "0.25"),
            ]),
        )
        .unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.max_retries, 7);
        assert_eq!(config.api.timeout_secs, 10);
        assert!((config.api.retry_delay_secs - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_env_override() {
        let mut config = PilotConfig::default();
        let err = apply_env_overrides(&mut config, env(&[(TIMEOUT_VAR, "soon")])).unwrap_err();
        assert!(matches!(
            err,
            PilotError::Config(ConfigError::InvalidEnvVar { ref name, .. }) if name == TIMEOUT_VAR
        ));
    }

    #[test]
    fn test_api_key_lookup() {
        assert_eq!(api_key_from(env(&[(API_KEY_VAR, " secret ")])).unwrap(), "secret");
        assert!(api_key_from(env(&[(API_KEY_VAR, "  ")])).is_err());
        assert!(api_key_from(env(&[])).is_err());
    }

    #[test]
    fn test_load_dotenv_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigParser::new().with_base_path(dir.path()).load_dotenv().is_ok());
    }
}
