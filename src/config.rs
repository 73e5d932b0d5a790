use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::QualifyingTypes;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub distance_matrix: DistanceMatrixSettings,
    #[serde(default)]
    pub eligibility: EligibilitySettings,
    pub facilities: FacilitySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DistanceMatrixSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DistanceMatrixSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String { crate::services::distance_matrix::DEFAULT_ENDPOINT.to_string() }
fn default_request_timeout_secs() -> u64 { 8 }

#[derive(Debug, Clone, Deserialize)]
pub struct EligibilitySettings {
    #[serde(default = "default_threshold_miles")]
    pub threshold_miles: f64,
    #[serde(default = "default_qualifying_types")]
    pub qualifying_types: Vec<String>,
    #[serde(default = "default_check_timeout_secs")]
    pub check_timeout_secs: u64,
    #[serde(default = "default_session_capacity")]
    pub session_capacity: u64,
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

impl EligibilitySettings {
    pub fn qualifying(&self) -> QualifyingTypes {
        QualifyingTypes::new(self.qualifying_types.iter().cloned())
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }
}

impl Default for EligibilitySettings {
    fn default() -> Self {
        Self {
            threshold_miles: default_threshold_miles(),
            qualifying_types: default_qualifying_types(),
            check_timeout_secs: default_check_timeout_secs(),
            session_capacity: default_session_capacity(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

fn default_threshold_miles() -> f64 { crate::core::DEFAULT_THRESHOLD_MILES }
fn default_qualifying_types() -> Vec<String> { vec!["VAMC".to_string(), "CBOC".to_string()] }
fn default_check_timeout_secs() -> u64 { 10 }
fn default_session_capacity() -> u64 { 10_000 }
fn default_session_idle_secs() -> u64 { 900 }

#[derive(Debug, Clone, Deserialize)]
pub struct FacilitySettings {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with ELIGIBILITY__)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., ELIGIBILITY__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("ELIGIBILITY")
        .prefix_separator("__")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("eligibility.qualifying_types")
        .try_parsing(true)
}

/// Apply well-known environment variables that don't follow the prefix scheme
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(api_key) = env::var("GOOGLE_MAPS_API_KEY") {
        builder = builder.set_override("distance_matrix.api_key", api_key)?;
    }
    if let Ok(path) = env::var("FACILITIES_PATH") {
        builder = builder.set_override("facilities.path", path)?;
    }

    builder.build()
}
