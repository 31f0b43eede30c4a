use serde::{Deserialize, Serialize};
use smart_list_core::{EngineOptions, IndicatorTimings, NameMatch};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the local list cache
    pub data_dir: ConfigValue<PathBuf>,
    /// Base URL of the SmartList backend
    pub server_url: ConfigValue<String>,
    /// YAML catalog file; the built-in catalog is used when unset
    pub catalog_path: ConfigValue<Option<PathBuf>>,
    /// How duplicate item names are detected
    pub duplicate_match: ConfigValue<NameMatch>,
    pub request_timeout_secs: ConfigValue<u64>,
    pub saved_indicator_ms: ConfigValue<u64>,
    pub failed_indicator_ms: ConfigValue<u64>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    server_url: Option<String>,
    catalog_path: Option<PathBuf>,
    duplicate_match: Option<NameMatch>,
    request_timeout_secs: Option<u64>,
    saved_indicator_ms: Option<u64>,
    failed_indicator_ms: Option<u64>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut server_url = ConfigValue::new(
            "http://localhost:8888".to_string(),
            ConfigSource::Default,
        );
        let mut catalog_path = ConfigValue::new(None, ConfigSource::Default);
        let mut duplicate_match = ConfigValue::new(NameMatch::default(), ConfigSource::Default);
        let mut request_timeout_secs = ConfigValue::new(30, ConfigSource::Default);
        let mut saved_indicator_ms = ConfigValue::new(2000, ConfigSource::Default);
        let mut failed_indicator_ms = ConfigValue::new(3000, ConfigSource::Default);
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                data_dir = ConfigValue::new(resolve_relative(&path, dir), ConfigSource::File);
            }
            if let Some(url) = file_config.server_url {
                server_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(catalog) = file_config.catalog_path {
                catalog_path =
                    ConfigValue::new(Some(resolve_relative(&path, catalog)), ConfigSource::File);
            }
            if let Some(names) = file_config.duplicate_match {
                duplicate_match = ConfigValue::new(names, ConfigSource::File);
            }
            if let Some(secs) = file_config.request_timeout_secs {
                request_timeout_secs = ConfigValue::new(secs, ConfigSource::File);
            }
            if let Some(ms) = file_config.saved_indicator_ms {
                saved_indicator_ms = ConfigValue::new(ms, ConfigSource::File);
            }
            if let Some(ms) = file_config.failed_indicator_ms {
                failed_indicator_ms = ConfigValue::new(ms, ConfigSource::File);
            }
        }

        // Apply environment variable overrides
        if let Ok(dir) = std::env::var("SMARTLIST_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("SMARTLIST_SERVER_URL") {
            server_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Ok(catalog) = std::env::var("SMARTLIST_CATALOG") {
            catalog_path =
                ConfigValue::new(Some(PathBuf::from(catalog)), ConfigSource::Environment);
        }
        if let Ok(raw) = std::env::var("SMARTLIST_DUPLICATE_MATCH") {
            let names = parse_name_match(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: "SMARTLIST_DUPLICATE_MATCH".to_string(),
                value: raw.clone(),
            })?;
            duplicate_match = ConfigValue::new(names, ConfigSource::Environment);
        }
        if let Ok(raw) = std::env::var("SMARTLIST_REQUEST_TIMEOUT_SECS") {
            let secs = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "SMARTLIST_REQUEST_TIMEOUT_SECS".to_string(),
                value: raw.clone(),
            })?;
            request_timeout_secs = ConfigValue::new(secs, ConfigSource::Environment);
        }

        Ok(Self {
            data_dir,
            server_url,
            catalog_path,
            duplicate_match,
            request_timeout_secs,
            saved_indicator_ms,
            failed_indicator_ms,
            config_file,
        })
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            name_match: self.duplicate_match.value,
            timings: IndicatorTimings {
                saved: Duration::from_millis(self.saved_indicator_ms.value),
                failed: Duration::from_millis(self.failed_indicator_ms.value),
            },
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.value)
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/smartlist/
    /// - macOS: ~/Library/Application Support/smartlist/
    /// - Windows: %APPDATA%/smartlist/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("smartlist")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/smartlist/
    /// - macOS: ~/Library/Application Support/smartlist/
    /// - Windows: %APPDATA%/smartlist/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("smartlist")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

// Relative paths in the config file are relative to the file itself.
fn resolve_relative(config_path: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        config_path
            .parent()
            .map(|p| p.join(&path))
            .unwrap_or(path)
    } else {
        path
    }
}

fn parse_name_match(raw: &str) -> Option<NameMatch> {
    match raw.trim().to_lowercase().as_str() {
        "exact" => Some(NameMatch::Exact),
        "ignore_case" | "ignore-case" => Some(NameMatch::IgnoreCase),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue { key: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value for {}: '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
