//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and
//! `URL_FETCH_*` environment variables, and merging them with proper
//! precedence rules.

use crate::error::FetchError;
use crate::types::FetchConfig;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Default values for fetch options
    pub defaults: Option<DefaultsConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct DefaultsConfig {
    /// Default concurrency bound
    pub concurrency: Option<usize>,

    /// Per-retrieval timeout (as string, e.g., "5s", "2m")
    pub timeout: Option<String>,

    /// Connect timeout (same format as `timeout`)
    pub connect_timeout: Option<String>,

    /// User-Agent header for HTTP requests
    pub user_agent: Option<String>,
}

impl FileConfig {
    /// Overlay the values set in this file onto `config`.
    pub fn apply_to(&self, mut config: FetchConfig) -> FetchConfig {
        if let Some(defaults) = &self.defaults {
            if let Some(concurrency) = defaults.concurrency {
                config.max_concurrency = concurrency;
            }
            if let Some(secs) = defaults.timeout.as_deref().and_then(parse_timeout_string) {
                config.timeout = Duration::from_secs(secs);
            }
            if let Some(secs) = defaults
                .connect_timeout
                .as_deref()
                .and_then(parse_timeout_string)
            {
                config.connect_timeout = Duration::from_secs(secs);
            }
            if let Some(user_agent) = &defaults.user_agent {
                config.user_agent = user_agent.clone();
            }
        }
        config
    }
}

/// Configuration discovery and loading functionality.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigManager;

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, FetchError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(FetchError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            FetchError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)
            .map_err(|e| FetchError::config(format!("Failed to parse TOML configuration: {}", e)))?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config, then home directory, then the current directory; later
    /// files override earlier ones field by field.
    pub fn discover_and_load(&self) -> Result<FileConfig, FetchError> {
        let mut merged_config = FileConfig::default();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    debug!(path = %path.display(), "loaded config file");
                    merged_config = self.merge_configs(merged_config, config);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "ignoring config file"),
            }
        }

        Ok(merged_config)
    }

    /// Look for configuration files in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./url-fetch.toml", "./.url-fetch.toml"]
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Look for configuration files in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".url-fetch.toml", "url-fetch.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("url-fetch").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations; values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(mut lower_defaults), Some(higher_defaults)) => {
                    if higher_defaults.concurrency.is_some() {
                        lower_defaults.concurrency = higher_defaults.concurrency;
                    }
                    if higher_defaults.timeout.is_some() {
                        lower_defaults.timeout = higher_defaults.timeout;
                    }
                    if higher_defaults.connect_timeout.is_some() {
                        lower_defaults.connect_timeout = higher_defaults.connect_timeout;
                    }
                    if higher_defaults.user_agent.is_some() {
                        lower_defaults.user_agent = higher_defaults.user_agent;
                    }
                    Some(lower_defaults)
                }
                (None, higher_defaults) => higher_defaults,
                (lower_defaults, None) => lower_defaults,
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), FetchError> {
        let Some(defaults) = &config.defaults else {
            return Ok(());
        };

        if defaults.concurrency == Some(0) {
            return Err(FetchError::config("Concurrency must be at least 1"));
        }

        for (name, value) in [
            ("timeout", &defaults.timeout),
            ("connect_timeout", &defaults.connect_timeout),
        ] {
            if let Some(value) = value {
                if parse_timeout_string(value).is_none() {
                    return Err(FetchError::config(format!(
                        "Invalid {} format '{}'. Use format like '5s', '30s', '2m'",
                        name, value
                    )));
                }
            }
        }

        if matches!(&defaults.user_agent, Some(ua) if ua.trim().is_empty()) {
            return Err(FetchError::config("user_agent cannot be empty"));
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub timeout: Option<String>,
    pub user_agent: Option<String>,
    pub file: Option<String>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Overlay the values set in the environment onto `config`.
    pub fn apply_to(&self, mut config: FetchConfig) -> FetchConfig {
        if let Some(concurrency) = self.concurrency {
            config.max_concurrency = concurrency;
        }
        if let Some(secs) = self.timeout.as_deref().and_then(parse_timeout_string) {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        config
    }
}

/// Load configuration from `URL_FETCH_*` environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok())
}

fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    if let Some(val) = lookup("URL_FETCH_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(concurrency) if concurrency > 0 => {
                env_config.concurrency = Some(concurrency);
                debug!("using URL_FETCH_CONCURRENCY={}", concurrency);
            }
            _ => warn!("invalid URL_FETCH_CONCURRENCY='{}', must be at least 1", val),
        }
    }

    if let Some(val) = lookup("URL_FETCH_TIMEOUT") {
        if parse_timeout_string(&val).is_some() {
            debug!("using URL_FETCH_TIMEOUT={}", val);
            env_config.timeout = Some(val);
        } else {
            warn!(
                "invalid URL_FETCH_TIMEOUT='{}', use format like '5s', '30s', '2m'",
                val
            );
        }
    }

    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    env_config.user_agent = non_empty("URL_FETCH_USER_AGENT");
    env_config.file = non_empty("URL_FETCH_FILE");
    env_config.config = non_empty("URL_FETCH_CONFIG");

    env_config
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
///
/// A bare number is taken as seconds. Zero and values that overflow
/// `u64` seconds are rejected.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let secs = if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        timeout_str.parse::<u64>().ok()
    }?;

    (secs > 0).then_some(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_parse_timeout_string() {
        assert_eq!(parse_timeout_string("5s"), Some(5));
        assert_eq!(parse_timeout_string("30s"), Some(30));
        assert_eq!(parse_timeout_string("2m"), Some(120));
        assert_eq!(parse_timeout_string("5"), Some(5));
        assert_eq!(parse_timeout_string("invalid"), None);
    }

    #[test]
    fn test_parse_timeout_string_rejects_overflow() {
        assert_eq!(parse_timeout_string("307445734561825861m"), None);
        assert_eq!(
            parse_timeout_string("307445734561825860m"),
            Some(307445734561825860 * 60)
        );
    }

    #[test]
    fn test_parse_timeout_string_rejects_zero() {
        assert_eq!(parse_timeout_string("0"), None);
        assert_eq!(parse_timeout_string("0s"), None);
        assert_eq!(parse_timeout_string("0m"), None);
    }

    #[test]
    fn test_zero_timeout_in_config_file_is_rejected() {
        let temp_file = write_config("[defaults]\ntimeout = \"0s\"\n");
        let err = ConfigManager::new().load_file(temp_file.path()).unwrap_err();
        assert!(matches!(err, FetchError::ConfigError { .. }));
    }

    #[test]
    fn test_load_valid_config() {
        let temp_file = write_config(
            r#"
[defaults]
concurrency = 16
timeout = "45s"
user_agent = "mirror-bot/1.0"
"#,
        );

        let manager = ConfigManager::new();
        let config = manager.load_file(temp_file.path()).unwrap();
        let defaults = config.defaults.clone().unwrap();
        assert_eq!(defaults.concurrency, Some(16));
        assert_eq!(defaults.timeout, Some("45s".to_string()));

        let fetch_config = config.apply_to(FetchConfig::default());
        assert_eq!(fetch_config.max_concurrency, 16);
        assert_eq!(fetch_config.timeout, Duration::from_secs(45));
        assert_eq!(fetch_config.user_agent, "mirror-bot/1.0");
    }

    #[test]
    fn test_invalid_concurrency() {
        let temp_file = write_config("[defaults]\nconcurrency = 0\n");
        let manager = ConfigManager::new();
        assert!(manager.load_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_invalid_timeout() {
        let temp_file = write_config("[defaults]\ntimeout = \"soon\"\n");
        let manager = ConfigManager::new();
        let err = manager.load_file(temp_file.path()).unwrap_err();
        assert!(matches!(err, FetchError::ConfigError { .. }));
    }

    #[test]
    fn test_missing_file() {
        let manager = ConfigManager::new();
        let err = manager.load_file("/no/such/url-fetch.toml").unwrap_err();
        assert!(matches!(err, FetchError::FileError { .. }));
    }

    #[test]
    fn test_merge_configs() {
        let manager = ConfigManager::new();

        let lower = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(4),
                timeout: Some("10s".to_string()),
                ..Default::default()
            }),
        };

        let higher = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(12),
                user_agent: Some("ua".to_string()),
                ..Default::default()
            }),
        };

        let merged = manager.merge_configs(lower, higher);
        let defaults = merged.defaults.unwrap();

        assert_eq!(defaults.concurrency, Some(12)); // Higher wins
        assert_eq!(defaults.timeout, Some("10s".to_string())); // Lower preserved
        assert_eq!(defaults.user_agent, Some("ua".to_string()));
    }

    #[test]
    fn test_env_config_parsing() {
        let vars: HashMap<&str, &str> = [
            ("URL_FETCH_CONCURRENCY", "6"),
            ("URL_FETCH_TIMEOUT", "1m"),
            ("URL_FETCH_USER_AGENT", "env-agent"),
            ("URL_FETCH_FILE", "  "),
        ]
        .into_iter()
        .collect();

        let env_config =
            load_env_config_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(env_config.concurrency, Some(6));
        assert_eq!(env_config.timeout, Some("1m".to_string()));
        assert_eq!(env_config.user_agent, Some("env-agent".to_string()));
        assert_eq!(env_config.file, None);

        let config = env_config.apply_to(FetchConfig::default());
        assert_eq!(config.max_concurrency, 6);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_env_config_ignores_invalid_values() {
        let vars: HashMap<&str, &str> = [
            ("URL_FETCH_CONCURRENCY", "0"),
            ("URL_FETCH_TIMEOUT", "later"),
        ]
        .into_iter()
        .collect();

        let env_config =
            load_env_config_from(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(env_config, EnvConfig::default());
    }
}
