//! Application configuration file support.
//!
//! The whole service is configured from one TOML file:
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [repository]
//! type = "local"
//! seed_file = "seed.json"
//!
//! [scheduler]
//! interval_minutes = 30
//! lookahead_minutes = 30
//!
//! [graph]
//! locations = ["A", "B", "C"]
//! edges = [{ from = "A", to = "B", distance = 2.0 }]
//! bidirectional = true
//! ```
//!
//! Every section except `[graph]` may be omitted.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::db::{RepositorySettings, RepositoryType};
use crate::graph::GraphConfig;
use crate::scheduler::{GeneratorParams, DEFAULT_BUS_CAPACITY, DEFAULT_BUS_SPEED_KMH};
use crate::services::SchedulerSettings;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "SCHEDULER_CONFIG";

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no scheduler.toml found (searched {searched:?})")]
    NotFound { searched: Vec<PathBuf> },

    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `[scheduler]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Minutes between the starts of two periodic cycles.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    /// Flights departing within this many minutes are fetched each cycle.
    #[serde(default = "default_lookahead_minutes")]
    pub lookahead_minutes: u64,
    /// Upper bound on each source/sink call.
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64,
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: u32,
    #[serde(default = "default_bus_speed_kmh")]
    pub bus_speed_kmh: f64,
    /// Finished cycles kept for the HTTP surface.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_interval_minutes() -> u64 {
    30
}

fn default_lookahead_minutes() -> u64 {
    30
}

fn default_io_timeout_secs() -> u64 {
    30
}

fn default_bus_capacity() -> u32 {
    DEFAULT_BUS_CAPACITY
}

fn default_bus_speed_kmh() -> f64 {
    DEFAULT_BUS_SPEED_KMH
}

fn default_history_limit() -> usize {
    50
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            lookahead_minutes: default_lookahead_minutes(),
            io_timeout_secs: default_io_timeout_secs(),
            bus_capacity: default_bus_capacity(),
            bus_speed_kmh: default_bus_speed_kmh(),
            history_limit: default_history_limit(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    pub graph: GraphConfig,
}

impl FromStr for AppConfig {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Relative `repository.seed_file` paths are resolved against the file's
    /// directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: AppConfig = content.parse().map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(seed) = config.repository.seed_file.take() {
            config.repository.seed_file = Some(match path.parent() {
                Some(dir) if seed.is_relative() => dir.join(seed),
                _ => seed,
            });
        }
        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `scheduler.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = vec![
            PathBuf::from("scheduler.toml"),
            PathBuf::from("backend/scheduler.toml"),
            PathBuf::from("../scheduler.toml"),
        ];

        for path in &search_paths {
            if path.exists() {
                return Self::from_file(path);
            }
        }

        Err(ConfigError::NotFound {
            searched: search_paths,
        })
    }

    /// Load from `$SCHEDULER_CONFIG` (or the default location), apply
    /// environment overrides and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::from_default_location()?,
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `HOST`, `PORT`, `REPOSITORY_TYPE` and `SCHEDULER_INTERVAL_MINUTES`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|var| std::env::var(var).ok())
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with an
    /// explicit variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv {
                    var: "PORT",
                    value: port.clone(),
                })?;
        }
        if let Some(repo_type) = lookup("REPOSITORY_TYPE") {
            RepositoryType::from_str(&repo_type).map_err(|_| ConfigError::InvalidEnv {
                var: "REPOSITORY_TYPE",
                value: repo_type.clone(),
            })?;
            self.repository.repo_type = repo_type;
        }
        if let Some(interval) = lookup("SCHEDULER_INTERVAL_MINUTES") {
            self.scheduler.interval_minutes =
                interval
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnv {
                        var: "SCHEDULER_INTERVAL_MINUTES",
                        value: interval.clone(),
                    })?;
        }
        Ok(())
    }

    /// Check value ranges. Graph consistency is checked when the graph is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scheduler = &self.scheduler;
        if scheduler.interval_minutes == 0 {
            return Err(invalid("scheduler.interval_minutes", "must be positive"));
        }
        if scheduler.lookahead_minutes == 0 {
            return Err(invalid("scheduler.lookahead_minutes", "must be positive"));
        }
        if scheduler.io_timeout_secs == 0 {
            return Err(invalid("scheduler.io_timeout_secs", "must be positive"));
        }
        if scheduler.history_limit == 0 {
            return Err(invalid("scheduler.history_limit", "must be positive"));
        }
        self.generator_params()
            .validate()
            .map_err(|e| invalid("scheduler", e.to_string()))?;
        if self.graph.locations.is_empty() {
            return Err(invalid("graph.locations", "at least one location is required"));
        }
        self.repository
            .repository_type()
            .map_err(|e| invalid("repository.type", e.to_string()))?;
        Ok(())
    }

    pub fn generator_params(&self) -> GeneratorParams {
        GeneratorParams {
            bus_capacity: self.scheduler.bus_capacity,
            bus_speed_kmh: self.scheduler.bus_speed_kmh,
        }
    }

    /// Runtime settings for the scheduler service.
    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            interval: Duration::from_secs(self.scheduler.interval_minutes.saturating_mul(60)),
            lookahead: i64::try_from(self.scheduler.lookahead_minutes)
                .ok()
                .and_then(chrono::TimeDelta::try_minutes)
                .unwrap_or(chrono::TimeDelta::MAX),
            io_timeout: Duration::from_secs(self.scheduler.io_timeout_secs),
            generator: self.generator_params(),
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;
    use std::collections::HashMap;

    const MINIMAL: &str = r#"
[graph]
locations = ["A", "B", "C"]
edges = [
    { from = "A", to = "B", distance = 2.0 },
    { from = "B", to = "C", distance = 5.0 },
]
bidirectional = true
"#;

    #[test]
    fn test_defaults_match_service_constants() {
        let config: AppConfig = MINIMAL.parse().unwrap();
        assert_eq!(config.server, ServerSettings::default());
        assert_eq!(config.scheduler.interval_minutes, 30);
        assert_eq!(config.scheduler.bus_capacity, 30);
        assert_eq!(config.scheduler.bus_speed_kmh, 45.0);
        assert_eq!(config.repository.repo_type, "local");
        assert_eq!(config.graph.locations.len(), 3);
        assert_eq!(config.graph.locations[0], Location::new("A"));
        config.validate().unwrap();
    }

    #[test]
    fn test_missing_graph_is_parse_error() {
        assert!("[server]\nport = 1".parse::<AppConfig>().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config: AppConfig = MINIMAL.parse().unwrap();
        config.scheduler.interval_minutes = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "scheduler.interval_minutes",
                ..
            })
        ));

        let mut config: AppConfig = MINIMAL.parse().unwrap();
        config.scheduler.bus_capacity = 0;
        assert!(config.validate().is_err());

        let mut config: AppConfig = MINIMAL.parse().unwrap();
        config.graph.locations.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("SCHEDULER_INTERVAL_MINUTES", "5"),
        ]
        .into_iter()
        .collect();

        let mut config: AppConfig = MINIMAL.parse().unwrap();
        config
            .apply_overrides_from(|var| vars.get(var).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.scheduler.interval_minutes, 5);
    }

    #[test]
    fn test_bad_override_is_reported() {
        let mut config: AppConfig = MINIMAL.parse().unwrap();
        let err = config
            .apply_overrides_from(|var| (var == "PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "PORT", .. }));

        let err = config
            .apply_overrides_from(|var| (var == "REPOSITORY_TYPE").then(|| "sqlite".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                var: "REPOSITORY_TYPE",
                ..
            }
        ));
    }

    #[test]
    fn test_from_file_resolves_seed_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scheduler.toml");
        fs::write(
            &path,
            format!("[repository]\nseed_file = \"seed.json\"\n{}", MINIMAL),
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(
            config.repository.seed_file,
            Some(dir.path().join("seed.json"))
        );
    }

    #[test]
    fn test_from_file_missing() {
        let err = AppConfig::from_file("/nonexistent/scheduler.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_scheduler_settings_conversion() {
        let config: AppConfig = MINIMAL.parse().unwrap();
        let settings = config.scheduler_settings();
        assert_eq!(settings.interval, Duration::from_secs(30 * 60));
        assert_eq!(settings.lookahead, chrono::TimeDelta::minutes(30));
        assert_eq!(settings.io_timeout, Duration::from_secs(30));
        assert_eq!(settings.generator, GeneratorParams::default());
    }
}
