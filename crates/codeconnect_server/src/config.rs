//! Server configuration with layered loading.
//!
//! # Load Order
//!
//! 1. Default values (compile-time)
//! 2. TOML file (optional, `--config` / `CODECONNECT_CONFIG`)
//! 3. Environment variables (`CODECONNECT_*`)
//! 4. Explicit overrides (command-line flags)
//!
//! Each layer overrides the previous. Every layer is a [`ConfigLayer`] and
//! goes through the same validation.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const ENV_LISTEN: &str = "CODECONNECT_LISTEN";
pub const ENV_STORE: &str = "CODECONNECT_STORE";
pub const ENV_SQLITE_PATH: &str = "CODECONNECT_SQLITE_PATH";
pub const ENV_LOG_LEVEL: &str = "CODECONNECT_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CODECONNECT_LOG_DIR";
pub const ENV_LOG_STDERR: &str = "CODECONNECT_LOG_STDERR";

const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
const DEFAULT_SQLITE_PATH: &str = "codeconnect.sqlite3";

/// Which `ResourceStore` implementation the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in_memory" => Some(Self::Memory),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// Fully resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub store: StoreBackend,
    /// Database file, used only by the sqlite backend.
    pub sqlite_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
    /// Duplicate `info` and above to stderr.
    pub echo_stderr: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
            store: StoreBackend::Memory,
            sqlite_path: PathBuf::from(DEFAULT_SQLITE_PATH),
            log_level: codeconnect_core::default_log_level().to_string(),
            log_dir: std::env::temp_dir().join("codeconnect").join("logs"),
            echo_stderr: true,
        }
    }
}

impl ServerConfig {
    /// Applies one layer on top of the current values.
    ///
    /// Nothing is changed when any field of `layer` is invalid.
    pub fn apply(&mut self, layer: &ConfigLayer, origin: &str) -> Result<(), ConfigError> {
        let mut next = self.clone();

        if let Some(listen) = &layer.listen {
            next.listen = listen.trim().parse().map_err(|_| {
                ConfigError::invalid_value(
                    origin,
                    "listen",
                    format!("expected host:port such as {DEFAULT_LISTEN}"),
                )
            })?;
        }
        if let Some(store) = &layer.store {
            next.store = StoreBackend::parse(store).ok_or_else(|| {
                ConfigError::invalid_value(origin, "store", "expected memory|sqlite")
            })?;
        }
        if let Some(path) = &layer.sqlite_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::invalid_value(
                    origin,
                    "sqlite_path",
                    "cannot be empty",
                ));
            }
            next.sqlite_path = path.clone();
        }
        if let Some(level) = &layer.log_level {
            next.log_level = normalize_level(level).ok_or_else(|| {
                ConfigError::invalid_value(
                    origin,
                    "log_level",
                    "expected trace|debug|info|warn|error",
                )
            })?;
        }
        if let Some(dir) = &layer.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::invalid_value(
                    origin,
                    "log_dir",
                    format!("must be an absolute path, got `{}`", dir.display()),
                ));
            }
            next.log_dir = dir.clone();
        }
        if let Some(echo) = layer.echo_stderr {
            next.echo_stderr = echo;
        }

        *self = next;
        Ok(())
    }

    pub fn logging_options(&self) -> codeconnect_core::LoggingOptions {
        let mut options = codeconnect_core::LoggingOptions::new(&self.log_level, &self.log_dir);
        options.echo_stderr = self.echo_stderr;
        options
    }
}

/// A partial set of settings from one source.
///
/// Also the TOML file schema; unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub listen: Option<String>,
    pub store: Option<String>,
    pub sqlite_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub echo_stderr: Option<bool>,
}

impl ConfigLayer {
    /// Reads `CODECONNECT_*` variables through `lookup`.
    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let echo_stderr = match lookup(ENV_LOG_STDERR) {
            Some(value) => Some(
                parse_bool(&value)
                    .ok_or_else(|| ConfigError::invalid_env_var(ENV_LOG_STDERR, "expected bool"))?,
            ),
            None => None,
        };

        Ok(Self {
            listen: lookup(ENV_LISTEN),
            store: lookup(ENV_STORE),
            sqlite_path: lookup(ENV_SQLITE_PATH).map(PathBuf::from),
            log_level: lookup(ENV_LOG_LEVEL),
            log_dir: lookup(ENV_LOG_DIR).map(PathBuf::from),
            echo_stderr,
        })
    }
}

/// Configuration loader with builder pattern.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    overrides: ConfigLayer,
    skip_env: bool,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a TOML file as the first layer above defaults.
    ///
    /// A missing file is an error; the file is opt-in.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Sets the topmost layer, typically built from command-line flags.
    #[must_use]
    pub fn with_overrides(mut self, overrides: ConfigLayer) -> Self {
        self.overrides = overrides;
        self
    }

    /// Skips environment variable loading.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    pub fn load(&self) -> Result<ServerConfig, ConfigError> {
        let mut config = ServerConfig::default();

        if let Some(path) = &self.file {
            let layer = load_file(path)?;
            config.apply(&layer, &path.display().to_string())?;
        }
        if !self.skip_env {
            let layer = ConfigLayer::from_env_with(|name| std::env::var(name).ok())?;
            config.apply(&layer, "environment")?;
        }
        config.apply(&self.overrides, "command line")?;

        Ok(config)
    }
}

fn load_file(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

fn normalize_level(level: &str) -> Option<String> {
    let level = match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => return None,
    };
    Some(level.to_string())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration loading failures.
#[derive(Debug)]
pub enum ConfigError {
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidEnvVar {
        name: String,
        message: String,
    },
    InvalidValue {
        origin: String,
        key: &'static str,
        message: String,
    },
}

impl ConfigError {
    pub fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_value(
        origin: impl Into<String>,
        key: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            origin: origin.into(),
            key,
            message: message.into(),
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {source}", path.display())
            }
            Self::ParseToml { path, source } => {
                write!(f, "failed to parse config file '{}': {source}", path.display())
            }
            Self::InvalidEnvVar { name, message } => {
                write!(f, "invalid value for environment variable '{name}': {message}")
            }
            Self::InvalidValue {
                origin,
                key,
                message,
            } => write!(f, "invalid `{key}` from {origin}: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseToml { source, .. } => Some(source),
            Self::InvalidEnvVar { .. } | Self::InvalidValue { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("codeconnect.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn load_defaults_only() {
        let config = ConfigLoader::new().skip_env_vars().load().unwrap();

        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.store, StoreBackend::Memory);
        assert!(config.log_dir.is_absolute());
    }

    #[test]
    fn file_then_overrides() {
        let dir = TempDir::new().unwrap();
        let log_dir = dir.path().join("logs");
        let path = write_config(
            &dir,
            &format!(
                "listen = \"0.0.0.0:9000\"\nstore = \"sqlite\"\nlog_dir = {:?}\necho_stderr = false\n",
                log_dir.display().to_string()
            ),
        );

        let config = ConfigLoader::new()
            .with_file(&path)
            .skip_env_vars()
            .with_overrides(ConfigLayer {
                listen: Some("127.0.0.1:7000".to_string()),
                log_level: Some("WARNING".to_string()),
                ..ConfigLayer::default()
            })
            .load()
            .unwrap();

        assert_eq!(config.listen, "127.0.0.1:7000".parse().unwrap());
        assert_eq!(config.store, StoreBackend::Sqlite);
        assert_eq!(config.log_dir, log_dir);
        assert_eq!(config.log_level, "warn");
        assert!(!config.echo_stderr);
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "port = 80\n");

        let err = ConfigLoader::new()
            .with_file(&path)
            .skip_env_vars()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = ConfigLoader::new()
            .with_file(dir.path().join("absent.toml"))
            .skip_env_vars()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn invalid_layer_leaves_config_unchanged() {
        let mut config = ServerConfig::default();
        let before = config.clone();

        let err = config
            .apply(
                &ConfigLayer {
                    store: Some("sqlite".to_string()),
                    log_dir: Some(PathBuf::from("relative/logs")),
                    ..ConfigLayer::default()
                },
                "test",
            )
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidValue { key: "log_dir", .. }));
        assert_eq!(config, before);
    }

    #[test]
    fn env_layer_reads_known_variables() {
        let vars: HashMap<&str, &str> = [
            (ENV_STORE, "SQLite"),
            (ENV_SQLITE_PATH, "/tmp/cc.sqlite3"),
            (ENV_LOG_STDERR, "off"),
        ]
        .into_iter()
        .collect();

        let layer =
            ConfigLayer::from_env_with(|name| vars.get(name).map(|value| value.to_string()))
                .unwrap();
        let mut config = ServerConfig::default();
        config.apply(&layer, "environment").unwrap();

        assert_eq!(config.store, StoreBackend::Sqlite);
        assert_eq!(config.sqlite_path, PathBuf::from("/tmp/cc.sqlite3"));
        assert!(!config.echo_stderr);
    }

    #[test]
    fn env_layer_rejects_bad_bool() {
        let err = ConfigLayer::from_env_with(|name| {
            (name == ENV_LOG_STDERR).then(|| "maybe".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { .. }));
    }

    #[test]
    fn store_backend_parse() {
        assert_eq!(StoreBackend::parse(" Memory "), Some(StoreBackend::Memory));
        assert_eq!(StoreBackend::parse("sqlite"), Some(StoreBackend::Sqlite));
        assert_eq!(StoreBackend::parse("postgres"), None);
        assert_eq!(StoreBackend::Sqlite.as_str(), "sqlite");
    }
}
