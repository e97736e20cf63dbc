//! Configuration management for msh.
use regex::Regex;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use crate::{
    constants::{
        DEFAULT_CONFIG_FILES, DEFAULT_STOP_COMMAND, SHUTDOWN_GRACE, UPDATE_CHECK_INTERVAL,
        UPDATE_ENDPOINT, UPDATE_NOTIFY_INTERVAL,
    },
    error::ConfigError,
};

/// Represents the structure of the configuration file.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Configuration version.
    pub version: String,
    /// The server process msh fronts.
    pub server: ServerConfig,
    /// Daemon-wide switches.
    #[serde(default)]
    pub msh: MshConfig,
    /// Self-update checking.
    #[serde(default)]
    pub update: UpdateConfig,
    /// Forced shutdown tuning.
    #[serde(default)]
    pub shutdown: ShutdownConfig,
    /// Root directory from which relative paths are resolved.
    pub project_dir: Option<String>,
}

/// Configuration for the fronted server process.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Command used to start the server, run through `sh -c`.
    pub command: String,
    /// Console command that makes the server shut itself down.
    pub stop_command: Option<String>,
    /// Directory the server runs in.
    pub working_dir: Option<String>,
    /// Output fragment marking the server as online; online right after spawn when unset.
    pub ready_pattern: Option<String>,
}

impl ServerConfig {
    pub fn stop_command(&self) -> &str {
        self.stop_command.as_deref().unwrap_or(DEFAULT_STOP_COMMAND)
    }

    /// Resolves the working directory against a base directory.
    pub fn working_dir(&self, base: &Path) -> PathBuf {
        match &self.working_dir {
            Some(dir) => {
                let path = Path::new(dir);
                if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    base.join(path)
                }
            }
            None => base.to_path_buf(),
        }
    }
}

/// Daemon-wide switches.
#[derive(Debug, Deserialize, Clone)]
pub struct MshConfig {
    /// Whether update outcomes are printed and broadcast in game.
    #[serde(default = "default_true")]
    pub notify_update: bool,
}

impl Default for MshConfig {
    fn default() -> Self {
        Self {
            notify_update: true,
        }
    }
}

/// Self-update checking.
#[derive(Debug, Deserialize, Clone)]
pub struct UpdateConfig {
    /// Whether the update poller runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Override for the version endpoint.
    pub endpoint: Option<String>,
    /// Period between checks, e.g. `4h`.
    pub check_interval: Option<String>,
    /// Period between in-game notifications, e.g. `20m`.
    pub notify_interval: Option<String>,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            check_interval: None,
            notify_interval: None,
        }
    }
}

impl UpdateConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(UPDATE_ENDPOINT)
    }

    pub fn check_interval(&self) -> Result<Duration, ConfigError> {
        duration_or(self.check_interval.as_deref(), UPDATE_CHECK_INTERVAL)
    }

    pub fn notify_interval(&self) -> Result<Duration, ConfigError> {
        duration_or(self.notify_interval.as_deref(), UPDATE_NOTIFY_INTERVAL)
    }
}

/// Forced shutdown tuning.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ShutdownConfig {
    /// Time granted to the server to enter its stopping state, e.g. `1s`.
    pub grace: Option<String>,
}

impl ShutdownConfig {
    pub fn grace(&self) -> Result<Duration, ConfigError> {
        duration_or(self.grace.as_deref(), SHUTDOWN_GRACE)
    }
}

fn default_true() -> bool {
    true
}

/// Runtime toggle deciding whether update notifications reach the user.
///
/// Cloned handles share the same flag, so a reload flipping it is seen by the
/// poller on its next cycle.
#[derive(Debug, Clone)]
pub struct NotificationGate(Arc<AtomicBool>);

impl NotificationGate {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::SeqCst);
    }
}

impl From<&Config> for NotificationGate {
    fn from(config: &Config) -> Self {
        Self::new(config.msh.notify_update)
    }
}

/// Parses a user-facing duration string in the format `<number>[ms|s|m|h]`.
pub fn parse_duration(raw: &str) -> Result<Duration, ConfigError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ConfigError::InvalidDuration(raw.to_string()));
    }

    if let Some(stripped) = value.strip_suffix("ms") {
        let millis: u64 = stripped
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidDuration(raw.to_string()))?;
        return Ok(Duration::from_millis(millis));
    }

    let (amount_str, multiplier) = if let Some(stripped) = value.strip_suffix('s') {
        (stripped.trim(), 1)
    } else if let Some(stripped) = value.strip_suffix('m') {
        (stripped.trim(), 60)
    } else if let Some(stripped) = value.strip_suffix('h') {
        (stripped.trim(), 3600)
    } else {
        (value, 1)
    };

    let amount: u64 = amount_str
        .parse()
        .map_err(|_| ConfigError::InvalidDuration(raw.to_string()))?;

    Ok(Duration::from_secs(amount.saturating_mul(multiplier)))
}

fn duration_or(raw: Option<&str>, default: Duration) -> Result<Duration, ConfigError> {
    raw.map(parse_duration).unwrap_or(Ok(default))
}

/// Expands `${VAR}` references within a string. Bare `$VAR` is left for the
/// server's shell.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();

    if let Some(missing) = re
        .captures_iter(input)
        .map(|caps| caps[1].to_string())
        .find(|name| env::var(name).is_err())
    {
        return Err(ConfigError::MissingEnvVar(missing));
    }

    let result = re.replace_all(input, |caps: &regex::Captures| {
        env::var(&caps[1]).unwrap_or_default()
    });
    Ok(result.to_string())
}

fn default_config_path() -> Result<&'static Path, ConfigError> {
    DEFAULT_CONFIG_FILES
        .into_iter()
        .map(Path::new)
        .find(|path| path.exists())
        .ok_or_else(|| ConfigError::NotFound(DEFAULT_CONFIG_FILES.join(", ")))
}

/// Loads and parses the configuration file, expanding environment variables.
pub fn load_config(config_path: Option<&str>) -> Result<Config, ConfigError> {
    let config_path = match config_path {
        Some(path) => Path::new(path),
        None => default_config_path()?,
    };

    let content = fs::read_to_string(config_path).map_err(|e| {
        ConfigError::Read(std::io::Error::new(
            e.kind(),
            format!("{} ({})", e, config_path.display()),
        ))
    })?;

    let expanded_content = expand_env_vars(&content)?;
    let mut config: Config = serde_yaml::from_str(&expanded_content)?;

    let base_path = config_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    config.project_dir = Some(base_path.to_string_lossy().to_string());

    // Surface bad durations at load time rather than inside a background thread.
    config.update.check_interval()?;
    config.update.notify_interval()?;
    config.shutdown.grace()?;

    Ok(config)
}
