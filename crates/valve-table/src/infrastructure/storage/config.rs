//! TOML-based configuration for the valve table host.
//!
//! Read from the platform-appropriate config file unless a path is given on
//! the command line:
//! - Windows:  `%APPDATA%\ValveTable\config.toml`
//! - Linux:    `~/.config/valvetable/config.toml`
//! - macOS:    `~/Library/Application Support/ValveTable/config.toml`
//!
//! Example:
//!
//! ```toml
//! [link]
//! endpoint = "/dev/ttyACM0"
//! baud_rate = 115200
//! data_line = 11
//!
//! [logging]
//! log_level = "debug"
//!
//! [worker]
//! queue_depth = 64
//! ```
//!
//! Every field has a default, so a missing file, a missing section, or a
//! missing key all fall back to the values shown above.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use valve_core::protocol::DEFAULT_DATA_LINE;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level host configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
}

/// Serial link settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkConfig {
    /// Serial device node (`/dev/ttyACM0`, `COM3`) or `tcp://host:port` for a
    /// network serial bridge.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Line speed the microcontroller expects.  Device nodes must be put in
    /// this mode before the host opens them (e.g. `stty -F <dev> 115200 raw`).
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Microcontroller pin the board chain's data line is wired to.
    #[serde(default = "default_data_line")]
    pub data_line: u8,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` filter: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`,
    /// or any `EnvFilter` directive.  `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Valve worker settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerConfig {
    /// Commands that may queue up before producers wait.
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_endpoint() -> String {
    "/dev/ttyACM0".to_string()
}
fn default_baud_rate() -> u32 {
    115_200
}
fn default_data_line() -> u8 {
    DEFAULT_DATA_LINE
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_queue_depth() -> usize {
    64
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            baud_rate: default_baud_rate(),
            data_line: default_data_line(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_depth: default_queue_depth(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(platform_config_dir()
        .ok_or(ConfigError::NoPlatformConfigDir)?
        .join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("ValveTable"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("valvetable"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("ValveTable")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
