pub mod tunables;

pub use tunables::ServerTunables;

use crate::error::config::ConfigError;

use models::{ServerKind, ServerSpec, ServerSpecBuilder, TextEncoding};

use std::path::{Path, PathBuf};
use std::time::Duration;

use const_format::concatcp;
use log::{info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "station.json";
const CONFIG_VERSION: u32 = 1;

const DATA_ROOT: &str = "./data/";
const SENSOR_DATA_DIR: &str = concatcp!(DATA_ROOT, "sensor_data/");
const LOG_DATA_DIR: &str = concatcp!(DATA_ROOT, "log_data/");

// ============================================
// CONFIG STRUCTS
// ============================================

/// Per-server listening settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerSettings {
    pub port: u16,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Where the handler persists. Ignored by the time server.
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StationConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_encoding")]
    pub encoding: String,

    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,

    #[serde(default = "default_max_conn")]
    pub max_conn: usize,

    #[serde(default = "default_data_server")]
    pub data: ServerSettings,

    #[serde(default = "default_time_server")]
    pub time: ServerSettings,

    #[serde(default = "default_log_server")]
    pub log: ServerSettings,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            host: default_host(),
            encoding: default_encoding(),
            logs_dir: default_logs_dir(),
            max_conn: default_max_conn(),
            data: default_data_server(),
            time: default_time_server(),
            log: default_log_server(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_encoding() -> String {
    TextEncoding::default().label().to_string()
}
fn default_logs_dir() -> PathBuf {
    PathBuf::from("./logs/")
}
fn default_max_conn() -> usize {
    10
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_data_server() -> ServerSettings {
    ServerSettings {
        port: 13000,
        timeout_secs: default_timeout_secs(),
        storage_dir: Some(PathBuf::from(SENSOR_DATA_DIR)),
    }
}
fn default_time_server() -> ServerSettings {
    ServerSettings {
        port: 13001,
        timeout_secs: default_timeout_secs(),
        storage_dir: None,
    }
}
fn default_log_server() -> ServerSettings {
    ServerSettings {
        port: 13002,
        timeout_secs: default_timeout_secs(),
        storage_dir: Some(PathBuf::from(LOG_DATA_DIR)),
    }
}

// ============================================
// IMPLEMENTATION
// ============================================

impl StationConfig {
    /// Load config from `{config_dir}/station.json`.
    ///
    /// A missing file yields defaults. A file that exists but cannot be read,
    /// parsed or validated is an error.
    #[track_caller]
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {e}");
            ConfigError::read(&config_path, e)
        })?;

        let config: StationConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {e}");
            ConfigError::parse(&config_path, e)
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to `{config_dir}/station.json` via temp file + rename.
    #[track_caller]
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::write(config_dir, e))?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{CONFIG_FILE_NAME}.tmp"));

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::write(&config_path, e.into()))?;
        std::fs::write(&temp_path, json).map_err(|e| ConfigError::write(&temp_path, e))?;
        std::fs::rename(&temp_path, &config_path)
            .map_err(|e| ConfigError::write(&config_path, e))?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] naming the first bad setting, in
    /// the dotted form used by `station.json` (`data.port`).
    #[track_caller]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::invalid(
                "version",
                format!("{} is not between 1 and {CONFIG_VERSION}", self.version),
            ));
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::invalid("host", "cannot be empty"));
        }

        if self.max_conn == 0 {
            return Err(ConfigError::invalid("max_conn", "must be at least 1"));
        }

        TextEncoding::from_label(&self.encoding).map_err(|e| {
            ConfigError::invalid("encoding", format!("'{}': {e}", self.encoding))
        })?;

        let mut seen_ports = Vec::with_capacity(ServerKind::ALL.len());
        for kind in ServerKind::ALL {
            let settings = self.settings(kind);
            if settings.port == 0 {
                return Err(ConfigError::invalid(format!("{kind}.port"), "cannot be 0"));
            }
            if seen_ports.contains(&settings.port) {
                return Err(ConfigError::invalid(
                    format!("{kind}.port"),
                    format!("{} is already used by another server", settings.port),
                ));
            }
            seen_ports.push(settings.port);

            if settings.timeout_secs == 0 {
                return Err(ConfigError::invalid(
                    format!("{kind}.timeout_secs"),
                    "must be positive",
                ));
            }
            if kind.needs_storage() && settings.storage_dir.is_none() {
                return Err(ConfigError::invalid(
                    format!("{kind}.storage_dir"),
                    "is required for this server",
                ));
            }
        }

        Ok(())
    }

    pub fn settings(&self, kind: ServerKind) -> &ServerSettings {
        match kind {
            ServerKind::Data => &self.data,
            ServerKind::Time => &self.time,
            ServerKind::Log => &self.log,
        }
    }

    /// Build the validated [`ServerSpec`] for one server of this station.
    #[track_caller]
    pub fn server_spec(
        &self,
        kind: ServerKind,
        log_console: bool,
        debug: bool,
    ) -> Result<ServerSpec, ConfigError> {
        let settings = self.settings(kind);
        let encoding = TextEncoding::from_label(&self.encoding)
            .map_err(|e| ConfigError::invalid("encoding", e.to_string()))?;

        let mut builder = ServerSpecBuilder::default()
            .with_kind(kind)
            .with_timeout(Duration::from_secs(settings.timeout_secs))
            .with_max_conn(self.max_conn)
            .with_encoding(encoding)
            .with_logs_dir(&self.logs_dir)
            .with_log_console(log_console)
            .with_debug(debug);

        if let Some(dir) = &settings.storage_dir {
            builder = builder.with_storage_dir(dir);
        }

        builder
            .build()
            .map_err(|e| ConfigError::invalid(kind.as_str(), e.to_string()))
    }
}
