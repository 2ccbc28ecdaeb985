use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SETTINGS_FILE_NAME: &str = "settings.toml";
pub const SETTINGS_PATH_ENV: &str = "OXIDE_MONGO_ADMIN_SETTINGS";
pub const DEFAULT_LOG_FILE_NAME: &str = "oxide_mongo_admin.log";
pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_BIND_HOST: &str = "127.0.0.1";
pub const DEFAULT_BIND_PORT: u16 = 8080;
pub const DEFAULT_BOOTSTRAP_COLLECTION: &str = "foo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const fn label(self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    pub const fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub mongo_uri: String,
    pub bind_host: String,
    pub bind_port: u16,
    /// Zero leaves the driver default in place.
    pub server_selection_timeout_secs: u64,
    /// Newline separated database names; when non-empty only these are listed.
    pub include_filter: String,
    /// Newline separated database names hidden from listings.
    pub exclude_filter: String,
    pub bootstrap_collection: String,
    pub logging_enabled: bool,
    pub logging_level: LogLevel,
    pub logging_path: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            mongo_uri: DEFAULT_MONGO_URI.to_string(),
            bind_host: DEFAULT_BIND_HOST.to_string(),
            bind_port: DEFAULT_BIND_PORT,
            server_selection_timeout_secs: 10,
            include_filter: String::new(),
            exclude_filter: String::new(),
            bootstrap_collection: DEFAULT_BOOTSTRAP_COLLECTION.to_string(),
            logging_enabled: true,
            logging_level: LogLevel::Info,
            logging_path: DEFAULT_LOG_FILE_NAME.to_string(),
        }
    }
}

impl AppSettings {
    pub fn normalize(&mut self) {
        if self.mongo_uri.trim().is_empty() {
            self.mongo_uri = DEFAULT_MONGO_URI.to_string();
        }
        if self.bind_host.trim().is_empty() {
            self.bind_host = DEFAULT_BIND_HOST.to_string();
        }
        if self.bootstrap_collection.trim().is_empty() {
            self.bootstrap_collection = DEFAULT_BOOTSTRAP_COLLECTION.to_string();
        }
        if self.logging_path.trim().is_empty() {
            self.logging_path = DEFAULT_LOG_FILE_NAME.to_string();
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host.trim(), self.bind_port)
    }

    pub fn server_selection_timeout(&self) -> Option<Duration> {
        match self.server_selection_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

#[derive(Debug)]
pub enum SettingsLoadError {
    Io(io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for SettingsLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsLoadError::Io(error) => write!(f, "I/O error: {}", error),
            SettingsLoadError::Parse(error) => write!(f, "Parse error: {}", error),
        }
    }
}

impl std::error::Error for SettingsLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsLoadError::Io(error) => Some(error),
            SettingsLoadError::Parse(error) => Some(error),
        }
    }
}

#[derive(Debug)]
pub enum SettingsSaveError {
    Io(io::Error),
    Serialize(toml::ser::Error),
}

impl fmt::Display for SettingsSaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsSaveError::Io(error) => write!(f, "I/O error: {}", error),
            SettingsSaveError::Serialize(error) => write!(f, "Serialize error: {}", error),
        }
    }
}

impl std::error::Error for SettingsSaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsSaveError::Io(error) => Some(error),
            SettingsSaveError::Serialize(error) => Some(error),
        }
    }
}

pub fn settings_path() -> PathBuf {
    match env::var(SETTINGS_PATH_ENV) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value.trim()),
        _ => PathBuf::from(SETTINGS_FILE_NAME),
    }
}

pub fn load_from_disk() -> Result<AppSettings, SettingsLoadError> {
    load_from_path(&settings_path())
}

pub fn load_from_path(path: &Path) -> Result<AppSettings, SettingsLoadError> {
    match fs::read_to_string(path) {
        Ok(contents) => parse(&contents),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            let mut settings = AppSettings::default();
            settings.normalize();
            Ok(settings)
        }
        Err(error) => Err(SettingsLoadError::Io(error)),
    }
}

pub fn parse(contents: &str) -> Result<AppSettings, SettingsLoadError> {
    toml::from_str::<AppSettings>(contents)
        .map(|mut settings| {
            settings.normalize();
            settings
        })
        .map_err(SettingsLoadError::Parse)
}

pub fn save_to_path(settings: &AppSettings, path: &Path) -> Result<(), SettingsSaveError> {
    let rendered = toml::to_string_pretty(settings).map_err(SettingsSaveError::Serialize)?;
    fs::write(path, rendered).map_err(SettingsSaveError::Io)
}
