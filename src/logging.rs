use crate::settings::{AppSettings, DEFAULT_LOG_FILE_NAME};
use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError, RwLock};

const LOG_ROTATE_BYTES: u64 = 100 * 1024;
const APP_TARGET: &str = "oxide_mongo_admin";

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub level: LevelFilter,
    pub file_path: PathBuf,
}

impl LoggingConfig {
    pub fn new(enabled: bool, level: LevelFilter, file_path: PathBuf) -> Self {
        Self { enabled, level, file_path }
    }

    pub fn from_settings(settings: &AppSettings) -> Self {
        let trimmed = settings.logging_path.trim();
        let path = if trimmed.is_empty() {
            PathBuf::from(DEFAULT_LOG_FILE_NAME)
        } else {
            PathBuf::from(trimmed)
        };
        Self::new(settings.logging_enabled, settings.logging_level.to_level_filter(), path)
    }

    fn max_level(&self) -> LevelFilter {
        if self.enabled { self.level } else { LevelFilter::Off }
    }
}

struct FileState {
    path: PathBuf,
    file: Option<File>,
    size: u64,
}

impl FileState {
    fn open(path: PathBuf) -> io::Result<Self> {
        let (file, size) = open_log_file(&path, true)?;
        Ok(Self { path, file: Some(file), size })
    }

    fn rotate_if_needed(&mut self, next_len: u64) -> io::Result<()> {
        if self.size + next_len <= LOG_ROTATE_BYTES {
            return Ok(());
        }

        self.file = None;
        rotate_log_file(&self.path)?;
        let (file, _) = open_log_file(&self.path, false)?;
        self.file = Some(file);
        self.size = 0;
        Ok(())
    }

    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.rotate_if_needed(bytes.len() as u64)?;
        if let Some(file) = self.file.as_mut() {
            file.write_all(bytes)?;
            self.size = self.size.saturating_add(bytes.len() as u64);
        }
        Ok(())
    }
}

struct Logger {
    config: RwLock<LoggingConfig>,
    file_state: Mutex<Option<FileState>>,
}

impl Logger {
    fn new(config: LoggingConfig) -> Self {
        Self { config: RwLock::new(config), file_state: Mutex::new(None) }
    }

    fn config(&self) -> LoggingConfig {
        self.config.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_config(&self, config: LoggingConfig) {
        let mut guard = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let reopen = guard.file_path != config.file_path || guard.enabled != config.enabled;
        *guard = config;

        if reopen {
            *self.file_state.lock().unwrap_or_else(PoisonError::into_inner) = None;
        }
    }

    fn write_line(&self, line: &str, config: &LoggingConfig) {
        let _ = io::stderr().write_all(line.as_bytes());

        let mut guard = self.file_state.lock().unwrap_or_else(PoisonError::into_inner);
        let needs_open = !matches!(guard.as_ref(), Some(state) if state.path == config.file_path);
        if needs_open {
            *guard = FileState::open(config.file_path.clone()).ok();
        }

        let failed = match guard.as_mut() {
            Some(state) => state.append(line.as_bytes()).is_err(),
            None => false,
        };
        if failed {
            *guard = None;
        }
    }
}

fn is_app_target(target: &str) -> bool {
    target == APP_TARGET || target.starts_with("oxide_mongo_admin::")
}

fn format_line(record: &Record) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    format!(
        "{timestamp} [{level}] {target}: {message}\n",
        level = record.level(),
        target = record.target(),
        message = record.args()
    )
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let config = self.config();
        config.enabled && metadata.level() <= config.level && is_app_target(metadata.target())
    }

    fn log(&self, record: &Record) {
        let config = self.config();
        if !config.enabled || record.level() > config.level || !is_app_target(record.target()) {
            return;
        }
        self.write_line(&format_line(record), &config);
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

pub fn apply_settings(settings: &AppSettings) {
    let config = LoggingConfig::from_settings(settings);
    let max_level = config.max_level();
    let logger = LOGGER.get_or_init(|| Logger::new(config.clone()));
    logger.set_config(config);
    let _ = log::set_logger(logger);
    log::set_max_level(max_level);
}

fn open_log_file(path: &Path, append: bool) -> io::Result<(File, u64)> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file =
        OpenOptions::new().create(true).write(true).append(append).truncate(!append).open(path)?;
    let size = file.metadata().map(|meta| meta.len()).unwrap_or(0);
    Ok((file, size))
}

fn rotate_log_file(path: &Path) -> io::Result<()> {
    let rotated = rotated_log_path(path);
    if rotated.exists() {
        let _ = fs::remove_file(&rotated);
    }
    if path.exists() {
        fs::rename(path, rotated)?;
    }
    Ok(())
}

fn rotated_log_path(path: &Path) -> PathBuf {
    let file_name =
        path.file_name().and_then(|name| name.to_str()).unwrap_or(DEFAULT_LOG_FILE_NAME);
    path.with_file_name(format!("{file_name}.1"))
}
