use crate::config::Settings;
use crate::error::{GateError, Result};
use simplelog::*;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

/// `$HOME/.local/share/phasorgate/logs/app.log`
pub fn default_log_path() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| GateError::Logging("HOME environment variable not set".to_string()))?;

    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("phasorgate")
        .join("logs")
        .join("app.log"))
}

/// Installs the file logger. The console belongs to the status display, so
/// nothing is logged to the terminal.
pub fn init_logger(settings: &Settings) -> Result<()> {
    let level = settings.level_filter()?;
    let log_path = match &settings.log_file {
        Some(path) => path.clone(),
        None => default_log_path()?,
    };

    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir)?;
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let config = ConfigBuilder::new()
        .set_thread_level(LevelFilter::Error)
        .build();

    CombinedLogger::init(vec![WriteLogger::new(level, config, log_file)])
        .map_err(|e| GateError::Logging(e.to_string()))
}
