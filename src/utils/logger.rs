// utils/logger.rs
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use chrono::Local;
use log::info;

use crate::config::subsystems::LoggingConfig;
use crate::error::Result;

/// Installs the global `env_logger` for a binary.
///
/// Records go to `<log_dir>/<program>_<timestamp>.log` when a log directory
/// is configured and to stderr otherwise. Returns the log file path, if any.
pub fn init_logging(config: &LoggingConfig, program: &str) -> Result<Option<PathBuf>> {
    let mut builder = env_logger::Builder::new();
    builder
        .format(|buf, record| {
            writeln!(buf,
                "{} [{}] {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter(None, config.get_log_level());

    let log_path = match &config.log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let timestamp = Local::now().format("%Y%m%d_%H%M%S");
            let path = dir.join(format!("{}_{}.log", program, timestamp));
            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            builder.target(env_logger::Target::Pipe(Box::new(log_file)));
            Some(path)
        },
        None => {
            builder.target(env_logger::Target::Stderr);
            None
        }
    };

    builder.init();

    info!("{} starting with log level {:?}", program, config.get_log_level());
    Ok(log_path)
}
