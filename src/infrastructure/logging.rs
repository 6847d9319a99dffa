//! Logging system configuration and initialization
//!
//! - Console and/or daily-rotated file output
//! - Optional JSON formatting
//! - Level from config, overridable with `RUST_LOG`
//! - UTC timestamps

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use chrono::Utc;
use once_cell::sync::Lazy;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "product-scraper.log";

/// Dependency targets capped below `trace`
const NOISY_TARGETS: [(&str, &str); 7] = [
    ("sqlx", "warn"),
    ("reqwest", "info"),
    ("hyper", "warn"),
    ("hyper_util", "warn"),
    ("h2", "warn"),
    ("html5ever", "warn"),
    ("selectors", "warn"),
];

// Keeps the non-blocking file writers alive for the life of the process
static LOG_GUARDS: Lazy<Mutex<Vec<WorkerGuard>>> = Lazy::new(|| Mutex::new(Vec::new()));

struct UtcTimeFormatter;

impl FormatTime for UtcTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"))
    }
}

/// Configured log directory, `./logs` by default
pub fn get_log_directory(config: &LoggingConfig) -> PathBuf {
    config
        .log_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Filter from `RUST_LOG`, or from the configured level with noisy targets capped
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;

    if !config.level.to_lowercase().contains("trace") {
        for (target, level) in NOISY_TARGETS {
            filter = filter.add_directive(format!("{target}={level}").parse()?);
        }
    }

    for (module, level) in &config.module_filters {
        filter = filter.add_directive(format!("{module}={level}").parse()?);
    }

    Ok(filter)
}

/// Initialize logging with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(LoggingConfig::default())
}

/// Initialize logging with custom configuration.
///
/// Fails when neither console nor file output is enabled, or when a global
/// subscriber is already installed.
pub fn init_logging_with_config(config: LoggingConfig) -> Result<()> {
    if !config.console_output && !config.file_output {
        return Err(anyhow!("No logging output configured"));
    }

    let env_filter = build_env_filter(&config)?;
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if config.console_output {
        let console_layer = fmt::Layer::new()
            .with_writer(std::io::stdout)
            .with_timer(UtcTimeFormatter)
            .with_target(false);
        layers.push(if config.json_format {
            console_layer.json().boxed()
        } else {
            console_layer.boxed()
        });
    }

    let log_dir = get_log_directory(&config);
    if config.file_output {
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

        let (file_writer, file_guard) = non_blocking(rolling::daily(&log_dir, LOG_FILE_PREFIX));
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("Log guard registry poisoned"))?
            .push(file_guard);

        let file_layer = fmt::Layer::new()
            .with_writer(file_writer)
            .with_timer(UtcTimeFormatter)
            .with_ansi(false);
        layers.push(if config.json_format {
            file_layer
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .boxed()
        } else {
            file_layer.with_target(false).boxed()
        });
    }

    Registry::default()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    info!("JSON format: {}", config.json_format);
    info!("Console output: {}", config.console_output);
    if config.file_output {
        info!("File output: {:?}", log_dir);
    }

    Ok(())
}
