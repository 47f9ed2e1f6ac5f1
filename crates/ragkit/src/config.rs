//! Client configuration and logging setup.

use ragkit_core::ChunkParams;
use ragkit_llm::LlmConfig;
use ragkit_search::SearchConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Top-level configuration for a [`crate::RagClient`].
///
/// Immutable for the duration of a request; reconfiguration swaps the
/// whole value atomically.
#[derive(Debug, Clone, Default)]
pub struct RagConfig {
    /// Provider credentials, models, and gateway behavior
    pub llm: LlmConfig,
    /// Default chunk window and overlap
    pub chunking: ChunkParams,
    /// Ranking and fusion parameters
    pub search: SearchConfig,
    /// Background worker pool size
    pub jobs: JobsConfig,
    /// Database connection settings for external stores
    pub database: DatabaseConfig,
    /// Log destination and level
    pub logging: LoggingConfig,
}

impl RagConfig {
    /// Configuration with credentials pulled from the environment.
    pub fn from_env() -> Self {
        Self {
            llm: LlmConfig::from_env(),
            database: DatabaseConfig::from_env(),
            ..Self::default()
        }
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Number of background workers
    pub workers: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

/// Connection settings for an external document store.
///
/// The in-memory store ignores these; implementations backed by a
/// database read the URL here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum severity: `debug`, `info`, `warn`, `error`
    pub level: String,
    /// Newline-delimited log records go here when set
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

/// Install the global tracing subscriber.
///
/// Stdout gets a compact layer; when a log file is configured, records
/// are also appended there newline-delimited without ANSI codes. Safe to
/// call once per process; later calls are ignored.
pub fn init_logging(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    let file_writer = config.file.as_ref().and_then(|path| {
        match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                let _ = LOG_GUARD.set(guard);
                Some(non_blocking)
            }
            Err(err) => {
                eprintln!("failed to open log file {}: {err}", path.display());
                None
            }
        }
    });

    let result = match file_writer {
        Some(writer) => {
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .compact();
            registry.with(file_layer).try_init()
        }
        None => registry.try_init(),
    };

    // A second init in the same process keeps the first subscriber.
    let _ = result;
}
