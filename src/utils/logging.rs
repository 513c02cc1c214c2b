use std::fmt;
use std::fmt::Write;
use std::path::PathBuf;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::Layer as FmtLayer;
use tracing_subscriber::{prelude::*, registry::Registry, EnvFilter};

use super::app_config::config;
use super::error::Result;

pub mod prelude {
    pub use tracing::{debug, error, info, trace, warn};
    pub use tracing::{debug_span, error_span, info_span, trace_span, warn_span};
    pub use tracing::{event, instrument, span};
}

/// This needs to be held in main
pub struct GlobalLoggingContext {
    _worker_guards: Vec<WorkerGuard>,
}

/// Install the global subscriber according to the `logging` config section.
/// Call after the configuration is merged so file targets can be configured.
pub fn setup() -> Result<GlobalLoggingContext> {
    let cfg: LoggingConfig = config().get("logging").unwrap_or_default();

    let mut guards = Vec::new();

    let (term_writer, guard) = non_blocking(std::io::stderr());
    guards.push(guard);
    let term = FmtLayer::default()
        .with_ansi(true)
        .with_target(false)
        .with_timer(ISOTimeFormat)
        .with_writer(term_writer);

    let file = cfg.file.as_ref().map(|out| {
        let appender = RollingFileAppender::new(Rotation::NEVER, &out.directory, &out.name);
        let (writer, guard) = non_blocking(appender);
        guards.push(guard);
        FmtLayer::default()
            .with_ansi(false)
            .with_target(false)
            .with_timer(ISOTimeFormat)
            .with_writer(writer)
    });

    Registry::default()
        .with(cfg.to_env_filter())
        .with(term)
        .with(file)
        .try_init()?;

    Ok(GlobalLoggingContext { _worker_guards: guards })
}

fn non_blocking(writer: impl std::io::Write + Send + Sync + 'static) -> (NonBlocking, WorkerGuard) {
    tracing_appender::non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(writer)
}

struct ISOTimeFormat;

impl FormatTime for ISOTimeFormat {
    fn format_time(&self, w: &mut dyn Write) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

// ====== Logging Config ======

#[derive(Debug, serde::Deserialize)]
struct LoggingConfig {
    #[serde(default)]
    directives: Option<String>,
    #[serde(default)]
    file: Option<FileOutput>,
}

#[derive(Debug, serde::Deserialize)]
struct FileOutput {
    directory: PathBuf,
    name: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directives: Some("info".into()),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// RUST_LOG wins over the configured directives
    fn to_env_filter(&self) -> EnvFilter {
        if std::env::var(EnvFilter::DEFAULT_ENV).is_ok() {
            return EnvFilter::from_default_env();
        }
        match &self.directives {
            Some(dirs) => EnvFilter::new(dirs),
            None => EnvFilter::new("info"),
        }
    }
}
