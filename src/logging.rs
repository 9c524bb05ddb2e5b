use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "./logs/media-reaper.log";

/// Where and how much to log, read from `TRACING_LEVEL` and `LOG_FILE_PATH`.
#[derive(Debug, PartialEq, Eq)]
struct LogSettings {
    filter: String,
    directory: PathBuf,
    file_name: OsString,
}

impl LogSettings {
    fn from_env() -> Self {
        Self::new(env::var("TRACING_LEVEL").ok(), env::var("LOG_FILE_PATH").ok())
    }

    fn new(filter: Option<String>, log_file: Option<String>) -> Self {
        let log_file = PathBuf::from(log_file.unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()));
        let directory = match log_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = log_file
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| OsString::from("media-reaper.log"));

        Self {
            filter: filter.unwrap_or_else(|| "info".to_string()),
            directory,
            file_name,
        }
    }

    fn log_file(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Pretty stdout plus a plain log file. Every retention pass runs inside a
/// `pass` span, so lines carry their cleanup and library type and the file
/// also records how long each pass took.
///
/// Keep the returned guard alive until exit or buffered file lines are lost.
pub fn init_logger() -> WorkerGuard {
    let settings = LogSettings::from_env();
    let file_appender = tracing_appender::rolling::never(&settings.directory, &settings.file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_file(false)
                .pretty()
                .without_time()
                .with_ansi(true),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE),
        )
        // `TRACING_LEVEL` accepts any EnvFilter directive, e.g. "media_reaper=debug"
        .with(EnvFilter::new(&settings.filter))
        .init();

    info!("Logging to stdout and {}", settings.log_file().display());

    guard
}
