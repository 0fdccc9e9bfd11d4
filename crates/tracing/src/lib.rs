//! Logging setup for the blobtx binaries.

use dotenvy::dotenv;
use std::{env, fmt::Debug, io::stdout, str::FromStr};
use strum::EnumString;
use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    filter::LevelFilter, fmt, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

const ENV_LOG_FILE: &str = "BLOBTX_LOG_FILE";
const ENV_LOG_DIR: &str = "BLOBTX_LOG_DIR";
const ENV_LOG_FORMAT_FILE: &str = "BLOBTX_LOG_FORMAT_FILE";
const ENV_LOG_FORMAT_STDOUT: &str = "BLOBTX_LOG_FORMAT_STDOUT";

#[derive(EnumString, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
enum LogFormat {
    #[default]
    Text,
    Json,
}

/// A boxed layer for tracing
pub type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Logging options, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogOptions {
    file: String,
    dir: String,
    format_file: LogFormat,
    format_stdout: LogFormat,
}

impl LogOptions {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let format = |key: &str, default: LogFormat| {
            lookup(key).and_then(|f| LogFormat::from_str(&f).ok()).unwrap_or(default)
        };

        Self {
            file: lookup(ENV_LOG_FILE).unwrap_or_default(),
            dir: lookup(ENV_LOG_DIR).unwrap_or_else(|| ".".to_string()),
            format_file: format(ENV_LOG_FORMAT_FILE, LogFormat::Json),
            format_stdout: format(ENV_LOG_FORMAT_STDOUT, LogFormat::Text),
        }
    }
}

/// Initialize logging.
///
/// By default this will initialize INFO text to stdout.
///
/// Env var options:
/// - `BLOBTX_LOG_FILE` - file name to write logs to. If empty, will not write logs to file.
/// - `BLOBTX_LOG_DIR` - directory to write logs to. If empty will write logs to current directory.
/// - `BLOBTX_LOG_FORMAT_FILE` - logging format for file target. Defaults to `json`. One of json,
///   text.
/// - `BLOBTX_LOG_FORMAT_STDOUT` - logging format for stdout target. Defaults to `text`. One of
///   json, text.
///
/// The returned guards must be held for as long as logs should be flushed.
pub fn init_logging() -> eyre::Result<Vec<WorkerGuard>> {
    dotenv().ok();

    let options = LogOptions::from_lookup(|key| env::var(key).ok());

    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(stdout());

    let mut guards = vec![stdout_guard];
    let mut layers: Vec<BoxedLayer<Registry>> =
        vec![apply_layer_format(options.format_stdout, stdout_writer)];

    if !options.file.is_empty() {
        let appender = RollingFileAppender::new(Rotation::NEVER, &options.dir, &options.file);
        let (file_writer, file_guard) = tracing_appender::non_blocking(appender);
        guards.push(file_guard);
        layers.push(apply_layer_format(options.format_file, file_writer));
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    tracing::info!(
        BLOBTX_LOG_FILE = options.file,
        BLOBTX_LOG_DIR = options.dir,
        BLOBTX_LOG_FORMAT_FILE = ?options.format_file,
        BLOBTX_LOG_FORMAT_STDOUT = ?options.format_stdout,
        RUST_LOG = env::var("RUST_LOG").unwrap_or_default(),
        "Logging options configured via env vars: "
    );

    Ok(guards)
}

fn env_filter() -> EnvFilter {
    EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy()
}

fn apply_layer_format(log_format: LogFormat, writer: NonBlocking) -> BoxedLayer<Registry> {
    match log_format {
        LogFormat::Json => fmt::layer()
            .with_span_events(FmtSpan::CLOSE)
            .json()
            .with_writer(writer)
            .with_filter(env_filter())
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(writer)
            .with_filter(env_filter())
            .boxed(),
    }
}

#[cfg(test)]
mod test {
    use super::{LogFormat, LogOptions};
    use std::collections::HashMap;

    fn options(vars: &[(&str, &str)]) -> LogOptions {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        LogOptions::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let opts = options(&[]);
        assert_eq!(opts.file, "");
        assert_eq!(opts.dir, ".");
        assert_eq!(opts.format_file, LogFormat::Json);
        assert_eq!(opts.format_stdout, LogFormat::Text);
    }

    #[test]
    fn overrides_and_bad_format() {
        let opts = options(&[
            ("BLOBTX_LOG_FILE", "blobtx.log"),
            ("BLOBTX_LOG_DIR", "/tmp/logs"),
            ("BLOBTX_LOG_FORMAT_FILE", "text"),
            ("BLOBTX_LOG_FORMAT_STDOUT", "yaml"),
        ]);
        assert_eq!(opts.file, "blobtx.log");
        assert_eq!(opts.dir, "/tmp/logs");
        assert_eq!(opts.format_file, LogFormat::Text);
        // unknown formats fall back to the target's default
        assert_eq!(opts.format_stdout, LogFormat::Text);
    }
}
