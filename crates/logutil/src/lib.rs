//! Utilities for logging.

use std::io;

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    HumanReadable,
    Json,
}

impl LogFormat {
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "human" | "human_readable" | "pretty" => Some(LogFormat::HumanReadable),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Configure the global subscriber.
///
/// `default_level` is used when `RUST_LOG` isn't set. Does nothing if a
/// global subscriber was already installed.
pub fn configure_global_logger<W>(default_level: tracing::Level, format: LogFormat, writer: W)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .with_file(true)
        .with_line_number(true);

    let result = match format {
        LogFormat::HumanReadable => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    // Already initialized, keep whichever subscriber came first.
    let _ = result;
}

/// Route logs through the test writer so `cargo test` captures them.
pub fn init_test() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::DEBUG.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

/// Human readable logs to stderr at `WARN`.
pub fn init_stderr() {
    configure_global_logger(tracing::Level::WARN, LogFormat::HumanReadable, io::stderr);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_format() {
        assert_eq!(Some(LogFormat::Json), LogFormat::from_str_opt("JSON"));
        assert_eq!(Some(LogFormat::HumanReadable), LogFormat::from_str_opt("human"));
        assert_eq!(None, LogFormat::from_str_opt("xml"));
    }

    #[test]
    fn init_twice_is_fine() {
        init_test();
        init_test();
        tracing::debug!("logger initialized");
    }
}
