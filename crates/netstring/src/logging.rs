//! Stderr diagnostics. Stdout carries encoded or decoded data only.
//!
//! The codec library logs under its own target: `debug` for poisoned decoders and skipped
//! record keys, `trace` for every netstring read or written. `--log-codec` sets that
//! target apart from the tool's own level, so a wire trace does not need the rest of the
//! tool at `trace` too.

use clap::{Args, ValueEnum};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

/// Target prefix of every event the codec library emits.
pub const CODEC_TARGET: &str = "netstring_codec";

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", env = "NETSTRING_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", env = "NETSTRING_LOG_LEVEL", global = true)]
    pub log_level: LogLevel,

    /// Log level for the codec library. Defaults to --log-level.
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_codec: Option<LogLevel>,
}

impl LogArgs {
    fn targets(&self) -> Targets {
        let codec = self.log_codec.unwrap_or(self.log_level);
        Targets::new()
            .with_default(LevelFilter::from(self.log_level))
            .with_target(CODEC_TARGET, LevelFilter::from(codec))
    }
}

/// Install the stderr subscriber. A second call, or a subscriber installed elsewhere,
/// leaves the existing one in place.
pub fn init_logging(args: &LogArgs) {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false);

    let registry = tracing_subscriber::registry();
    let _ = match args.log_format {
        // Text stays terse; JSON lines keep the target so codec events can be filtered.
        LogFormat::Text => registry
            .with(layer.with_target(false).with_filter(args.targets()))
            .try_init(),
        LogFormat::Json => registry
            .with(layer.json().with_filter(args.targets()))
            .try_init(),
    };
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    fn args(level: LogLevel, codec: Option<LogLevel>) -> LogArgs {
        LogArgs {
            log_format: LogFormat::Text,
            log_level: level,
            log_codec: codec,
        }
    }

    #[test]
    fn levels_map_to_filters() {
        assert_eq!(LevelFilter::from(LogLevel::Off), LevelFilter::OFF);
        assert_eq!(LevelFilter::from(LogLevel::Debug), LevelFilter::DEBUG);
        assert!(LevelFilter::from(LogLevel::Warn) < LevelFilter::from(LogLevel::Info));
    }

    #[test]
    fn codec_follows_tool_level_by_default() {
        let targets = args(LogLevel::Info, None).targets();
        assert!(targets.would_enable("netstring", &Level::INFO));
        assert!(targets.would_enable("netstring_codec::decoder", &Level::INFO));
        assert!(!targets.would_enable("netstring_codec::decoder", &Level::DEBUG));
    }

    #[test]
    fn codec_level_is_independent() {
        let targets = args(LogLevel::Warn, Some(LogLevel::Trace)).targets();
        assert!(targets.would_enable("netstring_codec::encoder", &Level::TRACE));
        assert!(!targets.would_enable("netstring", &Level::INFO));

        let targets = args(LogLevel::Debug, Some(LogLevel::Off)).targets();
        assert!(!targets.would_enable("netstring_codec::record", &Level::ERROR));
        assert!(targets.would_enable("netstring", &Level::DEBUG));
    }
}
