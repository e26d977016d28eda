use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Overrides `--log-level` and `--log-traffic` with full filter directives.
pub const LOG_ENV: &str = "KNITLINK_LOG";

/// Target of the per-unit traffic lines.
const TRAFFIC_TARGET: &str = "knitlink_session";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Filter directives for a level, optionally lifting session traffic to debug.
pub fn directives(level: LogLevel, traffic: bool) -> String {
    let base = level.directive();
    if traffic && matches!(level, LogLevel::Error | LogLevel::Warn | LogLevel::Info) {
        format!("{base},{TRAFFIC_TARGET}=debug")
    } else {
        base.to_string()
    }
}

/// Install the stderr subscriber. Session diagnostics land here; stdout
/// carries command output only.
pub fn init_logging(format: LogFormat, level: LogLevel, traffic: bool) {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(directives(level, traffic)));

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(traffic);

    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_level_has_no_target_override() {
        assert_eq!(directives(LogLevel::Warn, false), "warn");
        assert_eq!(directives(LogLevel::Trace, false), "trace");
    }

    #[test]
    fn traffic_lifts_session_target() {
        assert_eq!(
            directives(LogLevel::Info, true),
            "info,knitlink_session=debug"
        );
        // already verbose enough
        assert_eq!(directives(LogLevel::Debug, true), "debug");
    }

    #[test]
    fn directives_parse_as_filters() {
        for level in [LogLevel::Error, LogLevel::Info, LogLevel::Trace] {
            assert!(EnvFilter::try_new(directives(level, true)).is_ok());
        }
    }
}
