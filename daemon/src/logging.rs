//! Console logging plus, in release builds, a daily log file.
//!
//! Both outputs share one level: `RUST_LOG` when it parses, otherwise
//! `info` in release and `debug` in debug builds.

use crate::paths;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_PREFIX: &str = "mouse-follows-focus";
const KEEP_LOG_FILES: usize = 7;

/// Filter from an optional `RUST_LOG` value, falling back to `default_level`.
fn level_filter(env: Option<&str>, default_level: &str) -> EnvFilter {
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level))
}

fn env_filter(default_level: &str) -> EnvFilter {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    level_filter(env.as_deref(), default_level)
}

fn file_appender() -> Option<RollingFileAppender> {
    let log_dir = paths::log_dir();
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory {log_dir:?}: {e}");
        return None;
    }
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix("log")
        .max_log_files(KEEP_LOG_FILES)
        .build(&log_dir)
        .map_err(|e| eprintln!("Warning: File logging disabled: {e}"))
        .ok()
}

/// Initialize logging. In release mode, logs also go to `<config dir>/logs/`.
pub fn setup(is_production: bool) {
    let default_level = if is_production { "info" } else { "debug" };

    let console_layer = fmt::layer()
        .with_target(true)
        .with_filter(env_filter(default_level));

    let file_layer = is_production.then(file_appender).flatten().map(|appender| {
        fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(appender)
            .with_filter(env_filter(default_level))
    });
    let file_logging = file_layer.is_some();

    // `Option<Layer>` is itself a layer; `None` is a no-op.
    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    if file_logging {
        tracing::info!("File logging enabled: {:?}", paths::log_dir());
    }
    tracing::info!("Logging initialized (production={})", is_production);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides_default_level() {
        assert_eq!(level_filter(Some("warn"), "info").to_string(), "warn");
        assert_eq!(
            level_filter(Some("mff_core=trace"), "info").to_string(),
            "mff_core=trace"
        );
    }

    #[test]
    fn test_missing_or_bad_env_uses_default() {
        assert_eq!(level_filter(None, "debug").to_string(), "debug");
        assert_eq!(level_filter(Some("mff_core=loud"), "info").to_string(), "info");
    }
}
