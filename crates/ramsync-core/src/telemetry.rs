//! Tracing setup for the ramsync binary.
//!
//! Log lines go to stderr so stdout stays free for `--check` output.
//! Filtering honours `RAMSYNC_LOG`, then `RUST_LOG`, then the level passed
//! by the caller. `RAMSYNC_LOG_FORMAT=json` switches to JSON lines.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Env var holding a filter directive, checked before `RUST_LOG`.
pub const LOG_FILTER_ENV: &str = "RAMSYNC_LOG";

/// Env var selecting the log format (`json` or `text`).
pub const LOG_FORMAT_ENV: &str = "RAMSYNC_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// JSON when `json_flag` is set or `RAMSYNC_LOG_FORMAT=json`.
    pub fn resolve(json_flag: bool) -> Self {
        let from_env = std::env::var(LOG_FORMAT_ENV).ok();
        Self::pick(json_flag, from_env.as_deref())
    }

    fn pick(json_flag: bool, env_value: Option<&str>) -> Self {
        match env_value {
            _ if json_flag => LogFormat::Json,
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_tracing(format: LogFormat, level: Level) -> bool {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init(),
    };
    installed.is_ok()
}
