//! Unified logging for debug output.
//!
//! Provides compact timestamped logging with per-module level configuration.
//! Supports `RUST_LOG` environment variable for runtime overrides.
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! default = "info"
//!
//! [logging.modules]
//! "forage::vector" = "debug"
//! ```
//!
//! # Environment Variable
//!
//! `RUST_LOG` takes precedence over config:
//! ```bash
//! RUST_LOG=debug forage index docs.md
//! RUST_LOG=forage::retrieval=trace forage query "..."
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Initialize logging with configuration.
///
/// Call once at startup. Safe to call multiple times (only first call takes effect).
///
/// Log levels control visibility:
/// - `error` - errors only (quietest)
/// - `warn` - errors + warnings
/// - `info` - normal operation logs (default)
/// - `debug` - detailed debugging
/// - `trace` - everything
///
/// The `RUST_LOG` environment variable takes precedence over config settings.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        // RUST_LOG env var takes precedence over config
        let filter = match std::env::var("RUST_LOG") {
            Ok(env_directives) => EnvFilter::new(env_directives),
            Err(_) => EnvFilter::new(filter_directives(config)),
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true) // Show target for filtering visibility
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}

/// Comma-joined filter directives: the default level first, then one
/// `module=level` directive per override.
fn filter_directives(config: &LoggingConfig) -> String {
    std::iter::once(config.default.clone())
        .chain(
            config
                .modules
                .iter()
                .map(|(module, level)| format!("{module}={level}")),
        )
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize logging with default configuration.
///
/// Uses `LoggingConfig::default()`. Use the `RUST_LOG` environment variable
/// for verbose output.
pub fn init() {
    init_with_config(&LoggingConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives_default_only() {
        let config = LoggingConfig::default();
        assert_eq!(filter_directives(&config), "info");
    }

    #[test]
    fn test_filter_directives_include_module_overrides() {
        let mut config = LoggingConfig::default();
        config.default = "warn".to_string();
        config
            .modules
            .insert("forage::vector".to_string(), "debug".to_string());

        let directives = filter_directives(&config);
        assert!(directives.starts_with("warn"));
        assert!(directives.contains("forage::vector=debug"));
    }
}
