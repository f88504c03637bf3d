//! Logging configuration for service-provider
//!
//! Every event the container emits uses the `service_provider` target with
//! structured fields (`service`, `lifetime`, `field`, ...). This module
//! installs a `tracing-subscriber` formatter for applications that do not
//! bring their own.
//!
//! # Features
//!
//! - `logging` - Emit tracing events (default)
//! - `logging-json` - JSON structured output
//! - `logging-pretty` - Human-readable output
//!
//! Without either subscriber feature the `init*` functions do nothing.
//!
//! # Example
//!
//! ```rust,ignore
//! use service_provider::logging;
//!
//! // Default settings (JSON if logging-json, pretty if logging-pretty)
//! logging::init();
//!
//! // Container events only, honouring RUST_LOG when it is set
//! logging::builder()
//!     .service_only()
//!     .trace()
//!     .from_env()
//!     .compact()
//!     .init();
//! ```

use tracing::Level;

/// Target used by every event this crate emits
pub const TARGET: &str = "service_provider";

/// Logging format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON structured logging
    #[default]
    Json,
    /// Multi-line human-readable output
    Pretty,
    /// Compact single-line output
    Compact,
}

/// Builder for logging configuration
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    from_env: bool,
    with_file: bool,
    with_line_number: bool,
    with_thread_ids: bool,
    with_thread_names: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Json,
            target: None,
            from_env: false,
            with_file: false,
            with_line_number: false,
            with_thread_ids: false,
            with_thread_names: false,
        }
    }
}

impl LoggingBuilder {
    /// Create a new logging builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set log level to TRACE (cache hits, injections, scope changes)
    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    /// Set log level to DEBUG (registrations, constructions)
    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    /// Set log level to INFO
    pub fn info(self) -> Self {
        self.with_level(Level::INFO)
    }

    /// Set log level to WARN
    pub fn warn(self) -> Self {
        self.with_level(Level::WARN)
    }

    /// Filter to only show logs from a specific target
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show service-provider logs
    pub fn service_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    /// Prefer the `RUST_LOG` directives when the variable is set
    pub fn from_env(mut self) -> Self {
        self.from_env = true;
        self
    }

    /// Include file names in log output
    pub fn with_file(mut self) -> Self {
        self.with_file = true;
        self
    }

    /// Include line numbers in log output
    pub fn with_line_number(mut self) -> Self {
        self.with_line_number = true;
        self
    }

    /// Include thread IDs in log output
    pub fn with_thread_ids(mut self) -> Self {
        self.with_thread_ids = true;
        self
    }

    /// Include thread names in log output
    pub fn with_thread_names(mut self) -> Self {
        self.with_thread_names = true;
        self
    }

    /// Use JSON structured logging format
    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    /// Use multi-line human-readable format
    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    /// Use compact single-line format
    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// The filter directive built from level and target
    pub fn directive(&self) -> String {
        let level = self.level.to_string().to_lowercase();
        match self.target {
            Some(target) => format!("{target}={level}"),
            None => level,
        }
    }

    /// Install the configured subscriber as the global default.
    ///
    /// Returns `false` if a global subscriber was already installed.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) -> bool {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = if self.from_env {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directive()))
        } else {
            EnvFilter::new(self.directive())
        };

        let layer = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_line_number)
            .with_thread_ids(self.with_thread_ids)
            .with_thread_names(self.with_thread_names)
            .with_target(true);

        let registry = tracing_subscriber::registry().with(filter);

        match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => registry.with(layer.json()).try_init().is_ok(),
            // Without JSON support fall back to the default formatter
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => registry.with(layer).try_init().is_ok(),
            LogFormat::Pretty => registry.with(layer.pretty()).try_init().is_ok(),
            LogFormat::Compact => registry.with(layer.compact()).try_init().is_ok(),
        }
    }

    /// Initialize (no-op when subscriber features not available)
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) -> bool {
        false
    }
}

/// Create a new logging builder
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Initialize logging with default settings
///
/// JSON if `logging-json` is enabled, otherwise pretty.
pub fn init() -> bool {
    if cfg!(feature = "logging-json") {
        init_json()
    } else {
        init_pretty()
    }
}

/// Initialize JSON structured logging at DEBUG
pub fn init_json() -> bool {
    builder().json().debug().init()
}

/// Initialize human-readable logging at DEBUG
///
/// # Example output
/// ```text
///   2026-01-01T00:00:00.000Z DEBUG service_provider: Registered service, service: "app::Logger", lifetime: "singleton"
/// ```
pub fn init_pretty() -> bool {
    builder().pretty().debug().init()
}

/// Initialize logging for service-provider events only, honouring `RUST_LOG`
pub fn init_service_only() -> bool {
    builder().service_only().debug().from_env().init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = LoggingBuilder::default();
        assert_eq!(builder.level, Level::DEBUG);
        assert_eq!(builder.format, LogFormat::Json);
        assert!(builder.target.is_none());
        assert!(!builder.from_env);
        assert_eq!(builder.directive(), "debug");
    }

    #[test]
    fn test_builder_chain() {
        let builder = LoggingBuilder::new()
            .trace()
            .compact()
            .with_file()
            .with_line_number()
            .from_env()
            .service_only();

        assert_eq!(builder.level, Level::TRACE);
        assert_eq!(builder.format, LogFormat::Compact);
        assert!(builder.with_file);
        assert!(builder.with_line_number);
        assert!(builder.from_env);
        assert_eq!(builder.directive(), "service_provider=trace");
    }
}
