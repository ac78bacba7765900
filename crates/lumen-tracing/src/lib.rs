//! Shared tracing configuration utilities for the Lumen workspace.
//!
//! The helpers in this crate centralise how binaries, integration tests,
//! and benches install `tracing` subscribers. Routing setup through a
//! single crate keeps filter defaults and output formats consistent across
//! the workspace instead of copy-pasting builder logic into every harness.

use std::env;

pub use tracing::{debug, error, info, trace, warn};

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Output format for the formatter layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TracingOutput {
    /// Human-oriented multi-line output for local development.
    Pretty,
    /// Single-line output, still human-readable.
    Compact,
    /// Machine-readable JSON lines for CI and log collection.
    Json,
}

impl TracingOutput {
    fn from_env_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Configuration describing how the shared tracing subscriber should behave.
#[derive(Clone, Debug)]
pub struct TracingConfig {
    /// Optional tracing directives (e.g. `lumen_driver=debug,info`). When
    /// absent the crate falls back to `RUST_LOG` and finally to
    /// [`default_directive`](Self::default_directive).
    pub directives: Option<String>,
    /// Fallback directive used when neither `directives` nor `RUST_LOG`
    /// resolve to a valid filter.
    pub default_directive: String,
    /// Controls whether event targets (module paths) appear in output.
    pub include_targets: bool,
    /// Controls ANSI formatting. Disable for CI logs that strip colour codes.
    pub ansi: bool,
    /// Output format for the formatter layer.
    pub output: TracingOutput,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::for_local()
    }
}

impl TracingConfig {
    /// Returns a configuration tuned for local development (pretty, ANSI-enabled output).
    pub fn for_local() -> Self {
        Self {
            directives: None,
            default_directive: "info".to_string(),
            include_targets: true,
            ansi: true,
            output: TracingOutput::Pretty,
        }
    }

    /// Returns a configuration tuned for CI or log collection environments (JSON, no ANSI).
    pub fn for_ci() -> Self {
        Self {
            directives: None,
            default_directive: "info".to_string(),
            include_targets: true,
            ansi: false,
            output: TracingOutput::Json,
        }
    }

    /// Build a configuration using environment hints.
    ///
    /// # Environment Variables
    ///
    /// - `LUMEN_TRACING_PROFILE` - Profile preset: `local` (default) or `ci`
    /// - `LUMEN_TRACING_DIRECTIVES` - Overrides tracing directives
    /// - `LUMEN_TRACING_FORMAT` - Output format: `pretty`, `compact`, or `json`
    pub fn from_env() -> Self {
        let profile = env::var("LUMEN_TRACING_PROFILE")
            .unwrap_or_else(|_| "local".to_string())
            .to_ascii_lowercase();

        let mut config = match profile.as_str() {
            "ci" => Self::for_ci(),
            _ => Self::for_local(),
        };

        if let Ok(directives) = env::var("LUMEN_TRACING_DIRECTIVES") {
            if !directives.trim().is_empty() {
                config.directives = Some(directives);
            }
        }

        if let Ok(format) = env::var("LUMEN_TRACING_FORMAT") {
            if let Some(parsed) = TracingOutput::from_env_value(&format) {
                config.output = parsed;
                if matches!(config.output, TracingOutput::Json) {
                    config.ansi = false;
                }
            }
        }

        config
    }

    fn env_filter(&self) -> EnvFilter {
        if let Some(directives) = &self.directives {
            if let Ok(filter) = EnvFilter::try_new(directives) {
                return filter;
            }
        }
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive.clone()))
    }
}

/// Install the global subscriber described by `config`.
///
/// Returns an error if another subscriber has already been installed, so
/// callers that race (e.g. tests in one binary) should prefer
/// [`init_for_tests`].
pub fn init(config: &TracingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let builder = fmt()
        .with_env_filter(config.env_filter())
        .with_target(config.include_targets)
        .with_ansi(config.ansi);

    match config.output {
        TracingOutput::Pretty => builder.pretty().try_init()?,
        TracingOutput::Compact => builder.compact().try_init()?,
        TracingOutput::Json => builder.json().try_init()?,
    }
    Ok(())
}

/// Install a subscriber from environment hints, ignoring the error when one
/// is already installed.
///
/// Integration tests share a process per test binary, so every `#[test]`
/// can call this without coordinating which one runs first.
pub fn init_for_tests() {
    let _ = init(&TracingConfig::from_env());
}
