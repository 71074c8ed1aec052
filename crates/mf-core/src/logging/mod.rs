//! Structured logging for mf-core.
//!
//! - stdout is reserved for command payloads (JSON reports)
//! - stderr receives all log output, human-readable or JSONL
//! - every invocation gets a run ID attached as a span field

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose events pass the default filter.
const LOG_TARGETS: [&str; 2] = ["mf_core", "mf_bundle"];

/// Build the default filter directive for a level, e.g.
/// `mf_core=info,mf_bundle=info`.
pub fn default_directive(level: LogLevel) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the logging subsystem.
///
/// Must be called once at startup before any logging occurs. `RUST_LOG`
/// replaces the level-derived filter only when the level is not pinned.
pub fn init_logging(config: &LogConfig) {
    let filter = build_filter(config, std::env::var("RUST_LOG").ok().as_deref());

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .init();
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .init();
        }
    }
}

fn build_filter(config: &LogConfig, rust_log: Option<&str>) -> EnvFilter {
    let level_filter = || EnvFilter::new(default_directive(config.level));
    match rust_log {
        Some(directive) if !config.level_pinned => {
            EnvFilter::try_new(directive).unwrap_or_else(|_| level_filter())
        }
        _ => level_filter(),
    }
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    // Shorten to first 12 hex chars for readability
    format!("run-{}", &uuid.simple().to_string()[..12])
}
