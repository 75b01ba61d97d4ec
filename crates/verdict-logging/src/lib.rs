//! # verdict-logging
//!
//! Logging for the verdict criteria evaluator.
//!
//! ## Key Types
//!
//! - [`Logger`] - Structured event logging to stderr and an optional file
//! - [`LogEvent`] - Evaluation and batch events
//! - [`LogFormat`] - Output formats (Pretty, JSON, Compact)
//! - [`RunWriter`] - JSONL recording of a batch run

mod events;
mod run;

pub use events::{LogEvent, LogFormat, Logger};
pub use run::{RunLine, RunSummary, RunWriter};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing for the application
pub fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(false).with_writer(std::io::stderr))
                .try_init();
        }
        LogFormat::Pretty | LogFormat::Compact => {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .try_init();
        }
    }
}
