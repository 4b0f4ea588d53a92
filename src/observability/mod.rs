//! Observability: `tracing` setup and the markdown transcript logger.
//!
//! # Example
//!
//! ```no_run
//! use switchboard::observability::{init_tracing, Logger};
//!
//! init_tracing("info");
//!
//! let logger = Logger::new(None, Some("DEBUG")).unwrap();
//! logger.log_completion("thread-1", "halted").unwrap();
//! ```

pub mod logger;

pub use logger::Logger;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `default_level` when set. Calling this twice is a
/// no-op.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_ascii_lowercase()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
