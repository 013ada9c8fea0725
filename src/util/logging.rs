//! Standardized logging utility for the bridge
//!
//! This module provides the `wlog!` macro which ensures lifecycle messages
//! follow the `YYYY-MM-DD HH:MM:SS [MODULE] Message` format, and the
//! `tracing` subscriber setup used by the binary.

use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

#[macro_export]
macro_rules! wlog {
    ($module:expr, $($arg:tt)*) => {{
        let now = chrono::Local::now();
        eprintln!("{} [{}] {}",
            now.format("%Y-%m-%d %H:%M:%S"),
            $module,
            format!($($arg)*)
        );
    }};
}

/// Standardized module identifiers
pub const MAIN: &str = "MAIN";
pub const ENGINE: &str = "ENGINE";
pub const LIFECYCLE: &str = "LIFECYCLE";
pub const STUB: &str = "STUB";
pub const WM: &str = "WM";

/// Install the global `tracing` subscriber. `RUST_LOG` wins over
/// `default_filter`. Calling it twice is harmless.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_ansi(false)
        .with_env_filter(filter)
        .try_init();
}
