//! Diagnostics on stderr via `tracing`.
//!
//! `RUST_LOG` wins when set; otherwise the level follows `-q`.

use std::io::IsTerminal;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter for a given quiet count
pub fn default_directive(quiet: u8) -> &'static str {
    match quiet {
        0 => "tmplsan=info",
        1 => "tmplsan=warn",
        _ => "tmplsan=error",
    }
}

/// Install the global subscriber. Call once, from `main`.
pub fn init(quiet: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(quiet)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false)
                .compact(),
        )
        .init();
}
