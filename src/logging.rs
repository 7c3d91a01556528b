//! Tracing subscriber setup.
//!
//! Logs go to stderr so they never mix with a child's captured stdout.
//! `RUST_LOG` overrides the level picked from the verbosity count.

use tracing_subscriber::EnvFilter;

/// Map a `-v` count to a default filter directive.
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(verbose: u8) {
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| level_for_verbosity(verbose).to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
