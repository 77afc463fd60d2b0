//! Tracing subscriber setup for the CLI and server.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Logs go to stderr; stdout is reserved for
/// command output. `RUST_LOG` overrides `default_level`.
pub fn init(default_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Level for `-v` repetitions: warn, info, debug.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}
