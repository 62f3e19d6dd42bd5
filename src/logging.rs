//! Logging init: human-readable lines on stderr.

use std::io::{self, IsTerminal};

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "info,gw2walls=debug"
    } else {
        "warn,gw2walls=info"
    }
}

/// Initialize logging to stderr. `RUST_LOG` overrides `verbose`.
pub fn init(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(verbose)
        .try_init();

    if let Err(err) = result {
        eprintln!("gw2walls: logging already initialized: {err}");
    }
}
