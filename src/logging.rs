use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "EVENT_DIGEST_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Narration {
    Stdout,
    /// Keeps stdout free for a machine-readable report.
    Stderr,
}

/// `EVENT_DIGEST_LOG` takes an `EnvFilter` directive and defaults to `info`.
/// Colour is only used when the chosen stream is a terminal.
pub fn init(narration: Narration) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time();
    let _ = match narration {
        Narration::Stdout => builder
            .with_ansi(io::stdout().is_terminal())
            .with_writer(io::stdout)
            .try_init(),
        Narration::Stderr => builder
            .with_ansi(io::stderr().is_terminal())
            .with_writer(io::stderr)
            .try_init(),
    };
}
