//! Runtime setup for the binary: logging and output formatting.

use crate::formatting::{formatter_for, ColorMode, OutputFormatter};
use tracing_subscriber::EnvFilter;

/// Default filter for a verbosity count, used when `RUST_LOG` is unset (pure function)
pub fn default_log_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "ccov=info",
        2 => "ccov=debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Logs go to stderr so `--json` stdout stays clean.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbosity)));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Formatter honouring `--plain` and the color environment variables.
pub fn output_formatter(plain: bool) -> Box<dyn OutputFormatter> {
    let mode = if plain {
        ColorMode::Never
    } else {
        ColorMode::Auto.with_env_overrides()
    };
    formatter_for(mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_raises_level() {
        assert_eq!(default_log_filter(0), "warn");
        assert_eq!(default_log_filter(1), "ccov=info");
        assert_eq!(default_log_filter(2), "ccov=debug");
        assert_eq!(default_log_filter(7), "trace");
    }
}
