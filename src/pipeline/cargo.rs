//! Instrumented cargo build and test invocations.
//!
//! The instrumentation variables live on the two child invocations only, so
//! they apply for exactly the duration of build and test.

use crate::config::CcovConfig;
use crate::exec::Invocation;

pub const CARGO_INCREMENTAL: &str = "CARGO_INCREMENTAL";
pub const RUSTFLAGS: &str = "RUSTFLAGS";

/// Environment for instrumentation-enabled compilation
pub fn instrumentation_env(config: &CcovConfig) -> Vec<(String, String)> {
    vec![
        (CARGO_INCREMENTAL.to_string(), "0".to_string()),
        (RUSTFLAGS.to_string(), config.instrument.rustflags_value()),
    ]
}

fn cargo(config: &CcovConfig, subcommand: &str) -> Invocation {
    let mut invocation = Invocation::new("cargo")
        .arg(format!("+{}", config.toolchain))
        .args([subcommand, "--verbose"]);
    for (key, value) in instrumentation_env(config) {
        invocation = invocation.env(key, value);
    }
    invocation
}

pub fn build_invocation(config: &CcovConfig) -> Invocation {
    cargo(config, "build")
}

pub fn test_invocation(config: &CcovConfig) -> Invocation {
    cargo(config, "test")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_uses_toolchain_and_instrumentation() {
        let inv = build_invocation(&CcovConfig::default());
        assert_eq!(inv.program, "cargo");
        assert_eq!(inv.args, vec!["+nightly", "build", "--verbose"]);
        assert_eq!(inv.env_value(CARGO_INCREMENTAL), Some("0"));
        assert_eq!(
            inv.env_value(RUSTFLAGS),
            Some("-Zprofile -Ccodegen-units=1 -Copt-level=0 -Clink-dead-code -Coverflow-checks=off")
        );
    }

    #[test]
    fn test_custom_toolchain_for_tests() {
        let config = CcovConfig {
            toolchain: "nightly-2024-02-01".into(),
            ..CcovConfig::default()
        };
        let inv = test_invocation(&config);
        assert_eq!(inv.args, vec!["+nightly-2024-02-01", "test", "--verbose"]);
    }
}
