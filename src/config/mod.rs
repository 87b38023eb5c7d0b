//! Configuration for pipeline runs, read from `.ccov.toml`.

mod core;
mod loader;

pub use self::core::{
    default_archive, default_build_dir, default_html_dir, default_ignore, default_manifest,
    default_report, default_rustflags, default_script_url, default_token_env, default_toolchain,
    CcovConfig, ConvertConfig, FixConfig, InstrumentConfig, UploadConfig,
};
pub use loader::{
    directory_ancestors, load_config, load_config_from, parse_config, CONFIG_FILE_NAME,
};

/// Template written by `ccov init`. Parses to [`CcovConfig::default`].
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# ccov configuration
# All paths are relative to the project root.

manifest = "Cargo.toml"
toolchain = "nightly"
build_dir = "target/debug/deps"
archive = "ccov.zip"
report = "lcov.info"
html_dir = "target/cov"

[instrument]
rustflags = [
    "-Zprofile",
    "-Ccodegen-units=1",
    "-Copt-level=0",
    "-Clink-dead-code",
    "-Coverflow-checks=off",
]
extra_rustflags = []

[convert]
ignore = ["/*", "tests/*"]

[fix]
enabled = true
# Run an external fixer instead of the builtin pass:
# command = ["rust-covfix", "-o", "{report}", "{report}"]

[upload]
script_url = "https://codecov.io/bash"
token_env = "CODECOV_TOKEN"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_matches_defaults() {
        let parsed = parse_config(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(parsed, CcovConfig::default());
    }
}
