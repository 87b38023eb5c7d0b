use crate::config::CcovConfig;
use crate::exec::Invocation;

/// genhtml with source highlighting and branch detail. `--ignore-errors source`
/// keeps one unmappable file from aborting the whole report.
pub fn html_invocation(config: &CcovConfig) -> Invocation {
    Invocation::new("genhtml")
        .arg("-o")
        .path_arg(&config.html_dir)
        .args([
            "--show-details",
            "--highlight",
            "--ignore-errors",
            "source",
            "--legend",
        ])
        .path_arg(&config.report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_command() {
        assert_eq!(
            html_invocation(&CcovConfig::default()).to_string(),
            "genhtml -o target/cov --show-details --highlight --ignore-errors source --legend lcov.info"
        );
    }
}
