//! Conversion of the instrumentation archive into an lcov report with grcov.

use crate::config::CcovConfig;
use crate::errors::{CcovError, Result};
use crate::exec::Invocation;
use std::fs;
use std::path::Path;

/// `grcov <archive> -s . -t lcov --llvm --branch --ignore-not-existing --ignore ... -o <report>`
pub fn convert_invocation(config: &CcovConfig) -> Invocation {
    let mut invocation = Invocation::new("grcov")
        .path_arg(&config.archive)
        .args(["-s", ".", "-t", "lcov", "--llvm", "--branch", "--ignore-not-existing"]);
    for pattern in &config.convert.ignore {
        invocation = invocation.args(["--ignore", pattern.as_str()]);
    }
    invocation.arg("-o").path_arg(&config.report)
}

/// A zero exit from the converter still has to leave a non-empty report.
pub fn verify_report(report: &Path) -> Result<()> {
    match fs::metadata(report) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(CcovError::NoCoverageData {
            report: report.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_conversion_command() {
        let inv = convert_invocation(&CcovConfig::default());
        assert_eq!(
            inv.to_string(),
            "grcov ccov.zip -s . -t lcov --llvm --branch --ignore-not-existing \
             --ignore '/*' --ignore 'tests/*' -o lcov.info"
        );
    }

    #[test]
    fn test_extra_ignore_patterns_are_passed() {
        let mut config = CcovConfig::default();
        config.convert.ignore.push("benches/*".into());
        let inv = convert_invocation(&config);
        assert_eq!(inv.args.iter().filter(|a| *a == "--ignore").count(), 3);
    }

    #[test]
    fn test_empty_or_missing_report_means_no_data() {
        let temp = tempfile::tempdir().unwrap();
        let report = temp.path().join("lcov.info");
        assert!(matches!(
            verify_report(&report),
            Err(CcovError::NoCoverageData { .. })
        ));

        fs::write(&report, "").unwrap();
        assert!(verify_report(&report).is_err());

        fs::write(&report, "TN:\nend_of_record\n").unwrap();
        assert!(verify_report(&report).is_ok());
    }
}
