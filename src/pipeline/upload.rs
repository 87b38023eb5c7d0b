//! Upload of the final report through the fetched Codecov uploader.
//!
//! The uploader script is downloaded once and piped into `bash`; how it
//! talks to the service, and how it fails, is up to the script.

use crate::config::UploadConfig;
use crate::errors::{CcovError, Result};
use crate::exec::Invocation;
use std::path::Path;

/// Source of the uploader script.
pub trait ScriptFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

impl<T: ScriptFetcher + ?Sized> ScriptFetcher for &T {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        (**self).fetch(url)
    }
}

/// Fetches over HTTPS with a blocking reqwest client.
#[derive(Debug, Default, Clone)]
pub struct HttpFetcher;

impl ScriptFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let fetch_error = |e: reqwest::Error| CcovError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        };

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("ccov/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(fetch_error)?;
        let response = client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(fetch_error)?;
        let body = response.bytes().map_err(fetch_error)?;

        tracing::debug!(url, bytes = body.len(), "fetched uploader script");
        Ok(body.to_vec())
    }
}

/// Read the upload token. Only called when an upload is actually requested.
pub fn read_token(config: &UploadConfig) -> Option<String> {
    std::env::var(&config.token_env)
        .ok()
        .filter(|token| !token.is_empty())
}

/// `bash -s -- -f <report> [-t <token>]`, the script supplied on stdin.
pub fn upload_invocation(report: &Path, token: Option<&str>, script: Option<Vec<u8>>) -> Invocation {
    let mut invocation = Invocation::new("bash")
        .args(["-s", "--", "-f"])
        .path_arg(report);
    if let Some(token) = token {
        invocation = invocation.arg("-t").secret_arg(token);
    }
    match script {
        Some(script) => invocation.stdin(script),
        None => invocation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_passed_but_masked() {
        let inv = upload_invocation(Path::new("lcov.info"), Some("abc"), Some(b"echo".to_vec()));
        assert_eq!(inv.args, vec!["-s", "--", "-f", "lcov.info", "-t", "abc"]);
        assert_eq!(
            inv.to_string(),
            "bash -s -- -f lcov.info -t *** (stdin: 4 bytes)"
        );
    }

    #[test]
    fn test_missing_token_omits_flag() {
        let inv = upload_invocation(Path::new("lcov.info"), None, None);
        assert_eq!(inv.args, vec!["-s", "--", "-f", "lcov.info"]);
        assert!(inv.stdin.is_none());
    }

    #[test]
    fn test_empty_token_counts_as_missing() {
        let config = UploadConfig {
            token_env: "CCOV_TEST_EMPTY_TOKEN".into(),
            ..UploadConfig::default()
        };
        std::env::set_var("CCOV_TEST_EMPTY_TOKEN", "");
        assert_eq!(read_token(&config), None);
        std::env::set_var("CCOV_TEST_EMPTY_TOKEN", "t0k");
        assert_eq!(read_token(&config).as_deref(), Some("t0k"));
        std::env::remove_var("CCOV_TEST_EMPTY_TOKEN");
    }
}
