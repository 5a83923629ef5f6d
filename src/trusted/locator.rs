//! Running `which` / `where` against the sanitized search path.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::constants::EXECUTABLE_LOOKUP_TIMEOUT;
use crate::env::{EnvProvider, SystemEnv};
use crate::error::TrustError;
use crate::platform::{OsFamily, Platform};

#[async_trait]
pub trait ExecutableLocator: Send + Sync {
    /// Candidate paths for `name` in lookup order. An empty list means the
    /// name was not found.
    async fn locate(&self, name: &str, search_path: &str) -> Result<Vec<PathBuf>, TrustError>;
}

/// Invokes the platform's locate program with an otherwise empty environment.
pub struct SystemLocator {
    platform: &'static Platform,
    env: Arc<dyn EnvProvider>,
    timeout: Duration,
}

impl SystemLocator {
    pub fn new(platform: &'static Platform, env: Arc<dyn EnvProvider>) -> Self {
        Self {
            platform,
            env,
            timeout: EXECUTABLE_LOOKUP_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SystemLocator {
    fn default() -> Self {
        Self::new(Platform::current(), Arc::new(SystemEnv))
    }
}

#[async_trait]
impl ExecutableLocator for SystemLocator {
    async fn locate(&self, name: &str, search_path: &str) -> Result<Vec<PathBuf>, TrustError> {
        let mut cmd = Command::new(self.platform.locate_program);
        cmd.arg(name)
            .env_clear()
            .env("PATH", search_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        if self.platform.family == OsFamily::Windows {
            if let Some(root) = self.env.get("SystemRoot") {
                cmd.env("SystemRoot", root);
            }
        }

        let child = cmd.spawn().map_err(TrustError::LookupFailed)?;
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| TrustError::LookupTimedOut(self.timeout.as_secs()))?
            .map_err(TrustError::LookupFailed)?;

        if !output.status.success() {
            return Ok(Vec::new());
        }

        Ok(parse_lookup_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// One candidate per non-blank line.
pub fn parse_lookup_output(stdout: &str) -> Vec<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lookup_output_keeps_order() {
        let out = "/usr/local/bin/aws\n\n  /usr/bin/aws  \n";
        assert_eq!(
            parse_lookup_output(out),
            vec![PathBuf::from("/usr/local/bin/aws"), PathBuf::from("/usr/bin/aws")]
        );
    }

    #[test]
    fn test_parse_lookup_output_handles_crlf() {
        let out = "C:\\Program Files\\Amazon\\AWSCLIV2\\aws.exe\r\n";
        assert_eq!(
            parse_lookup_output(out),
            vec![PathBuf::from("C:\\Program Files\\Amazon\\AWSCLIV2\\aws.exe")]
        );
    }

    #[test]
    fn test_parse_lookup_output_empty() {
        assert!(parse_lookup_output("").is_empty());
        assert!(parse_lookup_output("\n \n").is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_locator_misses_unknown_name() {
        let locator = SystemLocator::default();
        let candidates = locator
            .locate("definitely-not-an-installed-binary-3f9a", "/usr/bin:/bin")
            .await;
        // `which` may itself be absent in minimal images
        if let Ok(candidates) = candidates {
            assert!(candidates.is_empty());
        }
    }
}
