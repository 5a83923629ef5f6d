//! Which locations an AWS CLI binary may be launched from.

use std::io;
use std::path::{Path, PathBuf};

use crate::platform::Platform;

/// Filesystem queries made while validating a candidate executable.
pub trait PathInspector: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    /// Absolute path with every symlink dereferenced.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPaths;

impl PathInspector for SystemPaths {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }
}

/// True when `path` equals `prefix` or sits below it on a component boundary.
/// `/usr/local/bin-evil` is not under `/usr/local/bin`.
pub fn is_within_prefix(platform: &Platform, path: &str, prefix: &str) -> bool {
    let sep = platform.path_separator;
    let path = platform.normalize_path_text(path);
    let mut prefix = platform.normalize_path_text(prefix);
    while prefix.len() > 1 && prefix.ends_with(sep) {
        prefix.pop();
    }
    if prefix.is_empty() {
        return false;
    }
    if path == prefix {
        return true;
    }
    if prefix.ends_with(sep) {
        // filesystem root
        return path.starts_with(&prefix);
    }
    path.strip_prefix(&prefix)
        .is_some_and(|rest| rest.starts_with(sep))
}

#[derive(Debug, Clone)]
pub struct TrustPolicy {
    platform: Platform,
    prefixes: Vec<String>,
    search_path: String,
}

impl TrustPolicy {
    /// The built-in install locations and search path of `platform`.
    pub fn for_platform(platform: &Platform) -> Self {
        Self {
            platform: platform.clone(),
            prefixes: platform
                .trusted_prefixes
                .iter()
                .map(|p| p.to_string())
                .collect(),
            search_path: platform.sanitized_search_path(),
        }
    }

    /// Replaces the trusted install roots, keeping the platform's comparison rules.
    #[must_use]
    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_search_path(mut self, search_path: impl Into<String>) -> Self {
        self.search_path = search_path.into();
        self
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn search_path(&self) -> &str {
        &self.search_path
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn is_trusted(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        self.prefixes
            .iter()
            .any(|prefix| is_within_prefix(&self.platform, &text, prefix))
    }
}
