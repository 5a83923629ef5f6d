//! Locating an AWS CLI binary that is safe to launch.
//!
//! The inherited `PATH` is never used. The CLI is looked up on a fixed search
//! path, and both the reported location and its symlink-resolved target must
//! sit under one of the platform's trusted install prefixes. A validated path
//! is memoized for the life of the process; [`clear_trusted_cache`] forces a
//! fresh lookup after the CLI is reinstalled elsewhere.

pub mod locator;
pub mod policy;

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::TrustError;
use crate::platform::Platform;

pub use locator::{ExecutableLocator, SystemLocator};
pub use policy::{PathInspector, SystemPaths, TrustPolicy};

/// A validated AWS CLI and the search path it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedExecutable {
    pub path: PathBuf,
    pub search_path: String,
}

/// Single-slot memo of the last validated executable.
#[derive(Debug, Default)]
pub struct TrustedPathCache {
    slot: Mutex<Option<TrustedExecutable>>,
}

impl TrustedPathCache {
    fn lock(&self) -> MutexGuard<'_, Option<TrustedExecutable>> {
        // Poison is ignored: the slot is only ever replaced whole.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self) -> Option<TrustedExecutable> {
        self.lock().clone()
    }

    pub fn store(&self, executable: TrustedExecutable) {
        *self.lock() = Some(executable);
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }
}

static GLOBAL_CACHE: LazyLock<Arc<TrustedPathCache>> =
    LazyLock::new(|| Arc::new(TrustedPathCache::default()));

/// The process-wide cache used by [`TrustedExecutableResolver::system`].
pub fn global_cache() -> Arc<TrustedPathCache> {
    Arc::clone(&GLOBAL_CACHE)
}

pub fn clear_trusted_cache() {
    GLOBAL_CACHE.clear();
}

/// Anything that can hand the executor a launchable AWS CLI.
#[async_trait]
pub trait ResolveExecutable: Send + Sync {
    async fn resolve(&self) -> Result<TrustedExecutable, TrustError>;
}

pub struct TrustedExecutableResolver {
    policy: TrustPolicy,
    locator: Arc<dyn ExecutableLocator>,
    paths: Arc<dyn PathInspector>,
    cache: Arc<TrustedPathCache>,
}

impl TrustedExecutableResolver {
    pub fn new(
        policy: TrustPolicy,
        locator: Arc<dyn ExecutableLocator>,
        paths: Arc<dyn PathInspector>,
        cache: Arc<TrustedPathCache>,
    ) -> Self {
        Self {
            policy,
            locator,
            paths,
            cache,
        }
    }

    /// Host platform defaults backed by the process-wide cache.
    pub fn system() -> Self {
        Self::new(
            TrustPolicy::for_platform(Platform::current()),
            Arc::new(SystemLocator::default()),
            Arc::new(SystemPaths),
            global_cache(),
        )
    }

    pub fn policy(&self) -> &TrustPolicy {
        &self.policy
    }

    /// Checks a looked-up candidate and returns its trusted real path.
    pub fn validate_candidate(&self, candidate: &Path) -> Result<PathBuf, TrustError> {
        if !self.paths.exists(candidate) {
            return Err(TrustError::CandidateMissing(candidate.to_path_buf()));
        }
        if !self.policy.is_trusted(candidate) {
            return Err(TrustError::UntrustedLocation(candidate.to_path_buf()));
        }

        let real = self
            .paths
            .canonicalize(candidate)
            .map_err(|source| TrustError::SymlinkResolution {
                path: candidate.to_path_buf(),
                source,
            })?;
        if !self.policy.is_trusted(&real) {
            return Err(TrustError::UntrustedSymlinkTarget {
                link: candidate.to_path_buf(),
                target: real,
            });
        }

        Ok(real)
    }
}

#[async_trait]
impl ResolveExecutable for TrustedExecutableResolver {
    async fn resolve(&self) -> Result<TrustedExecutable, TrustError> {
        if let Some(cached) = self.cache.get() {
            debug!(path = %cached.path.display(), "Using cached AWS CLI path");
            return Ok(cached);
        }

        let name = self.policy.platform().aws_executable;
        let search_path = self.policy.search_path().to_string();
        let candidate = self
            .locator
            .locate(name, &search_path)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TrustError::NotFound(name.to_string()))?;

        let real = self.validate_candidate(&candidate)?;
        let trusted = TrustedExecutable {
            path: real,
            search_path,
        };
        self.cache.store(trusted.clone());

        info!(
            candidate = %candidate.display(),
            path = %trusted.path.display(),
            "Resolved trusted AWS CLI"
        );
        Ok(trusted)
    }
}
