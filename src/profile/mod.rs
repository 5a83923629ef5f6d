//! Which AWS profile a refresh request is for.
//!
//! Resolution walks an ordered list of strategies and takes the first answer:
//!
//! 1. the profile passed explicitly by the caller,
//! 2. the `AWS_PROFILE` that an MCP client config declares for the named server,
//! 3. the `AWS_PROFILE` environment variable,
//! 4. the fixed fallback profile.

pub mod mcp_config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config_locations::{ConfigCatalog, SystemCatalog};
use crate::constants::{AWS_PROFILE_ENV_VAR, FALLBACK_AWS_PROFILE};
use crate::env::{EnvProvider, SystemEnv};

pub use mcp_config::{ConfigFiles, SystemFiles};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSource {
    Parameter,
    McpConfig,
    Environment,
    Fallback,
}

impl std::fmt::Display for ProfileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileSource::Parameter => write!(f, "parameter"),
            ProfileSource::McpConfig => write!(f, "mcp_config"),
            ProfileSource::Environment => write!(f, "environment"),
            ProfileSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// Where a resolved profile came from. Only the MCP variant carries a
/// config path and client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileOrigin {
    Parameter,
    McpConfig { config_path: PathBuf, client: String },
    Environment,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileResolution {
    pub profile: String,
    pub origin: ProfileOrigin,
}

impl ProfileResolution {
    pub fn new(profile: impl Into<String>, origin: ProfileOrigin) -> Self {
        Self {
            profile: profile.into(),
            origin,
        }
    }

    pub fn source(&self) -> ProfileSource {
        match self.origin {
            ProfileOrigin::Parameter => ProfileSource::Parameter,
            ProfileOrigin::McpConfig { .. } => ProfileSource::McpConfig,
            ProfileOrigin::Environment => ProfileSource::Environment,
            ProfileOrigin::Fallback => ProfileSource::Fallback,
        }
    }

    pub fn config_path(&self) -> Option<&Path> {
        match &self.origin {
            ProfileOrigin::McpConfig { config_path, .. } => Some(config_path),
            _ => None,
        }
    }

    pub fn mcp_client(&self) -> Option<&str> {
        match &self.origin {
            ProfileOrigin::McpConfig { client, .. } => Some(client),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileRequest {
    pub explicit_profile: Option<String>,
    pub server_name: Option<String>,
}

impl ProfileRequest {
    pub fn new(explicit_profile: Option<String>, server_name: Option<String>) -> Self {
        Self {
            explicit_profile,
            server_name,
        }
    }
}

/// One tier of the resolution order.
pub trait ProfileStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn resolve(&self, request: &ProfileRequest) -> Option<ProfileResolution>;
}

pub struct ExplicitProfile;

impl ProfileStrategy for ExplicitProfile {
    fn name(&self) -> &'static str {
        "parameter"
    }

    fn resolve(&self, request: &ProfileRequest) -> Option<ProfileResolution> {
        request
            .explicit_profile
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| ProfileResolution::new(p, ProfileOrigin::Parameter))
    }
}

pub struct McpConfigProfile {
    catalog: Arc<dyn ConfigCatalog>,
    files: Arc<dyn ConfigFiles>,
}

impl McpConfigProfile {
    pub fn new(catalog: Arc<dyn ConfigCatalog>, files: Arc<dyn ConfigFiles>) -> Self {
        Self { catalog, files }
    }
}

impl ProfileStrategy for McpConfigProfile {
    fn name(&self) -> &'static str {
        "mcp_config"
    }

    fn resolve(&self, request: &ProfileRequest) -> Option<ProfileResolution> {
        let server = request.server_name.as_deref().filter(|s| !s.is_empty())?;
        let found =
            mcp_config::find_server_profile(self.catalog.as_ref(), self.files.as_ref(), server)?;
        Some(ProfileResolution::new(
            found.profile,
            ProfileOrigin::McpConfig {
                config_path: found.config_path,
                client: found.client,
            },
        ))
    }
}

pub struct EnvironmentProfile {
    env: Arc<dyn EnvProvider>,
}

impl EnvironmentProfile {
    pub fn new(env: Arc<dyn EnvProvider>) -> Self {
        Self { env }
    }
}

impl ProfileStrategy for EnvironmentProfile {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn resolve(&self, _request: &ProfileRequest) -> Option<ProfileResolution> {
        self.env
            .get_non_empty(AWS_PROFILE_ENV_VAR)
            .map(|p| ProfileResolution::new(p, ProfileOrigin::Environment))
    }
}

pub struct FallbackProfile;

impl ProfileStrategy for FallbackProfile {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn resolve(&self, _request: &ProfileRequest) -> Option<ProfileResolution> {
        Some(ProfileResolution::new(
            FALLBACK_AWS_PROFILE,
            ProfileOrigin::Fallback,
        ))
    }
}

pub struct ProfileResolver {
    strategies: Vec<Box<dyn ProfileStrategy>>,
}

impl ProfileResolver {
    /// Standard resolution order over the given collaborators.
    pub fn new(
        catalog: Arc<dyn ConfigCatalog>,
        files: Arc<dyn ConfigFiles>,
        env: Arc<dyn EnvProvider>,
    ) -> Self {
        Self::with_strategies(vec![
            Box::new(ExplicitProfile),
            Box::new(McpConfigProfile::new(catalog, files)),
            Box::new(EnvironmentProfile::new(env.clone())),
            Box::new(FallbackProfile),
        ])
    }

    pub fn system() -> Self {
        let env: Arc<dyn EnvProvider> = Arc::new(SystemEnv);
        Self::new(
            Arc::new(SystemCatalog::new(env.clone())),
            Arc::new(SystemFiles),
            env,
        )
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ProfileStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn resolve(&self, request: &ProfileRequest) -> ProfileResolution {
        let (tier, resolution) = self
            .strategies
            .iter()
            .find_map(|s| s.resolve(request).map(|r| (s.name(), r)))
            .unwrap_or_else(|| {
                (
                    "fallback",
                    ProfileResolution::new(FALLBACK_AWS_PROFILE, ProfileOrigin::Fallback),
                )
            });

        debug!(tier, profile = %resolution.profile, "Resolved AWS profile");
        resolution
    }
}
