//! Lookup of a server's declared `AWS_PROFILE` inside MCP client config files.

use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::config_locations::{ConfigCatalog, ConfigLocation};
use crate::constants::AWS_PROFILE_ENV_VAR;
use crate::error::ConfigReadError;

/// Read-only file access used by the lookup.
pub trait ConfigFiles: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFiles;

impl ConfigFiles for SystemFiles {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpProfileMatch {
    pub profile: String,
    pub config_path: PathBuf,
    pub client: String,
}

/// Extracts `mcpServers.<server>.env.AWS_PROFILE` from a parsed config.
/// Missing keys, wrong types and empty strings all count as a miss.
pub fn declared_profile(config: &Value, server: &str) -> Option<String> {
    config
        .get("mcpServers")
        .and_then(|servers| servers.get(server))
        .and_then(|entry| entry.get("env"))
        .and_then(|env| env.get(AWS_PROFILE_ENV_VAR))
        .and_then(Value::as_str)
        .filter(|profile| !profile.is_empty())
        .map(str::to_string)
}

/// Reads one location. `Ok(None)` when the file is absent or declares nothing.
pub fn profile_at_location(
    files: &dyn ConfigFiles,
    location: &ConfigLocation,
    server: &str,
) -> Result<Option<String>, ConfigReadError> {
    if !files.exists(&location.path) {
        return Ok(None);
    }

    let contents = files
        .read_to_string(&location.path)
        .map_err(|source| ConfigReadError::Io {
            path: location.path.clone(),
            source,
        })?;
    let config: Value =
        serde_json::from_str(&contents).map_err(|source| ConfigReadError::Parse {
            path: location.path.clone(),
            source,
        })?;

    Ok(declared_profile(&config, server))
}

/// Scans the catalog in order and stops at the first location declaring a
/// profile for `server`. Unreadable or malformed files are skipped.
pub fn find_server_profile(
    catalog: &dyn ConfigCatalog,
    files: &dyn ConfigFiles,
    server: &str,
) -> Option<McpProfileMatch> {
    for location in catalog.locations() {
        match profile_at_location(files, &location, server) {
            Ok(Some(profile)) => {
                return Some(McpProfileMatch {
                    profile,
                    config_path: location.path,
                    client: location.client,
                });
            }
            Ok(None) => {}
            Err(e) => {
                debug!(error = %e, client = %location.client, "Skipping unusable MCP config");
            }
        }
    }
    None
}
