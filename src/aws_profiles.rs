//! AWS profile discovery from the shared AWS config file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::env::EnvProvider;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsProfileInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sso_start_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sso_session: Option<String>,
}

impl AwsProfileInfo {
    pub fn uses_sso(&self) -> bool {
        self.sso_start_url.is_some() || self.sso_session.is_some()
    }
}

/// `AWS_CONFIG_FILE` if set, else `~/.aws/config`.
pub fn aws_config_path(env: &dyn EnvProvider) -> PathBuf {
    if let Some(path) = env.get_non_empty("AWS_CONFIG_FILE") {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_default()
        .join(".aws")
        .join("config")
}

/// Parse the AWS config file and return its profiles. A missing file is an empty list.
pub async fn list_aws_profiles(env: &dyn EnvProvider) -> Result<Vec<AwsProfileInfo>> {
    let config_path = aws_config_path(env);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", config_path.display()))
        }
    };

    Ok(parse_aws_config(&content))
}

/// Line-by-line parser for AWS config INI files.
pub fn parse_aws_config(content: &str) -> Vec<AwsProfileInfo> {
    let mut profiles = Vec::new();
    let mut current: Option<AwsProfileInfo> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            profiles.extend(current.take());

            let section = trimmed[1..trimmed.len() - 1].trim();
            let name = if let Some(stripped) = section.strip_prefix("profile ") {
                Some(stripped.trim())
            } else if section == "default" {
                Some("default")
            } else {
                // [sso-session ...], [services ...]
                None
            };
            current = name.map(|name| AwsProfileInfo {
                name: name.to_string(),
                region: None,
                sso_start_url: None,
                sso_session: None,
            });
            continue;
        }

        let Some(profile) = current.as_mut() else {
            continue;
        };

        if let Some((key, value)) = trimmed.split_once('=') {
            let value = value.trim().to_string();
            match key.trim() {
                "region" => profile.region = Some(value),
                "sso_start_url" => profile.sso_start_url = Some(value),
                "sso_session" => profile.sso_session = Some(value),
                _ => {}
            }
        }
    }

    profiles.extend(current);
    profiles
}
