use std::sync::LazyLock;

use garde::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aws_profiles;
use crate::constants::{
    LIST_PROFILES_TOOL_DESCRIPTION, LIST_PROFILES_TOOL_NAME, MAX_PROFILE_NAME_LEN,
    MAX_SERVER_NAME_LEN, REFRESH_TOOL_DESCRIPTION, REFRESH_TOOL_NAME,
};
use crate::env::EnvProvider;
use crate::error::ArgumentError;
use crate::refresh::SsoRefresher;

static PROFILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

#[derive(Debug, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Debug, Serialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

#[derive(Debug, Serialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

impl ToolResult {
    fn text(text: String, is_error: bool) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text,
            }],
            is_error,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RefreshArgs {
    #[garde(custom(validate_profile_name))]
    pub profile: Option<String>,
    #[garde(length(min = 1, max = 256))]
    pub server: Option<String>,
}

fn validate_profile_name(value: &Option<String>, _ctx: &()) -> garde::Result {
    let Some(profile) = value else {
        return Ok(());
    };
    if profile.len() > MAX_PROFILE_NAME_LEN {
        return Err(garde::Error::new(format!(
            "must be at most {MAX_PROFILE_NAME_LEN} characters"
        )));
    }
    if !PROFILE_NAME.is_match(profile) {
        return Err(garde::Error::new(
            "may only contain letters, digits, '_' and '-'",
        ));
    }
    Ok(())
}

impl RefreshArgs {
    /// Deserialize and validate; empty strings count as omitted.
    pub fn parse(arguments: &Value) -> Result<Self, ArgumentError> {
        let mut args: RefreshArgs = if arguments.is_null() {
            RefreshArgs::default()
        } else {
            serde_json::from_value(arguments.clone())?
        };
        args.profile = args.profile.filter(|p| !p.is_empty());
        args.server = args.server.filter(|s| !s.is_empty());
        args.validate()?;
        Ok(args)
    }
}

pub fn list_tools() -> Vec<ToolInfo> {
    vec![
        ToolInfo {
            name: REFRESH_TOOL_NAME.to_string(),
            description: REFRESH_TOOL_DESCRIPTION.to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "profile": {
                        "type": "string",
                        "pattern": "^[A-Za-z0-9_-]+$",
                        "maxLength": MAX_PROFILE_NAME_LEN,
                        "description": "AWS profile name to refresh. Takes priority over every other source."
                    },
                    "server": {
                        "type": "string",
                        "maxLength": MAX_SERVER_NAME_LEN,
                        "description": "Name of an MCP server whose config declares AWS_PROFILE in its env block"
                    }
                },
                "required": []
            }),
        },
        ToolInfo {
            name: LIST_PROFILES_TOOL_NAME.to_string(),
            description: LIST_PROFILES_TOOL_DESCRIPTION.to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
    ]
}

pub async fn call_tool(
    name: &str,
    arguments: &Value,
    refresher: &SsoRefresher,
    env: &dyn EnvProvider,
) -> ToolResult {
    let result = match name {
        REFRESH_TOOL_NAME => tool_refresh(arguments, refresher).await,
        LIST_PROFILES_TOOL_NAME => tool_list_profiles(env).await,
        _ => Err(anyhow::anyhow!("Unknown tool: {}", name)),
    };

    match result {
        Ok(text) => ToolResult::text(text, false),
        Err(e) => ToolResult::text(format!("Error: {}", e), true),
    }
}

async fn tool_refresh(arguments: &Value, refresher: &SsoRefresher) -> anyhow::Result<String> {
    let args = RefreshArgs::parse(arguments)?;
    let result = refresher.refresh(args.profile, args.server).await;
    Ok(serde_json::to_string_pretty(&result)?)
}

async fn tool_list_profiles(env: &dyn EnvProvider) -> anyhow::Result<String> {
    let profiles = aws_profiles::list_aws_profiles(env).await?;
    Ok(serde_json::to_string_pretty(&profiles)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_refresh_args_accept_valid_input() {
        let args = RefreshArgs::parse(&json!({ "profile": "dev_Admin-1", "server": "aws-sso" }))
            .unwrap();
        assert_eq!(args.profile.as_deref(), Some("dev_Admin-1"));
        assert_eq!(args.server.as_deref(), Some("aws-sso"));
    }

    #[test]
    fn test_refresh_args_treat_empty_as_missing() {
        let args = RefreshArgs::parse(&json!({ "profile": "", "server": "" })).unwrap();
        assert!(args.profile.is_none());
        assert!(args.server.is_none());
        assert!(RefreshArgs::parse(&Value::Null).unwrap().profile.is_none());
    }

    #[test]
    fn test_refresh_args_reject_bad_profile_names() {
        for profile in ["dev profile", "dev;rm -rf", "prod/admin", "üser"] {
            assert!(
                matches!(
                    RefreshArgs::parse(&json!({ "profile": profile })),
                    Err(ArgumentError::Invalid(_))
                ),
                "{profile}"
            );
        }
        let long = "a".repeat(MAX_PROFILE_NAME_LEN + 1);
        assert!(RefreshArgs::parse(&json!({ "profile": long })).is_err());
    }

    #[test]
    fn test_refresh_args_reject_long_server_name() {
        let long = "s".repeat(MAX_SERVER_NAME_LEN + 1);
        assert!(RefreshArgs::parse(&json!({ "server": long })).is_err());
        let max = "s".repeat(MAX_SERVER_NAME_LEN);
        assert!(RefreshArgs::parse(&json!({ "server": max })).is_ok());
    }

    #[test]
    fn test_refresh_args_reject_wrong_types() {
        assert!(matches!(
            RefreshArgs::parse(&json!({ "profile": 5 })),
            Err(ArgumentError::Malformed(_))
        ));
    }

    #[test]
    fn test_tool_listing() {
        let tools = list_tools();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec![REFRESH_TOOL_NAME, LIST_PROFILES_TOOL_NAME]);
        assert_eq!(
            tools[0].input_schema["properties"]["profile"]["maxLength"],
            MAX_PROFILE_NAME_LEN
        );
    }
}
