//! Fixed names and limits shared across the server.

use std::time::Duration;

pub const SERVER_NAME: &str = "aws-sso-mcp";

pub const AWS_PROFILE_ENV_VAR: &str = "AWS_PROFILE";
pub const FALLBACK_AWS_PROFILE: &str = "default";

pub const REFRESH_TOOL_NAME: &str = "refresh_aws_sso_token";
pub const LIST_PROFILES_TOOL_NAME: &str = "list_aws_profiles";

pub const REFRESH_TOOL_DESCRIPTION: &str = "Initiates AWS SSO login flow to refresh expired authentication tokens. \
     This will open a browser window for the user to complete authentication. \
     Use this when AWS operations fail due to expired SSO tokens.";

pub const LIST_PROFILES_TOOL_DESCRIPTION: &str =
    "List the AWS profiles declared in the local AWS config file, with region and SSO hints.";

/// Wall-clock budget for the interactive browser step.
pub const SSO_LOGIN_TIMEOUT: Duration = Duration::from_secs(120);

/// Budget for the `which`/`where` lookup of the AWS CLI.
pub const EXECUTABLE_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

pub const MAX_PROFILE_NAME_LEN: usize = 128;
pub const MAX_SERVER_NAME_LEN: usize = 256;

/// Environment variable overriding the log filter.
pub const LOG_ENV_VAR: &str = "AWS_SSO_MCP_LOG";
/// Environment variable naming this server's own entry in MCP client configs.
pub const SERVER_NAME_ENV_VAR: &str = "AWS_SSO_MCP_SERVER_NAME";
