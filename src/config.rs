use crate::constants::{LOG_ENV_VAR, SERVER_NAME_ENV_VAR};
use crate::env::EnvProvider;

const DEFAULT_LOG_FILTER: &str = "info";

/// Runtime settings for the server and CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Name of this server's entry in MCP client configs, used when a tool
    /// call does not name one.
    pub default_server: Option<String>,
    pub log_filter: String,
}

impl Settings {
    /// From values that already carry their environment fallback (clap's
    /// `env = ...`). Empty values count as unset.
    pub fn new(server: Option<String>, log_filter: Option<String>) -> Self {
        Self {
            default_server: server.filter(|s| !s.is_empty()),
            log_filter: log_filter
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }

    /// Priority: explicit value > environment > default. For embedding
    /// without the CLI.
    pub fn resolve(
        cli_server: Option<String>,
        cli_log_filter: Option<String>,
        env: &dyn EnvProvider,
    ) -> Self {
        Self::new(
            cli_server
                .filter(|s| !s.is_empty())
                .or_else(|| env.get_non_empty(SERVER_NAME_ENV_VAR)),
            cli_log_filter
                .filter(|s| !s.is_empty())
                .or_else(|| env.get_non_empty(LOG_ENV_VAR)),
        )
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_server: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::StaticEnv;

    #[test]
    fn test_new_applies_defaults_only() {
        assert_eq!(Settings::new(None, None), Settings::default());
        assert_eq!(
            Settings::new(Some(String::new()), Some(String::new())),
            Settings::default()
        );
        let settings = Settings::new(Some("aws-sso".to_string()), Some("debug".to_string()));
        assert_eq!(settings.default_server.as_deref(), Some("aws-sso"));
        assert_eq!(settings.log_filter, "debug");
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(None, None, &StaticEnv::new());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_env_overrides_default() {
        let env = StaticEnv::new()
            .with_var(SERVER_NAME_ENV_VAR, "aws-sso")
            .with_var(LOG_ENV_VAR, "debug");
        let settings = Settings::resolve(None, None, &env);
        assert_eq!(settings.default_server.as_deref(), Some("aws-sso"));
        assert_eq!(settings.log_filter, "debug");
    }

    #[test]
    fn test_cli_overrides_env() {
        let env = StaticEnv::new()
            .with_var(SERVER_NAME_ENV_VAR, "aws-sso")
            .with_var(LOG_ENV_VAR, "debug");
        let settings = Settings::resolve(
            Some("sso-refresh".to_string()),
            Some("warn".to_string()),
            &env,
        );
        assert_eq!(settings.default_server.as_deref(), Some("sso-refresh"));
        assert_eq!(settings.log_filter, "warn");
    }
}
