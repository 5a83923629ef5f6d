//! Runs `aws sso login` for a resolved profile and reports the outcome.
//!
//! Every path ends in an [`SsoRefreshResult`]: an untrusted or missing CLI,
//! a spawn failure, a non-zero exit and a timeout are all reported as
//! `success: false` values rather than errors. Output captured from the CLI
//! is only ever logged, never returned to the caller.

pub mod process;

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::SSO_LOGIN_TIMEOUT;
use crate::env::{EnvProvider, SystemEnv};
use crate::platform::Platform;
use crate::profile::{ProfileResolution, ProfileSource};
use crate::trusted::{ResolveExecutable, TrustedExecutableResolver};

pub use process::{LaunchSpec, LoginProcess, ProcessExit, ProcessLauncher, TokioLauncher};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsoRefreshResult {
    pub success: bool,
    pub profile: String,
    pub profile_source: ProfileSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp_client: Option<String>,
    pub message: String,
}

impl SsoRefreshResult {
    fn for_resolution(resolution: &ProfileResolution, success: bool, message: String) -> Self {
        Self {
            success,
            profile: resolution.profile.clone(),
            profile_source: resolution.source(),
            config_path: resolution.config_path().map(PathBuf::from),
            mcp_client: resolution.mcp_client().map(str::to_string),
            message,
        }
    }
}

/// `PATH` plus the allow-listed variables that are set in `env`.
pub fn login_environment(
    platform: &Platform,
    env: &dyn EnvProvider,
    search_path: &str,
) -> Vec<(String, OsString)> {
    let mut vars = vec![("PATH".to_string(), OsString::from(search_path))];
    for key in platform.env_allow_list {
        if let Some(value) = env.get(key) {
            vars.push((key.to_string(), value));
        }
    }
    vars
}

pub fn login_args(profile: &str) -> Vec<String> {
    vec![
        "sso".to_string(),
        "login".to_string(),
        "--profile".to_string(),
        profile.to_string(),
    ]
}

/// `120 seconds`, or milliseconds when the timeout is not a whole second.
fn describe_timeout(timeout: Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        format!("{} seconds", timeout.as_secs())
    } else {
        format!("{} milliseconds", timeout.as_millis())
    }
}

enum Completion {
    Exited(std::io::Result<ProcessExit>),
    TimedOut,
}

pub struct CommandExecutor {
    resolver: Arc<dyn ResolveExecutable>,
    launcher: Arc<dyn ProcessLauncher>,
    env: Arc<dyn EnvProvider>,
    platform: Platform,
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(
        resolver: Arc<dyn ResolveExecutable>,
        launcher: Arc<dyn ProcessLauncher>,
        env: Arc<dyn EnvProvider>,
    ) -> Self {
        Self {
            resolver,
            launcher,
            env,
            platform: Platform::current().clone(),
            timeout: SSO_LOGIN_TIMEOUT,
        }
    }

    pub fn system() -> Self {
        Self::new(
            Arc::new(TrustedExecutableResolver::system()),
            Arc::new(TokioLauncher),
            Arc::new(SystemEnv),
        )
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn execute_login(&self, resolution: &ProfileResolution) -> SsoRefreshResult {
        let profile = resolution.profile.as_str();
        let fail = |message: String| SsoRefreshResult::for_resolution(resolution, false, message);

        if profile.starts_with('-') {
            warn!(%profile, "Refusing profile name that looks like a CLI flag");
            return fail(format!(
                "Refusing to run SSO login: profile name \"{profile}\" must not start with '-'."
            ));
        }

        let executable = match self.resolver.resolve().await {
            Ok(executable) => executable,
            Err(e) => {
                warn!(error = %e, "AWS CLI rejected");
                return fail(
                    "AWS CLI executable not found in a trusted location. \
                     Install the AWS CLI v2 with the official installer or a system package manager."
                        .to_string(),
                );
            }
        };

        let spec = LaunchSpec {
            program: executable.path.clone(),
            args: login_args(profile),
            env: login_environment(&self.platform, self.env.as_ref(), &executable.search_path),
        };

        info!(
            %profile,
            source = %resolution.source(),
            aws = %executable.path.display(),
            "Starting AWS SSO login"
        );

        let mut process = match self.launcher.launch(&spec) {
            Ok(process) => process,
            Err(e) => {
                warn!(error = %e, "Failed to spawn AWS CLI");
                return fail(format!("Failed to start SSO login: {e}"));
            }
        };

        let completion = tokio::select! {
            exit = process.wait() => Completion::Exited(exit),
            () = tokio::time::sleep(self.timeout) => Completion::TimedOut,
        };

        match completion {
            Completion::TimedOut => {
                if let Err(e) = process.kill().await {
                    debug!(error = %e, "Kill after timeout failed");
                }
                let waited = describe_timeout(self.timeout);
                warn!(%profile, timeout = %waited, "AWS SSO login timed out");
                fail(format!(
                    "SSO login timed out after {waited}. Please complete the browser authentication."
                ))
            }
            Completion::Exited(Err(e)) => {
                warn!(error = %e, "Waiting on AWS CLI failed");
                fail(format!("SSO login process failed for profile \"{profile}\": {e}"))
            }
            Completion::Exited(Ok(exit)) if exit.success() => {
                info!(%profile, "AWS SSO login completed");
                SsoRefreshResult::for_resolution(
                    resolution,
                    true,
                    format!("Successfully refreshed SSO token for profile \"{profile}\"."),
                )
            }
            Completion::Exited(Ok(exit)) => {
                // CLI diagnostics stay in the local log
                debug!(
                    code = ?exit.code,
                    stderr = %exit.stderr.trim(),
                    stdout = %exit.stdout.trim(),
                    "AWS CLI output"
                );
                warn!(%profile, code = ?exit.code, "AWS SSO login failed");
                fail(format!(
                    "SSO login failed for profile \"{profile}\". \
                     Verify that the profile exists and is configured for AWS SSO \
                     (see `aws configure sso`)."
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::StaticEnv;
    use crate::error::TrustError;
    use crate::platform::OsFamily;
    use crate::profile::ProfileOrigin;
    use crate::trusted::TrustedExecutable;
    use async_trait::async_trait;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedExecutable;

    #[async_trait]
    impl ResolveExecutable for FixedExecutable {
        async fn resolve(&self) -> Result<TrustedExecutable, TrustError> {
            Ok(TrustedExecutable {
                path: PathBuf::from("/usr/local/bin/aws"),
                search_path: "/usr/local/bin:/usr/bin".to_string(),
            })
        }
    }

    struct Untrusted;

    #[async_trait]
    impl ResolveExecutable for Untrusted {
        async fn resolve(&self) -> Result<TrustedExecutable, TrustError> {
            Err(TrustError::UntrustedLocation(PathBuf::from("/tmp/aws")))
        }
    }

    #[derive(Clone, Copy)]
    enum Script {
        Exit(i32),
        Hang,
        SpawnError,
    }

    struct ScriptedLauncher {
        script: Script,
        launches: Mutex<Vec<LaunchSpec>>,
        kills: Arc<AtomicUsize>,
    }

    impl ScriptedLauncher {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                launches: Mutex::new(Vec::new()),
                kills: Arc::new(AtomicUsize::new(0)),
            })
        }
    }

    struct ScriptedProcess {
        script: Script,
        kills: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LoginProcess for ScriptedProcess {
        async fn wait(&mut self) -> io::Result<ProcessExit> {
            match self.script {
                Script::Exit(code) => Ok(ProcessExit {
                    code: Some(code),
                    stdout: "CLI STDOUT CHATTER".to_string(),
                    stderr: "CLI STDERR SECRET".to_string(),
                }),
                _ => std::future::pending().await,
            }
        }

        async fn kill(&mut self) -> io::Result<()> {
            self.kills.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl ProcessLauncher for ScriptedLauncher {
        fn launch(&self, spec: &LaunchSpec) -> io::Result<Box<dyn LoginProcess>> {
            self.launches.lock().unwrap().push(spec.clone());
            if let Script::SpawnError = self.script {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
            }
            Ok(Box::new(ScriptedProcess {
                script: self.script,
                kills: self.kills.clone(),
            }))
        }
    }

    fn executor(
        resolver: Arc<dyn ResolveExecutable>,
        launcher: Arc<ScriptedLauncher>,
    ) -> CommandExecutor {
        let env = StaticEnv::new()
            .with_var("HOME", "/home/dev")
            .with_var("LD_PRELOAD", "/tmp/evil.so")
            .with_var("AWS_ACCESS_KEY_ID", "AKIA...");
        CommandExecutor::new(resolver, launcher, Arc::new(env))
            .with_platform(Platform::for_family(OsFamily::Other))
    }

    fn mcp_resolution() -> ProfileResolution {
        ProfileResolution::new(
            "dev",
            ProfileOrigin::McpConfig {
                config_path: PathBuf::from("/work/.mcp.json"),
                client: "Claude Code".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_success_message_names_profile_without_output() {
        let launcher = ScriptedLauncher::new(Script::Exit(0));
        let result = executor(Arc::new(FixedExecutable), launcher.clone())
            .execute_login(&mcp_resolution())
            .await;

        assert!(result.success);
        assert!(result.message.contains("\"dev\""));
        assert!(!result.message.contains("CLI STDOUT CHATTER"));
        assert_eq!(result.profile_source, ProfileSource::McpConfig);
        assert_eq!(result.config_path, Some(PathBuf::from("/work/.mcp.json")));
        assert_eq!(result.mcp_client.as_deref(), Some("Claude Code"));
    }

    #[tokio::test]
    async fn test_launch_uses_trusted_path_args_and_minimal_env() {
        let launcher = ScriptedLauncher::new(Script::Exit(0));
        executor(Arc::new(FixedExecutable), launcher.clone())
            .execute_login(&mcp_resolution())
            .await;

        let launches = launcher.launches.lock().unwrap();
        assert_eq!(launches.len(), 1);
        let spec = &launches[0];
        assert_eq!(spec.program, PathBuf::from("/usr/local/bin/aws"));
        assert_eq!(spec.args, vec!["sso", "login", "--profile", "dev"]);
        let keys: Vec<&str> = spec.env.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["PATH", "HOME"]);
        assert_eq!(spec.env[0].1, OsString::from("/usr/local/bin:/usr/bin"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_generic_failure() {
        let launcher = ScriptedLauncher::new(Script::Exit(1));
        let result = executor(Arc::new(FixedExecutable), launcher)
            .execute_login(&mcp_resolution())
            .await;

        assert!(!result.success);
        assert!(result.message.contains("configured for AWS SSO"));
        assert!(!result.message.contains("CLI STDERR SECRET"));
        assert!(!result.message.contains("CLI STDOUT CHATTER"));
        assert_eq!(result.mcp_client.as_deref(), Some("Claude Code"));
    }

    #[tokio::test]
    async fn test_timeout_kills_process_once() {
        let launcher = ScriptedLauncher::new(Script::Hang);
        let result = executor(Arc::new(FixedExecutable), launcher.clone())
            .with_timeout(Duration::from_millis(20))
            .execute_login(&mcp_resolution())
            .await;

        assert!(!result.success);
        assert!(result.message.contains("timed out after 20 milliseconds"));
        assert!(result.message.contains("browser"));
        assert_eq!(launcher.kills.load(Ordering::SeqCst), 1);
        assert_eq!(result.config_path, Some(PathBuf::from("/work/.mcp.json")));
    }

    #[tokio::test]
    async fn test_spawn_error_reports_cause_without_waiting() {
        let launcher = ScriptedLauncher::new(Script::SpawnError);
        let started = std::time::Instant::now();
        let result = executor(Arc::new(FixedExecutable), launcher.clone())
            .with_timeout(Duration::from_secs(3600))
            .execute_login(&ProfileResolution::new("dev", ProfileOrigin::Parameter))
            .await;

        assert!(!result.success);
        assert!(result.message.starts_with("Failed to start SSO login"));
        assert!(result.message.contains("permission denied"));
        assert!(started.elapsed() < Duration::from_secs(60));
        assert_eq!(launcher.kills.load(Ordering::SeqCst), 0);
        assert_eq!(result.config_path, None);
    }

    #[tokio::test]
    async fn test_untrusted_executable_never_spawns() {
        let launcher = ScriptedLauncher::new(Script::Exit(0));
        let result = executor(Arc::new(Untrusted), launcher.clone())
            .execute_login(&ProfileResolution::new("dev", ProfileOrigin::Fallback))
            .await;

        assert!(!result.success);
        assert!(result.message.contains("trusted location"));
        assert!(!result.message.contains("/tmp/aws"));
        assert!(launcher.launches.lock().unwrap().is_empty());
        assert_eq!(result.profile_source, ProfileSource::Fallback);
    }

    #[tokio::test]
    async fn test_flag_like_profile_is_refused() {
        let launcher = ScriptedLauncher::new(Script::Exit(0));
        let result = executor(Arc::new(FixedExecutable), launcher.clone())
            .execute_login(&ProfileResolution::new(
                "--endpoint-url=http://attacker",
                ProfileOrigin::Environment,
            ))
            .await;

        assert!(!result.success);
        assert!(launcher.launches.lock().unwrap().is_empty());
    }

    #[test]
    fn test_timeout_description() {
        assert_eq!(describe_timeout(SSO_LOGIN_TIMEOUT), "120 seconds");
        assert_eq!(describe_timeout(Duration::from_millis(1500)), "1500 milliseconds");
        assert_eq!(describe_timeout(Duration::from_millis(200)), "200 milliseconds");
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = SsoRefreshResult::for_resolution(&mcp_resolution(), true, "ok".to_string());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["profileSource"], "mcp_config");
        assert_eq!(json["mcpClient"], "Claude Code");
        assert_eq!(json["configPath"], "/work/.mcp.json");

        let plain = SsoRefreshResult::for_resolution(
            &ProfileResolution::new("dev", ProfileOrigin::Parameter),
            false,
            "no".to_string(),
        );
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("configPath").is_none());
        assert!(json.get("mcpClient").is_none());
    }

    #[test]
    fn test_login_environment_windows_allow_list() {
        let env = StaticEnv::new()
            .with_var("SystemRoot", r"C:\Windows")
            .with_var("ComSpec", r"C:\Windows\System32\cmd.exe")
            .with_var("PATHEXT", ".EXE")
            .with_var("USERPROFILE", r"C:\Users\dev");
        let vars = login_environment(
            &Platform::for_family(OsFamily::Windows),
            &env,
            r"C:\Program Files\Amazon\AWSCLIV2",
        );
        let keys: Vec<&str> = vars.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["PATH", "USERPROFILE", "SystemRoot", "ComSpec"]);
    }
}
