//! Child process lifecycle for the login command.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// Captured output beyond this many bytes per stream is discarded.
pub const MAX_CAPTURE_BYTES: usize = 64 * 1024;

/// How long the pipes may stay open after the process has exited.
/// Anything the CLI started (a browser, say) inherits them and may outlive it.
pub const OUTPUT_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// The complete child environment; nothing is inherited.
    pub env: Vec<(String, OsString)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExit {
    /// `None` when the process was ended by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[async_trait]
pub trait LoginProcess: Send {
    /// Resolves once the process has exited. Output still buffered in its
    /// pipes is collected for at most [`OUTPUT_GRACE`] afterwards.
    async fn wait(&mut self) -> io::Result<ProcessExit>;
    async fn kill(&mut self) -> io::Result<()>;
}

pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, spec: &LaunchSpec) -> io::Result<Box<dyn LoginProcess>>;
}

/// Spawns real processes on the tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioLauncher;

impl ProcessLauncher for TokioLauncher {
    fn launch(&self, spec: &LaunchSpec) -> io::Result<Box<dyn LoginProcess>> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .env_clear()
            .envs(spec.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;
        let stdout = child.stdout.take().map(|out| tokio::spawn(drain(out)));
        let stderr = child.stderr.take().map(|err| tokio::spawn(drain(err)));

        Ok(Box::new(TokioProcess {
            child,
            stdout,
            stderr,
        }))
    }
}

struct TokioProcess {
    child: Child,
    stdout: Option<JoinHandle<String>>,
    stderr: Option<JoinHandle<String>>,
}

#[async_trait]
impl LoginProcess for TokioProcess {
    async fn wait(&mut self) -> io::Result<ProcessExit> {
        let status = self.child.wait().await?;
        Ok(ProcessExit {
            code: status.code(),
            stdout: collect(self.stdout.take()).await,
            stderr: collect(self.stderr.take()).await,
        })
    }

    async fn kill(&mut self) -> io::Result<()> {
        self.child.kill().await
    }
}

/// Reads a pipe to EOF so the child never blocks on a full buffer.
async fn drain<R: AsyncRead + Unpin>(mut reader: R) -> String {
    let mut kept = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = MAX_CAPTURE_BYTES.saturating_sub(kept.len());
                kept.extend_from_slice(&buf[..n.min(room)]);
            }
        }
    }
    String::from_utf8_lossy(&kept).into_owned()
}

impl Drop for TokioProcess {
    fn drop(&mut self) {
        for handle in [self.stdout.take(), self.stderr.take()].into_iter().flatten() {
            handle.abort();
        }
    }
}

/// Output of a drain task, or nothing if its pipe is still held open once
/// the grace period ends.
async fn collect(handle: Option<JoinHandle<String>>) -> String {
    let Some(mut handle) = handle else {
        return String::new();
    };
    match tokio::time::timeout(OUTPUT_GRACE, &mut handle).await {
        Ok(output) => output.unwrap_or_default(),
        Err(_) => {
            handle.abort();
            String::new()
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> LaunchSpec {
        LaunchSpec {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".to_string(), script.to_string()],
            env: vec![("PATH".to_string(), OsString::from("/usr/bin:/bin"))],
        }
    }

    #[tokio::test]
    async fn test_captures_exit_code_and_output() {
        let mut process = TokioLauncher
            .launch(&sh("echo out; echo err >&2; exit 3"))
            .unwrap();
        let exit = process.wait().await.unwrap();
        assert_eq!(exit.code, Some(3));
        assert_eq!(exit.stdout.trim(), "out");
        assert_eq!(exit.stderr.trim(), "err");
        assert!(!exit.success());
    }

    #[tokio::test]
    async fn test_environment_is_not_inherited() {
        std::env::set_var("AWS_SSO_MCP_LEAK_CHECK", "leaked");
        let mut process = TokioLauncher
            .launch(&sh("echo \"${AWS_SSO_MCP_LEAK_CHECK:-clean}\""))
            .unwrap();
        let exit = process.wait().await.unwrap();
        assert_eq!(exit.stdout.trim(), "clean");
    }

    #[tokio::test]
    async fn test_kill_ends_long_running_process() {
        let mut process = TokioLauncher.launch(&sh("exec sleep 30")).unwrap();
        process.kill().await.unwrap();
        let exit = process.wait().await.unwrap();
        assert_ne!(exit.code, Some(0));
    }

    #[tokio::test]
    async fn test_exit_is_reported_while_background_child_holds_pipes() {
        let mut process = TokioLauncher
            .launch(&sh("sleep 30 &\necho started\nexit 0"))
            .unwrap();
        let started = std::time::Instant::now();
        let exit = process.wait().await.unwrap();
        assert!(exit.success());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_missing_program_fails_to_launch() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let _guard = runtime.enter();
        let spec = LaunchSpec {
            program: PathBuf::from("/nonexistent/aws"),
            args: Vec::new(),
            env: Vec::new(),
        };
        assert!(TokioLauncher.launch(&spec).is_err());
    }
}
