//! Process launching
//!
//! The invoker never creates subprocesses directly. It goes through a
//! [`ProcessLauncher`], so tests can replay scripted output instead of
//! running a real container CLI.

use crate::options::SpawnOptions;
use async_trait::async_trait;
use lambdarun_core::InvokeError;
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};
use tracing::debug;

/// One output stream of a spawned process
pub type OutputReader = Box<dyn AsyncRead + Send + Unpin>;

/// A started process
#[async_trait]
pub trait ProcessHandle: Send {
    /// Take the stdout reader. Returns `None` once taken.
    fn take_stdout(&mut self) -> Option<OutputReader>;

    /// Take the stderr reader. Returns `None` once taken.
    fn take_stderr(&mut self) -> Option<OutputReader>;

    /// Wait for the process to exit and return its exit code
    async fn wait(&mut self) -> Result<i32, InvokeError>;
}

/// Starts processes without waiting on them
pub trait ProcessLauncher: Send + Sync {
    fn spawn(
        &self,
        program: &str,
        args: &[String],
        options: &SpawnOptions,
    ) -> Result<Box<dyn ProcessHandle>, InvokeError>;
}

/// Launcher backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioLauncher;

impl ProcessLauncher for TokioLauncher {
    fn spawn(
        &self,
        program: &str,
        args: &[String],
        options: &SpawnOptions,
    ) -> Result<Box<dyn ProcessHandle>, InvokeError> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(cwd) = &options.cwd {
            command.current_dir(cwd);
        }
        command.envs(&options.env);

        let child = command
            .spawn()
            .map_err(|e| InvokeError::spawn(program, e))?;

        debug!(program = %program, pid = ?child.id(), "Spawned process");

        Ok(Box::new(TokioProcess { child }))
    }
}

struct TokioProcess {
    child: Child,
}

#[async_trait]
impl ProcessHandle for TokioProcess {
    fn take_stdout(&mut self) -> Option<OutputReader> {
        self.child
            .stdout
            .take()
            .map(|s| Box::new(s) as OutputReader)
    }

    fn take_stderr(&mut self) -> Option<OutputReader> {
        self.child
            .stderr
            .take()
            .map(|s| Box::new(s) as OutputReader)
    }

    async fn wait(&mut self) -> Result<i32, InvokeError> {
        let status = self.child.wait().await?;
        Ok(exit_code(status))
    }
}

/// Exit code of a finished process; -1 when it was killed by a signal
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
