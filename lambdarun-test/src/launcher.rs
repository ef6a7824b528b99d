//! Scripted process launcher

use async_trait::async_trait;
use lambdarun_core::InvokeError;
use lambdarun_invoke::{OutputReader, ProcessHandle, ProcessLauncher, SpawnOptions};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::io::Cursor;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tracing::debug;

/// Scripted behaviour of one spawned process
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub code: i32,
    /// Reading stdout fails with an IO error
    pub broken_stdout: bool,
}

impl Script {
    /// A process that writes nothing and exits with `code`
    pub fn exit(code: i32) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    pub fn stdout(mut self, data: impl AsRef<[u8]>) -> Self {
        self.stdout.extend_from_slice(data.as_ref());
        self
    }

    pub fn stderr(mut self, data: impl AsRef<[u8]>) -> Self {
        self.stderr.extend_from_slice(data.as_ref());
        self
    }

    /// Make reads from stdout fail
    pub fn broken_stdout(mut self) -> Self {
        self.broken_stdout = true;
        self
    }
}

/// A recorded spawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRecord {
    pub program: String,
    pub args: Vec<String>,
    pub options: SpawnOptions,
}

/// Launcher that replays scripts instead of running programs.
///
/// Scripts are queued per program and consumed in order. A program with no
/// queued script exits 0 with no output.
#[derive(Default)]
pub struct ScriptedLauncher {
    scripts: Mutex<HashMap<String, VecDeque<Script>>>,
    missing: Mutex<HashSet<String>>,
    spawns: Mutex<Vec<SpawnRecord>>,
    waits: Arc<AtomicUsize>,
}

impl ScriptedLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a script for the next spawn of `program`
    pub fn script(&self, program: &str, script: Script) {
        self.scripts
            .lock()
            .entry(program.to_string())
            .or_default()
            .push_back(script);
    }

    /// Make every spawn of `program` fail as if the binary were missing
    pub fn missing(&self, program: &str) {
        self.missing.lock().insert(program.to_string());
    }

    /// All spawns so far, in order. Failed spawns are recorded too.
    pub fn spawns(&self) -> Vec<SpawnRecord> {
        self.spawns.lock().clone()
    }

    /// Number of processes that have been waited on
    pub fn waits(&self) -> usize {
        self.waits.load(Ordering::SeqCst)
    }

    /// Spawns of one program
    pub fn spawns_of(&self, program: &str) -> Vec<SpawnRecord> {
        self.spawns
            .lock()
            .iter()
            .filter(|s| s.program == program)
            .cloned()
            .collect()
    }
}

impl ProcessLauncher for ScriptedLauncher {
    fn spawn(
        &self,
        program: &str,
        args: &[String],
        options: &SpawnOptions,
    ) -> Result<Box<dyn ProcessHandle>, InvokeError> {
        self.spawns.lock().push(SpawnRecord {
            program: program.to_string(),
            args: args.to_vec(),
            options: options.clone(),
        });

        if self.missing.lock().contains(program) {
            return Err(InvokeError::spawn(
                program,
                std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            ));
        }

        let script = self
            .scripts
            .lock()
            .get_mut(program)
            .and_then(VecDeque::pop_front)
            .unwrap_or_default();

        debug!(program = %program, code = script.code, "Replaying scripted process");

        let stdout: OutputReader = if script.broken_stdout {
            Box::new(BrokenReader)
        } else {
            Box::new(Cursor::new(script.stdout))
        };

        Ok(Box::new(ScriptedProcess {
            stdout: Some(stdout),
            stderr: Some(Box::new(Cursor::new(script.stderr))),
            code: script.code,
            waits: Arc::clone(&self.waits),
        }))
    }
}

struct ScriptedProcess {
    stdout: Option<OutputReader>,
    stderr: Option<OutputReader>,
    code: i32,
    waits: Arc<AtomicUsize>,
}

/// Reader that fails on every read
struct BrokenReader;

impl AsyncRead for BrokenReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Poll::Ready(Err(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "stream closed unexpectedly",
        )))
    }
}

#[async_trait]
impl ProcessHandle for ScriptedProcess {
    fn take_stdout(&mut self) -> Option<OutputReader> {
        self.stdout.take()
    }

    fn take_stderr(&mut self) -> Option<OutputReader> {
        self.stderr.take()
    }

    async fn wait(&mut self) -> Result<i32, InvokeError> {
        self.waits.fetch_add(1, Ordering::SeqCst);
        Ok(self.code)
    }
}
