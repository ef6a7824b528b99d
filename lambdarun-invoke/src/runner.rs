//! Draining a started container run into a [`RunResult`]

use crate::launcher::{OutputReader, ProcessHandle};
use crate::options::Encoding;
use lambdarun_core::{InvokeError, RunResult};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Wait for a started process, logging and accumulating its output.
///
/// Both streams are read concurrently, line by line. Each line is logged
/// without its trailing newline and appended verbatim to that stream's
/// buffer. Exit code 0 yields `Ok`; any other code yields
/// [`InvokeError::NonZeroExit`] carrying the same result. The process is
/// waited on even when reading a stream fails; the read error comes after.
pub async fn run_to_completion(
    mut handle: Box<dyn ProcessHandle>,
    encoding: Encoding,
) -> Result<RunResult, InvokeError> {
    info!("run docker");

    let stdout = handle.take_stdout();
    let stderr = handle.take_stderr();
    let (stdout, stderr) = tokio::join!(
        drain(stdout, encoding, "stdout"),
        drain(stderr, encoding, "stderr")
    );

    // Reap the child even when a stream failed
    let code = handle.wait().await;
    let (stdout, stderr, code) = (stdout?, stderr?, code?);
    let result = RunResult {
        code,
        stdout,
        stderr,
    };

    if result.success() {
        Ok(result)
    } else {
        warn!(code = result.code, "Container exited with non-zero code");
        Err(InvokeError::NonZeroExit(result))
    }
}

async fn drain(
    reader: Option<OutputReader>,
    encoding: Encoding,
    stream: &'static str,
) -> Result<String, InvokeError> {
    let Some(reader) = reader else {
        return Ok(String::new());
    };

    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    let mut output = String::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        let chunk = encoding.decode(&line);
        info!(stream, "{}", chunk.strip_suffix('\n').unwrap_or(&chunk));
        output.push_str(&chunk);
    }

    Ok(output)
}
