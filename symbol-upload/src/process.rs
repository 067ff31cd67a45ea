// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io;
use std::time::Duration;

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::{Child, Command},
};

use crate::error::UploadError;

// Keeps a single runaway line from flooding the log.
const MAX_LOG_LINE_LENGTH: usize = 8192;

/// Exit status of a finished process.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExitStatus {
    pub code: Option<i32>,
    pub signal: Option<i32>,
    pub success: bool,
}

impl From<std::process::ExitStatus> for ExitStatus {
    #[cfg(unix)]
    fn from(status: std::process::ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;

        Self {
            code: status.code(),
            signal: status.signal(),
            success: status.success(),
        }
    }

    #[cfg(not(unix))]
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
            signal: None,
            success: status.success(),
        }
    }
}

/// Output of a finished uploader process, split into lines.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProcessResult {
    pub exit_status: ExitStatus,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

fn for_log(line: &str) -> String {
    if line.len() <= MAX_LOG_LINE_LENGTH {
        return line.to_owned();
    }

    let mut end = MAX_LOG_LINE_LENGTH;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...<truncated>", &line[..end])
}

/// Read `stream` to the end, handing each line to `sink` as soon as it arrives.
pub async fn drain_lines(
    stream: impl AsyncRead + Unpin,
    mut sink: impl FnMut(String),
) -> io::Result<()> {
    let mut stream = BufReader::new(stream);
    loop {
        let mut buf = vec![];

        let bytes_read = stream.read_until(b'\n', &mut buf).await?;
        if bytes_read == 0 && buf.is_empty() {
            break;
        }

        if buf.ends_with(b"\n") {
            buf.pop();
            if buf.ends_with(b"\r") {
                buf.pop();
            }
        }
        sink(String::from_utf8_lossy(&buf).into_owned());
    }
    Ok(())
}

async fn monitor_stdout(
    context: &str,
    stream: impl AsyncRead + Unpin,
) -> io::Result<Vec<String>> {
    let mut lines = vec![];
    drain_lines(stream, |line| {
        info!("{} stdout: {}", context, for_log(&line));
        lines.push(line);
    })
    .await?;
    Ok(lines)
}

// Logged by the caller once the lines are classified.
async fn collect_stderr(stream: impl AsyncRead + Unpin) -> io::Result<Vec<String>> {
    let mut lines = vec![];
    drain_lines(stream, |line| lines.push(line)).await?;
    Ok(lines)
}

async fn wait_drained(context: &str, mut child: Child) -> Result<ProcessResult, UploadError> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "stdout not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "stderr not captured"))?;

    // Both pipes are read concurrently so a chatty child never blocks on a
    // full buffer while we wait on the other one.
    let (stdout, stderr) = futures::try_join!(
        monitor_stdout(context, stdout),
        collect_stderr(stderr)
    )?;

    debug!("waiting for child: {}", context);
    let status = child.wait().await?;
    debug!("child exited. {}:{:?}", context, status);

    Ok(ProcessResult {
        exit_status: status.into(),
        stdout,
        stderr,
    })
}

/// Spawn `cmd` with piped output and wait for it to finish.
///
/// If `timeout` elapses first, the child is killed and `UploadError::Timeout`
/// is returned.
pub async fn run_process(
    mut cmd: Command,
    context: &str,
    timeout: Option<Duration>,
) -> Result<ProcessResult, UploadError> {
    cmd.kill_on_drop(true)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped());

    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    let child = cmd
        .spawn()
        .map_err(|source| UploadError::Launch { program, source })?;

    match timeout {
        Some(limit) => match tokio::time::timeout(limit, wait_drained(context, child)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} did not finish within {:?}, killing it", context, limit);
                Err(UploadError::Timeout(limit))
            }
        },
        None => wait_drained(context, child).await,
    }
}
