//! Subprocess execution with line-by-line capture into the run log

use crate::{
    error::{AppError, Result},
    logging::LogSink,
    runner::{classify::ProgressReporter, invocation::Invocation},
};
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// Exit code recorded when the runner cannot be started at all
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

const LINE_CHANNEL_CAPACITY: usize = 1024;

/// Run `invocation`, writing every stdout and stderr line to `sink` under
/// `label`, and return the process exit code.
///
/// Both pipes feed one channel with a single consumer, so each stream keeps
/// its own line order in the log.
pub async fn run_streaming(
    invocation: &Invocation,
    label: &str,
    sink: &LogSink,
    progress: &ProgressReporter,
) -> Result<i32> {
    let mut command = Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            sink.write(label, &format!("ERROR: failed to start '{}': {}", invocation.program, e))?;
            return Ok(SPAWN_FAILURE_EXIT_CODE);
        }
    };

    let (tx, mut rx) = mpsc::channel::<String>(LINE_CHANNEL_CAPACITY);
    let mut pumps = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        pumps.push(tokio::spawn(pump_lines(stdout, tx.clone())));
    }
    if let Some(stderr) = child.stderr.take() {
        pumps.push(tokio::spawn(pump_lines(stderr, tx.clone())));
    }
    drop(tx);

    while let Some(line) = rx.recv().await {
        sink.write(label, &line)?;
        progress.observe(&line);
    }

    let status = child.wait().await?;

    let pumped = futures::future::try_join_all(pumps)
        .await
        .map_err(|e| AppError::internal(format!("Output reader task failed: {}", e)))?;
    for result in pumped {
        result.map_err(|e| AppError::io(format!("Failed to read runner output: {}", e)))?;
    }

    Ok(exit_code_of(status))
}

/// Forward lines from `reader` until EOF or until the consumer goes away.
/// Invalid UTF-8 is replaced rather than dropped.
async fn pump_lines<R>(reader: R, tx: mpsc::Sender<String>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();

    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer).await? == 0 {
            return Ok(());
        }

        let line = String::from_utf8_lossy(&buffer)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        if tx.send(line).await.is_err() {
            return Ok(());
        }
    }
}

/// Exit status as an integer; signals map to `128 + signal` on unix
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pump_preserves_order_and_partial_last_line() {
        let input: &[u8] = b"first\r\nsecond\nthird without newline";
        let (tx, mut rx) = mpsc::channel(8);

        pump_lines(input, tx).await.unwrap();

        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }
        assert_eq!(lines, vec!["first", "second", "third without newline"]);
    }

    #[tokio::test]
    async fn test_pump_replaces_invalid_utf8() {
        let input: &[u8] = b"caf\xe9\n";
        let (tx, mut rx) = mpsc::channel(8);

        pump_lines(input, tx).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), "caf\u{FFFD}");
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_exit_code() {
        use std::os::unix::process::ExitStatusExt;
        // Raw wait status for termination by SIGKILL
        assert_eq!(exit_code_of(ExitStatus::from_raw(9)), 137);
        // Raw wait status for a normal exit with code 3
        assert_eq!(exit_code_of(ExitStatus::from_raw(3 << 8)), 3);
    }
}
