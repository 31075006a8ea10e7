//! Child process runner for the CLI engines

use crate::domain::engines::EngineError;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Keep at most this much stderr in errors
const STDERR_TAIL: usize = 2048;

/// Run `cmd` to completion within `limit`, returning its stdout
///
/// The child is killed if the future is dropped or the limit elapses.
pub async fn run_tool(
    mut cmd: Command,
    tool: &str,
    limit: Duration,
) -> Result<Vec<u8>, EngineError> {
    cmd.kill_on_drop(true)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let child = cmd.spawn().map_err(|source| EngineError::Spawn {
        tool: tool.to_string(),
        source,
    })?;

    let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
        Ok(result) => result.map_err(|source| EngineError::Spawn {
            tool: tool.to_string(),
            source,
        })?,
        Err(_) => {
            return Err(EngineError::Timeout {
                tool: tool.to_string(),
                after: limit,
            });
        }
    };

    if !output.status.success() {
        return Err(EngineError::Failed {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr: stderr_tail(&output.stderr),
        });
    }

    tracing::debug!(tool, stdout_bytes = output.stdout.len(), "Tool finished");
    Ok(output.stdout)
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_TAIL {
        return text.to_string();
    }
    let mut start = text.len() - STDERR_TAIL;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_tail_truncates() {
        let long = "x".repeat(STDERR_TAIL + 10);
        assert_eq!(stderr_tail(long.as_bytes()).len(), STDERR_TAIL);
        assert_eq!(stderr_tail(b"  oops \n"), "oops");
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let cmd = Command::new("definitely-not-a-real-tool-4f2a");
        let err = run_tool(cmd, "missing", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Spawn { .. }));
    }
}
