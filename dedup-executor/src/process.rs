//! Local process backend.
//!
//! Spawns invocations with `tokio::process`, enforces the time budget and
//! reaps killed children so no zombie outlives a timed-out run.
//!
//! On unix every child leads its own process group, so a terminal Ctrl-C
//! reaches only the harness and in-flight runs can finish.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::backend::{CommandBackend, Completion, ExecutionOutput, Invocation};
use crate::ExecutorError;

/// Runs invocations as local child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessBackend;

impl ProcessBackend {
    /// Create a new process backend.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandBackend for ProcessBackend {
    async fn execute(
        &self,
        invocation: &Invocation,
        timeout: Duration,
    ) -> Result<ExecutionOutput, ExecutorError> {
        let start = Instant::now();

        let stdout = if invocation.capture_stdout {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        if !tokio::fs::metadata(&invocation.current_dir)
            .await
            .is_ok_and(|meta| meta.is_dir())
        {
            return Err(ExecutorError::MissingWorkDir {
                path: invocation.current_dir.clone(),
            });
        }

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.current_dir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::null())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ExecutorError::ToolNotFound {
                program: invocation.program.clone(),
            },
            _ => ExecutorError::SpawnFailed(format!("exec {}: {e}", invocation.program)),
        })?;

        tracing::debug!(
            program = %invocation.program,
            dir = %invocation.current_dir.display(),
            "process started"
        );

        // Drain stdout concurrently so a chatty child never blocks on a full pipe.
        let pipe = child.stdout.take();
        let reader = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut pipe) = pipe {
                pipe.read_to_end(&mut buf).await?;
            }
            Ok::<_, std::io::Error>(buf)
        });

        if let Ok(status) = tokio::time::timeout(timeout, child.wait()).await {
            let status = status?;
            let stdout = reader
                .await
                .map_err(|e| ExecutorError::TaskFailed(e.to_string()))??;
            return Ok(ExecutionOutput {
                completion: Completion::Exited {
                    success: status.success(),
                    code: status.code(),
                },
                stdout,
                elapsed: start.elapsed(),
            });
        }

        tracing::warn!(
            program = %invocation.program,
            dir = %invocation.current_dir.display(),
            timeout_s = timeout.as_secs(),
            "process timed out, killing"
        );
        child.kill().await?;
        reader.abort();

        Ok(ExecutionOutput {
            completion: Completion::TimedOut,
            stdout: Vec::new(),
            elapsed: start.elapsed(),
        })
    }

    async fn health_check(&self, program: &str) -> Result<(), ExecutorError> {
        which::which(program).map(|_| ()).map_err(|_| ExecutorError::ToolNotFound {
            program: program.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUDGET: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn successful_process_reports_success() {
        let output = ProcessBackend::new().execute(&Invocation::new("true"), BUDGET).await;
        match output {
            Ok(o) => assert!(o.success(), "true must succeed, got {o:?}"),
            Err(e) => panic!("execute failed: {e}"),
        }
    }

    #[tokio::test]
    async fn failing_process_reports_exit_code() {
        let inv = Invocation::new("sh").args(["-c", "exit 3"]);
        let output = match ProcessBackend::new().execute(&inv, BUDGET).await {
            Ok(o) => o,
            Err(e) => panic!("execute failed: {e}"),
        };
        assert_eq!(output.completion, Completion::Exited { success: false, code: Some(3) });
    }

    #[tokio::test]
    async fn captured_stdout_is_returned() {
        let inv = Invocation::new("sh").args(["-c", "echo hello"]).capture_stdout();
        let output = match ProcessBackend::new().execute(&inv, BUDGET).await {
            Ok(o) => o,
            Err(e) => panic!("execute failed: {e}"),
        };
        assert_eq!(output.stdout, b"hello\n");
    }

    #[tokio::test]
    async fn uncaptured_stdout_is_discarded() {
        let inv = Invocation::new("sh").args(["-c", "echo hello"]);
        let output = match ProcessBackend::new().execute(&inv, BUDGET).await {
            Ok(o) => o,
            Err(e) => panic!("execute failed: {e}"),
        };
        assert!(output.stdout.is_empty());
    }

    #[tokio::test]
    async fn slow_process_times_out() {
        let inv = Invocation::new("sleep").arg("30");
        let output = match ProcessBackend::new().execute(&inv, Duration::from_millis(200)).await {
            Ok(o) => o,
            Err(e) => panic!("execute failed: {e}"),
        };
        assert_eq!(output.completion, Completion::TimedOut);
        assert!(output.elapsed < Duration::from_secs(10), "kill must not wait for sleep");
    }

    #[tokio::test]
    async fn missing_program_is_tool_not_found() {
        let inv = Invocation::new("definitely-not-a-real-program-4711");
        let result = ProcessBackend::new().execute(&inv, BUDGET).await;
        assert!(matches!(result, Err(ExecutorError::ToolNotFound { .. })), "got {result:?}");
    }

    #[tokio::test]
    async fn missing_working_directory_is_not_a_missing_tool() {
        let inv = Invocation::new("sh").current_dir("/definitely/not/a/checkout");
        let result = ProcessBackend::new().execute(&inv, BUDGET).await;
        assert!(matches!(result, Err(ExecutorError::MissingWorkDir { .. })), "got {result:?}");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn child_leads_its_own_process_group() {
        let inv = Invocation::new("sh")
            .args(["-c", r#"echo $$ $(cut -d" " -f5 /proc/$$/stat)"#])
            .capture_stdout();
        let output = match ProcessBackend::new().execute(&inv, BUDGET).await {
            Ok(o) => o,
            Err(e) => panic!("execute failed: {e}"),
        };
        let text = String::from_utf8_lossy(&output.stdout);
        let ids: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(ids.len(), 2, "got {text:?}");
        assert_eq!(ids[0], ids[1], "pid and process group must match so Ctrl-C skips the child");
    }

    #[tokio::test]
    async fn health_check_finds_sh() {
        assert!(ProcessBackend::new().health_check("sh").await.is_ok());
        assert!(ProcessBackend::new()
            .health_check("definitely-not-a-real-program-4711")
            .await
            .is_err());
    }
}
