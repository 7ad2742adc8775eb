//! Syntax check for sandbox profile scripts.

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::NixError;

/// Shell used to parse profile scripts.
const SHELL: &str = "sh";

/// Check that `script` parses as POSIX shell without executing it.
///
/// The script is fed to `sh -n` on stdin, so paths and commands it refers
/// to do not need to exist.
///
/// # Errors
/// Returns [`NixError::ProfileSyntax`] with the shell's diagnostics if the
/// script does not parse, [`NixError::ToolNotFound`] if `sh` is missing, or
/// [`NixError::Io`] if the shell cannot be driven.
pub async fn validate_profile_script(script: &str) -> Result<(), NixError> {
    let mut child = Command::new(SHELL)
        .arg("-n")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => NixError::ToolNotFound {
                tool: SHELL.to_owned(),
            },
            _ => NixError::Io(e),
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        // The shell may stop reading at the first syntax error.
        match stdin.write_all(script.as_bytes()).await {
            Ok(()) => stdin.shutdown().await?,
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Err(e) => return Err(NixError::Io(e)),
        }
    }

    let output = child.wait_with_output().await?;
    if output.status.success() {
        tracing::debug!(bytes = script.len(), "profile script parsed");
        return Ok(());
    }

    let message = String::from_utf8_lossy(&output.stderr).trim().to_owned();
    tracing::warn!(%message, "profile script failed to parse");
    Err(NixError::ProfileSyntax { message })
}
