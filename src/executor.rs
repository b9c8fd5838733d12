use async_trait::async_trait;
use tokio::process::Command;

// ── Error ──────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ExecError {
    /// The process could not be spawned at all (binary missing, permissions).
    Launch(String),
    /// The process ran and exited non-zero. Carries the captured stderr for
    /// operator diagnosis of dead-lettered messages.
    Failed {
        code: Option<i32>,
        stderr: String,
    },
}

impl std::fmt::Display for ExecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Launch(m) => write!(f, "command launch failed: {m}"),
            Self::Failed { code, stderr } => match code {
                Some(code) => write!(f, "command exited with status {code}: {stderr}"),
                None => write!(f, "command killed by signal: {stderr}"),
            },
        }
    }
}

impl std::error::Error for ExecError {}

// ── Output ─────────────────────────────────────────────────────────────────────

/// Captured output of a successful run.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
}

// ── Trait ──────────────────────────────────────────────────────────────────────

/// Runs an external analysis tool and reports its outcome.
///
/// There is no built-in timeout: a hung tool blocks this worker instance
/// until it is killed externally. Failed runs are not retried here either —
/// the consumer rejects the message and dead-letter replay takes over.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError>;
}

/// Executor backed by [`tokio::process::Command`].
#[derive(Debug, Default, Clone)]
pub struct ShellExecutor;

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError> {
        tracing::debug!(program, ?args, "executing command");

        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| ExecError::Launch(e.to_string()))?;

        if !output.status.success() {
            return Err(ExecError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_on_success() {
        let out = ShellExecutor
            .execute("echo", &["hello".to_string()])
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn non_zero_exit_carries_the_code() {
        let err = ShellExecutor
            .execute("false", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Failed { code: Some(1), .. }));
    }

    #[tokio::test]
    async fn missing_binary_is_a_launch_error() {
        let err = ShellExecutor
            .execute("/nonexistent/binary", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Launch(_)));
    }
}
