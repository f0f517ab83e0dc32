// Installation logic
//
// Delegated command execution shared by the package installer, the TSM initializer and
// the setup sequencer.
//
// IMPORTANT:
// - Never log secrets (passwords, license keys). Register them on the command with
//   `with_secret` so `display_for_log` can redact them.
// - Product tools (initialize-tsm, tsm, tabcmd, native installers) run without a timeout;
//   only short probes carry one.

pub mod linux_parsers;
pub mod package;
pub mod setup;
pub mod tsm_init;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use crate::error::InstallError;
use crate::utils::logging::redact_secrets;
use crate::utils::validation::escape_double_quoted;

/// Timeout for quick, read-only probes (package queries, getent).
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u128,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// One invocation of an external program.
#[derive(Clone)]
pub struct DelegatedCommand {
    /// Short operation name used in logs and errors (`tsm_status`).
    pub operation: String,
    pub program: String,
    pub args: Vec<String>,
    /// `None` means wait for completion no matter how long it takes.
    pub timeout: Option<Duration>,
    secrets: Vec<String>,
}

impl DelegatedCommand {
    pub fn new(operation: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            program: program.into(),
            args: Vec::new(),
            timeout: None,
            secrets: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.timeout = Some(dur);
        self
    }

    /// Register a value that must never appear in logs, in raw and shell-escaped form.
    pub fn with_secret(mut self, secret: &str) -> Self {
        if !secret.is_empty() {
            self.secrets.push(secret.to_string());
            let escaped = escape_double_quoted(secret);
            if escaped != secret {
                self.secrets.push(escaped);
            }
        }
        self
    }

    /// Program and arguments joined by spaces (unredacted; never log this).
    #[cfg(test)]
    pub(crate) fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Program and arguments with every registered secret and password-like value masked.
    pub fn display_for_log(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(
                self.args
                    .iter()
                    .map(|a| mask_arg_for_log(&redact_secrets(a, &self.secrets))),
            )
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Redact registered secrets from tool output before it is logged or surfaced.
    pub fn redact(&self, text: &str) -> String {
        redact_secrets(text, &self.secrets)
    }
}

impl fmt::Debug for DelegatedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatedCommand")
            .field("operation", &self.operation)
            .field("command", &self.display_for_log())
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn mask_arg_for_log(arg: &str) -> String {
    // Heuristic masking: treat anything that looks like an inline credential as sensitive.
    let lower = arg.to_ascii_lowercase();
    if lower.contains("password=")
        || lower.contains("pass=")
        || lower.contains("pwd=")
        || lower.contains("secret=")
        || lower.contains("token=")
    {
        return "***".to_string();
    }
    arg.to_string()
}

/// Executes delegated commands. The production implementation spawns processes;
/// tests substitute a scripted runner.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &DelegatedCommand) -> Result<CommandOutput>;

    /// Resolve `program` the way `run` would find it.
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, command: &DelegatedCommand) -> Result<CommandOutput> {
        run_cmd_once(command).await
    }
}

async fn run_cmd_once(command: &DelegatedCommand) -> Result<CommandOutput> {
    let started = Instant::now();
    let operation = command.operation.as_str();
    let program = command.program.as_str();

    debug!(
        "[PHASE: installation] [STEP: cmd] run_cmd_once entered (operation={}, command={}, timeout_ms={:?})",
        operation,
        command.display_for_log(),
        command.timeout.map(|t| t.as_millis())
    );

    let resolved = which::which(program).with_context(|| {
        format!(
            "Required tool '{}' was not found (operation={})",
            program, operation
        )
    })?;
    let mut cmd = Command::new(resolved);
    cmd.args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().with_context(|| {
        format!(
            "Failed to spawn command '{}' (operation={})",
            program, operation
        )
    })?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow::anyhow!("Failed to capture stdout (operation={})", operation))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow::anyhow!("Failed to capture stderr (operation={})", operation))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout.read_to_end(&mut buf).await?;
        Ok::<String, std::io::Error>(String::from_utf8_lossy(&buf).to_string())
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr.read_to_end(&mut buf).await?;
        Ok::<String, std::io::Error>(String::from_utf8_lossy(&buf).to_string())
    });

    let status = match command.timeout {
        None => child.wait().await.with_context(|| {
            format!(
                "Command wait failed (operation={}, program={})",
                operation, program
            )
        })?,
        Some(timeout_dur) => match timeout(timeout_dur, child.wait()).await {
            Ok(Ok(s)) => s,
            Ok(Err(e)) => {
                return Err(anyhow::Error::new(e)).with_context(|| {
                    format!(
                        "Command wait failed (operation={}, program={})",
                        operation, program
                    )
                });
            }
            Err(_) => {
                warn!(
                    "[PHASE: installation] [STEP: cmd] Timeout reached (operation={}, program={}, timeout_ms={}); attempting to kill process",
                    operation,
                    program,
                    timeout_dur.as_millis()
                );

                if let Err(e) = child.kill().await {
                    warn!(
                        "[PHASE: installation] [STEP: cmd] Failed to kill timed-out process (operation={}, program={}): {}",
                        operation, program, e
                    );
                }

                // Best-effort reap (avoid zombies)
                let _ = timeout(Duration::from_secs(5), child.wait()).await;

                return Err(anyhow::anyhow!(
                    "Command timed out after {}ms (operation={}, program={})",
                    timeout_dur.as_millis(),
                    operation,
                    program
                ));
            }
        },
    };

    let stdout_str = stdout_task
        .await
        .context("stdout join failed")?
        .context("stdout read failed")?;
    let stderr_str = stderr_task
        .await
        .context("stderr join failed")?
        .context("stderr read failed")?;

    let out = CommandOutput {
        exit_code: status.code(),
        stdout: stdout_str,
        stderr: stderr_str,
        duration_ms: started.elapsed().as_millis(),
    };

    debug!(
        "[PHASE: installation] [STEP: cmd] run_cmd_once exit (operation={}, exit_code={:?}, duration_ms={}, stdout_len={}, stderr_len={})",
        operation,
        out.exit_code,
        out.duration_ms,
        out.stdout.len(),
        out.stderr.len()
    );

    Ok(out)
}

/// Last few lines of tool output, for error messages.
fn output_tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

/// Run a delegated command and require exit code 0.
///
/// Spawn failures become `InstallError::Internal`; a non-zero exit becomes
/// `InstallError::Delegated` carrying the (redacted) tail of stderr, or stdout when
/// stderr is empty. No retries.
pub async fn run_delegated(
    runner: &dyn CommandRunner,
    command: &DelegatedCommand,
) -> Result<CommandOutput, InstallError> {
    let started = Instant::now();
    info!(
        "[PHASE: installation] [STEP: cmd] Running {} ({})",
        command.operation,
        command.display_for_log()
    );

    let out = runner.run(command).await.map_err(|e| {
        error!(
            "[PHASE: installation] [STEP: cmd] {} could not be executed: {:#}",
            command.operation, e
        );
        InstallError::Internal(e)
    })?;

    if !out.stdout.trim().is_empty() {
        debug!(
            "[PHASE: installation] [STEP: cmd] {} stdout:\n{}",
            command.operation,
            command.redact(out.stdout.trim_end())
        );
    }

    if !out.success() {
        let source = if out.stderr.trim().is_empty() {
            &out.stdout
        } else {
            &out.stderr
        };
        let detail = command.redact(&output_tail(source, 10));
        error!(
            "[PHASE: installation] [STEP: cmd] {} failed (exit_code={:?}, duration_ms={}): {}",
            command.operation,
            out.exit_code,
            started.elapsed().as_millis(),
            detail
        );
        return Err(InstallError::Delegated {
            operation: command.operation.clone(),
            exit_code: out.exit_code,
            detail,
        });
    }

    info!(
        "[PHASE: installation] [STEP: cmd] {} completed (duration_ms={})",
        command.operation,
        started.elapsed().as_millis()
    );
    Ok(out)
}
