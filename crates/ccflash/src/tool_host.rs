//! Process boundary: locating external tools and running them to completion.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;

use ccflash_core::resolve_first_executable;
use wait_timeout::ChildExt;

use crate::flash_error::FlashError;

/// One external command: resolved program, arguments, and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ToolInvocation {
    pub(crate) program: PathBuf,
    pub(crate) args: Vec<String>,
    pub(crate) cwd: PathBuf,
}

impl ToolInvocation {
    pub(crate) fn new<I, S>(program: &Path, args: I, cwd: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_path_buf(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.to_path_buf(),
        }
    }

    pub(crate) fn render(&self) -> String {
        render_command(&self.program.to_string_lossy(), &self.args)
    }
}

fn shell_quote_token(token: &str) -> String {
    if !token.is_empty()
        && token.chars().all(|ch| {
            ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\')
        })
    {
        return token.to_string();
    }
    format!("'{}'", token.replace('\'', "'\"'\"'"))
}

pub(crate) fn render_command(program: &str, args: &[String]) -> String {
    let mut parts = Vec::with_capacity(args.len().saturating_add(1));
    parts.push(shell_quote_token(program));
    parts.extend(args.iter().map(|arg| shell_quote_token(arg)));
    parts.join(" ")
}

/// Seam between the flash pipeline and the host operating system.
pub(crate) trait ToolHost {
    /// Returns the first of `candidates` that resolves to an executable.
    fn locate(&self, candidates: &[&str]) -> Option<PathBuf>;

    /// Runs `invocation` to completion; any unsuccessful exit is an error.
    fn run(&mut self, invocation: &ToolInvocation) -> Result<(), FlashError>;
}

/// Spawns real child processes that inherit the terminal.
#[derive(Debug, Clone, Default)]
pub(crate) struct SystemToolHost {
    timeout: Option<Duration>,
}

impl SystemToolHost {
    pub(crate) fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn wait(
        &self,
        child: &mut std::process::Child,
        command: &str,
    ) -> Result<ExitStatus, FlashError> {
        let wait_error = |source| FlashError::CommandWait {
            command: command.to_string(),
            source,
        };
        let Some(timeout) = self.timeout else {
            return child.wait().map_err(wait_error);
        };
        match child.wait_timeout(timeout).map_err(wait_error)? {
            Some(status) => Ok(status),
            None => {
                let _ = child.kill();
                let _ = child.wait();
                Err(FlashError::CommandTimedOut {
                    command: command.to_string(),
                    timeout_secs: timeout.as_secs(),
                })
            }
        }
    }
}

impl ToolHost for SystemToolHost {
    fn locate(&self, candidates: &[&str]) -> Option<PathBuf> {
        resolve_first_executable(candidates)
    }

    fn run(&mut self, invocation: &ToolInvocation) -> Result<(), FlashError> {
        let command_str = invocation.render();
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        tracing::debug!(command = %command_str, cwd = %invocation.cwd.display(), "spawning");
        let mut child = command.spawn().map_err(|source| FlashError::CommandSpawn {
            command: command_str.clone(),
            source,
        })?;
        let status = self.wait(&mut child, &command_str)?;
        if status.success() {
            return Ok(());
        }
        match status.code() {
            Some(code) => Err(FlashError::CommandFailed {
                command: command_str,
                code,
            }),
            None => Err(FlashError::CommandSignaled {
                command: command_str,
            }),
        }
    }
}
