use thiserror::Error;

#[derive(Debug, Error)]
/// Terminal failures of a flash run, each mapped to a process exit status.
pub(crate) enum FlashError {
    #[error("{summary}\n{hint}")]
    MissingExecutable {
        summary: String,
        hint: &'static str,
    },
    #[error("Command failed with exit code {code}: {command}")]
    CommandFailed { command: String, code: i32 },
    #[error("Command terminated by signal: {command}")]
    CommandSignaled { command: String },
    #[error("failed to spawn {command}: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed while waiting for {command}: {source}")]
    CommandWait {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Command timed out after {timeout_secs}s: {command}")]
    CommandTimedOut { command: String, timeout_secs: u64 },
    #[error("{0:#}")]
    Settings(anyhow::Error),
}

impl From<anyhow::Error> for FlashError {
    fn from(error: anyhow::Error) -> Self {
        Self::Settings(error)
    }
}

impl FlashError {
    /// Child failures propagate the child's status; everything else is 1.
    pub(crate) fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}
