use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the logger and the rendering helpers.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to create log directory {}: {source}", .path.display())]
    CreateDirectory { path: PathBuf, source: io::Error },

    #[error("failed to create log file {}: {source}", .path.display())]
    CreateFile { path: PathBuf, source: io::Error },

    #[error("failed to open log file {}: {source}", .path.display())]
    OpenFile { path: PathBuf, source: io::Error },

    #[error("failed to write log file {}: {source}", .path.display())]
    WriteFile { path: PathBuf, source: io::Error },

    #[error("failed to write to console: {0}")]
    Console(io::Error),

    #[error("failed to resolve executable path: {0}")]
    ExecutablePath(io::Error),

    #[error("failed to convert value to JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LogError {
    /// Whether the process should stop when this error reaches a fatal entry point.
    ///
    /// Only failing to set up a sink is fatal; a failed write to an
    /// established sink is reported and logging carries on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LogError::CreateDirectory { .. }
                | LogError::CreateFile { .. }
                | LogError::OpenFile { .. }
                | LogError::ExecutablePath(_)
        )
    }
}

/// Report `err` on stderr and terminate the process.
pub(crate) fn exit_fatal(err: &LogError) -> ! {
    eprintln!("twlc: {err}");
    std::process::exit(1)
}
