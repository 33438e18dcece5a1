use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Unknown component: {0}")]
    UnknownComponent(String),

    #[error("Invalid component registry: {0}")]
    InvalidRegistry(String),

    #[error("Working directory does not exist: {}", .0.display())]
    MissingWorkingDirectory(PathBuf),

    #[error("Component '{0}' has an empty command")]
    EmptyCommand(String),

    #[error("Failed to spawn {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to signal PID {pid}: {reason}")]
    Signal { pid: u32, reason: String },

    #[error("PID {pid} still running {timeout_secs}s after termination request")]
    StopTimeout { pid: u32, timeout_secs: u64 },
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
