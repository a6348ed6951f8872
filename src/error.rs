use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used by the session-level API.
pub type Result<T> = std::result::Result<T, ShellError>;

/// Everything that can go wrong outside of a command's own execution.
///
/// Startup variants are fatal; the rest are reported for one input cycle
/// and the shell carries on.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("cannot determine working directory: {0}")]
    WorkingDirectory(#[source] io::Error),

    #[error("cannot determine home directory")]
    HomeDirectory,

    #[error("command not found: {program}")]
    CommandNotFound { program: String },

    #[error("{program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("syntax error: empty command at pipeline stage {position}")]
    EmptyStage { position: usize },

    #[error("history file {}: {source}", .path.display())]
    History {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("terminal: {0}")]
    Terminal(#[from] nix::Error),

    #[error("cannot register interrupt handler: {0}")]
    Signal(#[source] io::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Command(#[from] anyhow::Error),
}
