use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while evaluating a line. None of them end the session.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("{0}: command not found")]
    CommandNotFound(String),

    #[error("{0}: not found")]
    NotFound(String),

    #[error("{0}: missing argument")]
    MissingArgument(&'static str),

    #[error("cd: {0}: No such file or directory")]
    NoSuchDirectory(String),

    #[error("cd: HOME not set")]
    HomeNotSet,

    #[error("history: {}: {}", path.display(), source)]
    History { path: PathBuf, source: io::Error },

    #[error("cannot open {}: {}", path.display(), source)]
    Redirect { path: PathBuf, source: io::Error },

    #[error("pipe error: {0}")]
    Pipe(io::Error),

    #[error("{name}: {source}")]
    Spawn { name: String, source: io::Error },

    #[error("exit: cannot be used in a pipeline")]
    ExitInPipeline,

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type ShellResult<T> = Result<T, ShellError>;
