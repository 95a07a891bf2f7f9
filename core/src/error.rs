use std::io;

use thiserror::Error;

/// Errors that end a running shell.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Reading input or writing output or diagnostics failed.
    #[error("shell I/O error: {0}")]
    Io(#[from] io::Error),
}
