//! Error types for taskrun.
//!
//! `TaskError` is the only error the runner itself produces (a command that
//! cannot be resolved). Everything the operating system reports while
//! spawning, piping or waiting travels unchanged as `std::io::Error`.

use crate::exit_codes;
use thiserror::Error;

/// A command name could not be resolved to an executable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{description}")]
pub struct TaskError {
    /// Human-readable description, e.g. `Failed to find tool "cargo"`.
    pub description: String,
}

impl TaskError {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }

    /// The error reported when a lookup cannot find `tool`.
    pub fn tool_not_found(tool: &str) -> Self {
        Self::new(format!("Failed to find tool \"{}\"", tool))
    }
}

/// Error returned by every run operation.
#[derive(Error, Debug)]
pub enum RunError {
    /// The command could not be resolved to an executable path.
    #[error(transparent)]
    Task(#[from] TaskError),

    /// Spawning, piping, reading, writing or waiting failed at the OS level.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// No command was given.
    #[error("no command given: the argument list is empty")]
    EmptyCommand,

    /// A configuration file could not be read or is invalid.
    #[error("{0}")]
    Config(String),
}

impl RunError {
    /// Returns the CLI exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Task(_) => exit_codes::TOOL_NOT_FOUND,
            RunError::Io(_) => exit_codes::IO_FAILURE,
            RunError::EmptyCommand => exit_codes::USER_ERROR,
            RunError::Config(_) => exit_codes::USER_ERROR,
        }
    }

    /// Returns the resolution error, if that is what this is.
    pub fn as_task_error(&self) -> Option<&TaskError> {
        match self {
            RunError::Task(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for taskrun operations.
pub type Result<T> = std::result::Result<T, RunError>;
