//! Error types for management commands
//!
//! Provides structured error handling with context and proper error chains.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for command dispatch and the built-in commands
#[derive(Error, Debug)]
pub enum ScriptError {
    /// A command was dispatched without overriding `run`
    #[error("Command `{command}` does not implement run")]
    NotImplemented { command: String },

    /// Raised by command handlers to abort with a user-facing message
    #[error("Invalid command: {message}")]
    InvalidCommand { message: String },

    /// Route listing was asked to order by a key it does not know
    #[error("Unknown sort key `{key}` (expected one of: {})", allowed.join(", "))]
    UnknownSortKey {
        key: String,
        allowed: Vec<&'static str>,
    },

    /// A destination the command expects was not produced by the parser
    #[error("Missing argument: {dest}")]
    MissingArgument { dest: String },

    /// A parsed value could not be used as the command expects
    #[error("Invalid value for {dest}: {message}")]
    InvalidArgument { dest: String, message: String },

    /// File system operation errors
    #[error("File system error: {operation} failed on {path}")]
    FileSystem {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Process execution errors
    #[error("Process error: {command} failed")]
    Process {
        command: String,
        exit_code: Option<i32>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Command line could not be parsed
    #[error(transparent)]
    Usage(#[from] clap::Error),

    /// Interactive prompt failures
    #[error("Prompt error: {message}")]
    Prompt {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Writing command output or reading terminal input failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Errors reported by the host application
    #[error("Application error: {message}")]
    Application {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ScriptError {
    /// Create a new not-implemented error for the named command
    pub fn not_implemented(command: impl Into<String>) -> Self {
        Self::NotImplemented {
            command: command.into(),
        }
    }

    /// Create a new invalid command error
    pub fn invalid_command(message: impl Into<String>) -> Self {
        Self::InvalidCommand {
            message: message.into(),
        }
    }

    /// Create a new unknown sort key error
    pub fn unknown_sort_key(key: impl Into<String>, allowed: Vec<&'static str>) -> Self {
        Self::UnknownSortKey {
            key: key.into(),
            allowed,
        }
    }

    /// Create a new missing argument error
    pub fn missing_argument(dest: impl Into<String>) -> Self {
        Self::MissingArgument { dest: dest.into() }
    }

    /// Create a new invalid argument error
    pub fn invalid_argument(dest: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            dest: dest.into(),
            message: message.into(),
        }
    }

    /// Create a new file system error
    pub fn file_system<P: Into<PathBuf>>(
        operation: impl Into<String>,
        path: P,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a new process error
    pub fn process(command: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::Process {
            command: command.into(),
            exit_code,
            source: None,
        }
    }

    /// Create a new prompt error
    pub fn prompt(message: impl Into<String>) -> Self {
        Self::Prompt {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new application error
    pub fn application(message: impl Into<String>) -> Self {
        Self::Application {
            message: message.into(),
            source: None,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ScriptError>;
