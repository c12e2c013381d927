//! Custom error types with exit codes

use thiserror::Error;

/// Main error type for gitfront operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GitFrontError {
    /// Configuration Error - missing or invalid settings or arguments
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Path Traversal Error - a resolved path escapes the repository root
    #[error("Path traversal error: {message}")]
    PathTraversal { message: String },

    /// Engine Command Error - a raw version-control command failed
    #[error("Engine command error: {message}")]
    EngineCommand { message: String },

    /// Repository Init Error - directory or metadata creation failed
    #[error("Repository init error: {message}")]
    RepositoryInit { message: String },

    /// File IO Error - pattern file or workspace file operation failed
    #[error("File IO error: {message}")]
    FileIo { message: String },

    /// Config Read Error - a repository config probe failed
    #[error("Config read error: {message}")]
    ConfigRead { message: String },
}

impl GitFrontError {
    /// Get the appropriate exit code for this error type
    #[must_use]
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        match *self {
            Self::Configuration { .. } => 1,
            Self::PathTraversal { .. } => 2,
            Self::EngineCommand { .. } => 3,
            Self::RepositoryInit { .. } => 4,
            Self::FileIo { .. } => 5,
            Self::ConfigRead { .. } => 6,
        }
    }

    /// Create a configuration error
    #[inline]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a path traversal error
    #[inline]
    pub fn path_traversal<S: Into<String>>(message: S) -> Self {
        Self::PathTraversal {
            message: message.into(),
        }
    }

    /// Create an engine command error
    #[inline]
    pub fn engine_command<S: Into<String>>(message: S) -> Self {
        Self::EngineCommand {
            message: message.into(),
        }
    }

    /// Create a repository init error
    #[inline]
    pub fn repository_init<S: Into<String>>(message: S) -> Self {
        Self::RepositoryInit {
            message: message.into(),
        }
    }

    /// Create a file IO error
    #[inline]
    pub fn file_io<S: Into<String>>(message: S) -> Self {
        Self::FileIo {
            message: message.into(),
        }
    }

    /// Create a config read error
    #[inline]
    pub fn config_read<S: Into<String>>(message: S) -> Self {
        Self::ConfigRead {
            message: message.into(),
        }
    }
}

/// Exit code for an `anyhow` error, falling back to 1 when no kind is attached
#[must_use]
#[inline]
pub fn exit_code_of(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<GitFrontError>()
        .map_or(1, GitFrontError::exit_code)
}
