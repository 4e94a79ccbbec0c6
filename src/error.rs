//! Error types shared across the organizer.
//!
//! Only run-level failures surface as `Err`. Per-file problems (unreadable
//! files, failed moves, records undo could not replay) are collected into the
//! run reports instead, so one bad file never aborts a pass.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an organize or undo run before any file is touched.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The target path is missing or not a directory.
    #[error("Invalid directory {}: {reason}", path.display())]
    InvalidDirectory { path: PathBuf, reason: String },

    /// Configuration could not be loaded or compiled.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The journal could not be read or appended to.
    #[error("Journal error at {}: {source}", path.display())]
    Journal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The confidence model file could not be read or written.
    #[error("Confidence model error at {}: {reason}", path.display())]
    Model { path: PathBuf, reason: String },

    /// No journal block matches the directory.
    #[error("No previous organization of {} found to undo", path.display())]
    NothingToUndo { path: PathBuf },
}

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}': expected *.ext or dir/**")]
    InvalidGlobPattern(String),

    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// A file that could not be moved during an apply run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to move {} to {}: {reason}", source_path.display(), destination.display())]
pub struct MoveError {
    pub source_path: PathBuf,
    pub destination: PathBuf,
    pub reason: String,
}

/// A journal record undo could not replay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot restore {}: {reason}", path.display())]
pub struct UndoError {
    pub path: PathBuf,
    pub reason: String,
}

/// Result type for organize and undo runs.
pub type OrganizeResult<T> = Result<T, OrganizeError>;
