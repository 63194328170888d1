//! Error types for rangekit core.

use thiserror::Error;

use rangekit_engine::{NameError, RangeError};

/// Errors that can occur while managing named ranges
#[derive(Error, Debug)]
pub enum RangekitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error("Invalid name: {0}")]
    InvalidName(#[from] NameError),

    #[error("A name called '{0}' already exists")]
    NameExists(String),

    #[error("No name called '{0}'")]
    NameNotFound(String),

    #[error("'{0}' is already being edited")]
    EditInProgress(String),

    #[error("Unknown sheet '{0}'")]
    UnknownSheet(String),

    #[error("No selection available")]
    NoSelection,

    #[error("No file path set")]
    NoFilePath,
}

pub type Result<T> = std::result::Result<T, RangekitError>;
