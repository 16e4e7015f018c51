//! Error taxonomy shared by inference, configuration, and loading.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = LoaderError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Invalid configuration in {path:?}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Source has no header row")]
    EmptySource,

    #[error("Cannot infer schema: source has a header but no data rows")]
    InsufficientData,

    #[error("Table {table} is already having {rows} rows")]
    AlreadyLoaded { table: String, rows: u64 },

    #[error("Row on line {line} has {found} field(s); header declares {expected}")]
    MalformedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Duplicate column name '{name}' in header")]
    DuplicateColumn { name: String },

    #[error("Failed to decode text on line {line} with encoding {encoding}")]
    Decode { line: u64, encoding: &'static str },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl LoaderError {
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        LoaderError::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}
